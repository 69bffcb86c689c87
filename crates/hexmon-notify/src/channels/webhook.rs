use crate::error::Result;
use crate::{Notification, NotifyChannel};
use async_trait::async_trait;
use std::time::Duration;

/// JSON POST to a single endpoint.
pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl NotifyChannel for WebhookChannel {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let body = serde_json::json!({
            "kind": notification.kind.as_str(),
            "host": notification.host,
            "timestamp": notification.timestamp.to_rfc3339(),
            "violations": notification.violations,
            "dashboard_url": notification.dashboard_url,
        });

        self.client
            .post(&self.url)
            .timeout(Duration::from_secs(10))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}
