//! Notification delivery with pluggable channel support.
//!
//! The monitor decides when to notify; this crate decides how. Channels are
//! fanned out in a detached task so delivery latency or failures never stall
//! a measurement cycle.

pub mod channels;
pub mod error;


pub use error::{NotifyError, Result};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Alert,
    Recovery,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Alert => "alert",
            NotificationKind::Recovery => "recovery",
        }
    }
}

/// One notification, fanned out to every configured channel.
///
/// Alerts carry the ordered violation messages; recoveries carry none. The
/// host label, timestamp and dashboard link are part of the payload contract
/// every channel renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub violations: Vec<String>,
    pub host: String,
    pub timestamp: DateTime<Utc>,
    pub dashboard_url: String,
}

impl Notification {
    pub fn alert(
        violations: Vec<String>,
        host: impl Into<String>,
        timestamp: DateTime<Utc>,
        dashboard_url: impl Into<String>,
    ) -> Self {
        Self {
            kind: NotificationKind::Alert,
            violations,
            host: host.into(),
            timestamp,
            dashboard_url: dashboard_url.into(),
        }
    }

    pub fn recovery(
        host: impl Into<String>,
        timestamp: DateTime<Utc>,
        dashboard_url: impl Into<String>,
    ) -> Self {
        Self {
            kind: NotificationKind::Recovery,
            violations: Vec::new(),
            host: host.into(),
            timestamp,
            dashboard_url: dashboard_url.into(),
        }
    }
}

/// A notification delivery channel backed by an external service.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Delivers the notification through this channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the external service rejects or never receives
    /// the message. The dispatcher logs and drops it; there are no retries.
    async fn send(&self, notification: &Notification) -> Result<()>;

    /// Returns the channel name (e.g. `"email"`, `"webhook"`).
    fn channel_name(&self) -> &str;
}

/// Fans notifications out to the configured channels.
pub struct Notifier {
    channels: Arc<Vec<Box<dyn NotifyChannel>>>,
}

impl Notifier {
    pub fn new(channels: Vec<Box<dyn NotifyChannel>>) -> Self {
        Self {
            channels: Arc::new(channels),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Fire-and-forget delivery in a detached task. A failed channel is
    /// logged and skipped; the next alert or reminder is the retry.
    pub fn dispatch(&self, notification: Notification) {
        if self.channels.is_empty() {
            return;
        }
        let channels = Arc::clone(&self.channels);
        tokio::spawn(async move {
            for channel in channels.iter() {
                match channel.send(&notification).await {
                    Ok(()) => {
                        tracing::info!(
                            channel = channel.channel_name(),
                            kind = notification.kind.as_str(),
                            "Notification delivered"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            channel = channel.channel_name(),
                            kind = notification.kind.as_str(),
                            error = %e,
                            "Notification delivery failed"
                        );
                    }
                }
            }
        });
    }
}
