use crate::error::Result;
use crate::{Notification, NotificationKind, NotifyChannel};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Plain-text email over SMTP, one message per recipient.
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    recipients: Vec<String>,
}

impl EmailChannel {
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        username: Option<&str>,
        password: Option<&str>,
        from: &str,
        recipients: Vec<String>,
    ) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?.port(smtp_port);

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from: from.to_string(),
            recipients,
        })
    }

    pub(crate) fn subject(notification: &Notification) -> String {
        match notification.kind {
            NotificationKind::Alert => {
                format!("[{}] Server Resource Alert", notification.host)
            }
            NotificationKind::Recovery => {
                format!("[{}] Server Resources Recovered", notification.host)
            }
        }
    }

    pub(crate) fn body(notification: &Notification) -> String {
        let mut body = match notification.kind {
            NotificationKind::Alert => {
                let mut text = String::from("The following thresholds were exceeded:\n\n");
                for message in &notification.violations {
                    text.push_str("\u{2022} ");
                    text.push_str(message);
                    text.push('\n');
                }
                text
            }
            NotificationKind::Recovery => {
                String::from("All monitored resources are back under their thresholds.\n")
            }
        };

        body.push_str(&format!(
            "\nServer: {host}\nTime: {time}\nDashboard: {url}\n",
            host = notification.host,
            time = notification.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            url = notification.dashboard_url,
        ));
        body
    }
}

#[async_trait]
impl NotifyChannel for EmailChannel {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let subject = Self::subject(notification);
        let body = Self::body(notification);

        for recipient in &self.recipients {
            let message = Message::builder()
                .from(self.from.parse()?)
                .to(recipient.parse()?)
                .subject(&subject)
                .header(ContentType::TEXT_PLAIN)
                .body(body.clone())?;
            self.transport.send(message).await?;
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
