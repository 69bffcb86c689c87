/// Errors raised by notification channels.
///
/// The dispatcher logs every variant and moves on; a failed delivery is
/// never retried within the cycle and never affects alert state.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The SMTP relay rejected or never accepted the message.
    #[error("Notify: email delivery failed: {0}")]
    Email(#[from] lettre::transport::smtp::Error),

    /// A sender or recipient address did not parse.
    #[error("Notify: invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Message assembly failed.
    #[error("Notify: could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// The webhook endpoint was unreachable or answered with an error status.
    #[error("Notify: webhook delivery failed: {0}")]
    Webhook(#[from] reqwest::Error),

    /// Generic delivery error for cases not covered by other variants.
    #[error("Notify: {0}")]
    Other(String),
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
