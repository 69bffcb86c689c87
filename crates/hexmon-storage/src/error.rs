/// Errors that can occur within the storage layer.
///
/// Appends and prunes are best-effort from the monitor's point of view: the
/// caller logs these and the cycle continues.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An underlying SQLite error.
    #[error("Store: SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization failure for a settings value.
    #[error("Store: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error while preparing the data directory.
    #[error("Store: I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
