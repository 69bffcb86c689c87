use std::path::PathBuf;

/// Errors raised by individual metric sources.
///
/// The sample engine treats every variant the same way: log, substitute a
/// zero value for the affected fields, and finish the cycle.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A backing counter file could not be read.
    #[error("Source: failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backing counter file did not have the expected shape.
    #[error("Source: unexpected format in {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    /// The database engine rejected an administrative query.
    #[error("Source: database query failed: {0}")]
    Db(#[from] sqlx::Error),
}

/// Convenience `Result` alias for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
