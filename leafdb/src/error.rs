use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeafDbError {
    /// Bad argument shape: raised before any I/O happens.
    #[error("Usage error: {0}")]
    Usage(String),

    /// A write-path address could not be applied (range over a non-sequence,
    /// non-numeric key into a sequence). Read-path misses are not errors.
    #[error("Path error: {0}")]
    Path(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LeafDbError>;
