use thiserror::Error;

/// Failure taxonomy shared across the workspace.
///
/// The variants encode how a caller should react: `Configuration` means fix
/// the environment and do not retry, `QuotaExceeded` means retry later,
/// `Provider` means the upstream hiccuped and backoff is the caller's call,
/// `EmptyInput` is a programming error, `NotFound` means ingest first.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Embedding quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Embedding provider error: {0}")]
    Provider(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
