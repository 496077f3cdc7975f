use thiserror::Error;

/// Failure taxonomy for every exposed operation. Each operation catches
/// failures at its own boundary and reports one of these; nothing is
/// allowed to propagate as a panic.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or empty. No partial write occurred.
    #[error("{0}")]
    Validation(String),

    /// The recording payload is not valid base64.
    #[error("invalid recording payload: {0}")]
    Decoding(String),

    /// An external collaborator (AI or telephony) failed: network, auth,
    /// or a malformed response.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
