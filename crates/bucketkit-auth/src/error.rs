//! Error types for request signing.

/// Errors that can occur while preparing credentials for signing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The access key ID is empty.
    #[error("missing access key")]
    MissingAccessKey,

    /// The secret access key is empty.
    #[error("missing secret key for access key {0}")]
    MissingSecretKey(String),
}
