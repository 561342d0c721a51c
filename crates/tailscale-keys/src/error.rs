//! Error types for auth-key operations

/// Errors from auth-key operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] api_client::Error),

    #[error("tags are required for OAuth-created keys (must specify at least one tag)")]
    TagsRequired,

    #[error("auth key id must not be empty")]
    MissingKeyId,
}

/// Result alias for auth-key operations.
pub type Result<T> = std::result::Result<T, Error>;
