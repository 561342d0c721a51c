//! Error types for credential acquisition

/// Errors from resolving secrets or exchanging OAuth credentials.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] api_client::Error),

    #[error("secret not found in pass at '{path}' or environment variable '{env_var}'")]
    SecretNotFound { path: String, env_var: String },

    #[error("pass not available and environment variable '{env_var}' not set")]
    StoreUnavailable { env_var: String },

    #[error("secret store error: {0}")]
    Store(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
