//! Service-specific error types
//!
//! Failures that need a "what to do next" paragraph for the user. Library
//! errors already carry their own remediation and pass through `anyhow`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "failed to get API key: {0}\n\n\
         Run with --init to configure credentials or set the TS_API_KEY environment variable"
    )]
    ApiKeyUnavailable(String),

    #[error(
        "failed to get OAuth {which}: {reason}\n\n\
         Run with --init to configure credentials or set TS_OAUTH_CLIENT_ID and TS_OAUTH_CLIENT_SECRET"
    )]
    OAuthUnavailable { which: &'static str, reason: String },

    #[error("failed to get OAuth access token: {0}")]
    TokenExchange(String),

    #[error("failed to create auth key: {0}")]
    CreateKey(String),

    #[error("auth key operation failed: {0}")]
    KeyManagement(String),

    #[error("interactive setup failed: {0}")]
    Wizard(#[from] std::io::Error),

    #[error("failed to save configuration: {0}")]
    SaveConfig(String),
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;
