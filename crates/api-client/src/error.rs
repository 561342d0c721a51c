//! Error types for API requests

use crate::classify::ApiError;

/// Errors from a single API call.
///
/// `Network` is the only variant produced after retrying; all others are
/// terminal on first occurrence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failures persisted through every retry
    #[error("request failed after {attempts} attempts: {message}")]
    Network { attempts: u32, message: String },

    /// Non-retryable transport or request-construction failure
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The service answered with a rejection status
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The service answered with a success status but an unreadable body
    #[error("invalid response: {0}")]
    Decode(String),

    /// A credential failed its local format check
    #[error("{0}")]
    InvalidCredential(String),
}

/// Result alias for API requests.
pub type Result<T> = std::result::Result<T, Error>;
