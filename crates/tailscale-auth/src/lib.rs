//! Tailscale credential acquisition
//!
//! Everything needed to go from "a path in the password store or an
//! environment variable" to a credential that can authorize an API call:
//!
//! 1. `credentials::resolve_secret()` reads the API key or OAuth client
//!    id/secret from `pass`, falling back to the environment
//! 2. For OAuth, `token::exchange_client_credentials()` trades the client
//!    id/secret for a short-lived bearer token
//!
//! Nothing obtained here is ever written to disk.

pub mod constants;
pub mod credentials;
pub mod error;
pub mod token;

pub use constants::*;
pub use credentials::{PassStore, SecretStore, resolve_secret, resolve_secret_with};
pub use error::{Error, Result};
pub use token::{BearerToken, exchange_client_credentials};
