//! Common types for tailkey

mod secret;
mod error;

pub use secret::{Secret, redact};
pub use error::{Error, Result};
