//! Tailscale auth-key management
//!
//! Builds capability requests, submits them through a single `KeysClient`
//! and parses the resulting key records. The client is parameterized by an
//! `api_client::Authorizer`, so API-key and OAuth flows share one code path:
//!
//! 1. Caller builds a `CapabilityRequest` (tags normalized via `tags::parse_tags`)
//! 2. `KeysClient::create_auth_key()` checks the credential format and tag
//!    policy locally, then POSTs through the retry executor
//! 3. A 200/201 response is parsed into an `AuthKeyRecord`
//!
//! Listing and deleting keys use the same client.

pub mod client;
pub mod error;
pub mod models;
pub mod tags;

pub use client::KeysClient;
pub use error::{Error, Result};
pub use models::{AuthKeyRecord, AuthKeySummary, Capabilities, CapabilityRequest, CreateKeyRequest};
pub use tags::{TAG_PREFIX, is_valid_tag, parse_tags};
