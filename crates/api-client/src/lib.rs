//! Shared HTTP plumbing for the Tailscale API
//!
//! Both credential modes (API key and OAuth bearer token) issue the same kind
//! of request and need the same failure handling. This crate owns the pieces
//! they share:
//!
//! - `Authorizer`: the strategy that attaches credentials to a request
//! - `retry`: exponential-backoff retry of transport failures
//! - `classify`: mapping of rejected responses to remediation-bearing errors
//!
//! Callers build a `reqwest::Request`, authorize it, and hand it to
//! `retry::send`. Non-success statuses come back as responses; the caller
//! decides which statuses count as success and routes the rest through
//! `classify::classify`.

pub mod authorizer;
pub mod classify;
pub mod error;
pub mod retry;

pub use authorizer::{API_KEY_PREFIX, API_KEY_SETTINGS_URL, ApiKeyAuth, BearerAuth};
pub use classify::{ApiError, ErrorCategory, OAUTH_CLIENTS_KB_URL, classify};
pub use error::{Error, Result};
pub use retry::{RetryError, RetryPolicy, Retryable, retry, send};

use std::time::Duration;

/// Per-request ceiling applied to every HTTP call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which credential flow produced a request. Drives the wording of
/// classified errors, since the remediation differs per flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Static API key sent as basic auth
    ApiKey,
    /// Client-credentials exchange against the OAuth token endpoint
    OAuthExchange,
    /// Short-lived OAuth access token sent as a bearer header
    Bearer,
}

/// Whether the key-creation call may be sent with an empty tag list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPolicy {
    /// The service accepts untagged keys for this credential type
    Optional,
    /// The service rejects untagged keys for this credential type
    Required,
}

/// Credential strategy for outgoing API requests.
///
/// Implementations attach their credential to a request builder and perform
/// any local sanity checks before a request is sent. The client holding the
/// authorizer never inspects the credential itself.
pub trait Authorizer: Send + Sync {
    /// Flow identifier used when classifying rejections
    fn scheme(&self) -> AuthScheme;

    /// Tag requirement for key creation under this credential
    fn tag_policy(&self) -> TagPolicy;

    /// Local format check run before any network call.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Attach the credential to an outgoing request.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder;
}

/// HTTP settings passed explicitly into every client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl HttpConfig {
    /// Build a reqwest client honoring the configured timeout.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("tailkey/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))
    }
}
