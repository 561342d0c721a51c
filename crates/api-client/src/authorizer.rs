//! Credential strategies for the two authentication modes.
//!
//! `ApiKeyAuth` sends a long-lived API key as the basic-auth username.
//! `BearerAuth` sends a short-lived OAuth access token. Everything else about
//! the request (body, retry, error handling) is identical between the two.

use common::Secret;
use tracing::debug;

use crate::error::{Error, Result};
use crate::{AuthScheme, Authorizer, TagPolicy};

/// Every Tailscale API key starts with this prefix.
pub const API_KEY_PREFIX: &str = "tskey-api-";

/// Shortest string that could plausibly be an API key.
const API_KEY_MIN_LEN: usize = 10;

/// Where users generate a replacement API key.
pub const API_KEY_SETTINGS_URL: &str = "https://login.tailscale.com/admin/settings/keys";

/// Basic-auth strategy: the API key is the username, the password is empty.
pub struct ApiKeyAuth {
    key: Secret<String>,
}

impl ApiKeyAuth {
    pub fn new(key: Secret<String>) -> Self {
        Self { key }
    }
}

impl Authorizer for ApiKeyAuth {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::ApiKey
    }

    fn tag_policy(&self) -> TagPolicy {
        TagPolicy::Optional
    }

    /// There is no cheap validation endpoint, so only the surface format is
    /// checked. A well-formed but revoked key surfaces later as a 401.
    fn validate(&self) -> Result<()> {
        let key = self.key.expose();
        if key.len() < API_KEY_MIN_LEN || !key.starts_with(API_KEY_PREFIX) {
            return Err(Error::InvalidCredential(format!(
                "API key appears to be invalid (should start with '{API_KEY_PREFIX}')\n\n\
                 Generate a new one at: {API_KEY_SETTINGS_URL}"
            )));
        }
        debug!("API key format check passed (keys expire 90 days after creation)");
        Ok(())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(self.key.expose(), Some(""))
    }
}

/// Bearer strategy for an access token obtained from the OAuth exchange.
pub struct BearerAuth {
    token: Secret<String>,
}

impl BearerAuth {
    pub fn new(token: Secret<String>) -> Self {
        Self { token }
    }
}

impl Authorizer for BearerAuth {
    fn scheme(&self) -> AuthScheme {
        AuthScheme::Bearer
    }

    fn tag_policy(&self) -> TagPolicy {
        TagPolicy::Required
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.token.expose())
    }
}
