//! Classification of rejected API responses
//!
//! Turns a non-success status and its body into an `ApiError` carrying the
//! service's own message plus a remediation hint suited to the credential
//! flow that was used. Classification never triggers a retry.

use serde_json::{Map, Value};

use crate::AuthScheme;
use crate::authorizer::API_KEY_SETTINGS_URL;

/// Documentation for creating and scoping OAuth clients.
pub const OAUTH_CLIENTS_KB_URL: &str = "https://tailscale.com/kb/1215/oauth-clients";

const OAUTH_SCOPES_HINT: &str =
    "Ensure your OAuth client has the required scopes (auth_keys or devices:write)";

/// Coarse category of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 401: credential invalid or expired
    Unauthorized,
    /// 403: credential lacks permission
    Forbidden,
    /// 400: request rejected as malformed
    BadRequest,
    /// 429: too many requests
    RateLimited,
    /// Any other non-success status
    Other,
}

/// A classified rejection from the API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{summary} ({status}): {message}{}", hint_suffix(.hint))]
pub struct ApiError {
    pub status: u16,
    pub category: ErrorCategory,
    pub summary: &'static str,
    /// Message reported by the service (or the raw body)
    pub message: String,
    pub hint: Option<String>,
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_deref()
        .map(|hint| format!("\n\n{hint}"))
        .unwrap_or_default()
}

/// Classify a non-success response.
pub fn classify(status: u16, body: &[u8], scheme: AuthScheme) -> ApiError {
    let message = extract_message(body, scheme);

    let (category, summary, hint): (ErrorCategory, &'static str, Option<String>) =
        match (status, scheme) {
            (401, AuthScheme::ApiKey) => (
                ErrorCategory::Unauthorized,
                "API key invalid or expired",
                Some(format!(
                    "API keys expire after 90 days. Generate a new one at:\n{API_KEY_SETTINGS_URL}"
                )),
            ),
            (401, AuthScheme::OAuthExchange) => (
                ErrorCategory::Unauthorized,
                "OAuth credentials invalid",
                Some(format!(
                    "Please check your OAuth client ID and secret.\nSee: {OAUTH_CLIENTS_KB_URL}"
                )),
            ),
            (401, AuthScheme::Bearer) => (
                ErrorCategory::Unauthorized,
                "API token invalid",
                Some(
                    "The OAuth access token may have expired or is invalid. \
                     Check your OAuth client ID and secret."
                        .to_string(),
                ),
            ),
            (403, AuthScheme::ApiKey) => (
                ErrorCategory::Forbidden,
                "access forbidden",
                Some("Ensure your API key has the required permissions".to_string()),
            ),
            (403, AuthScheme::OAuthExchange) => (
                ErrorCategory::Forbidden,
                "OAuth access forbidden",
                Some(OAUTH_SCOPES_HINT.to_string()),
            ),
            (403, AuthScheme::Bearer) => (
                ErrorCategory::Forbidden,
                "access forbidden",
                Some(OAUTH_SCOPES_HINT.to_string()),
            ),
            (400, AuthScheme::Bearer) if message.to_ascii_lowercase().contains("capability") => (
                ErrorCategory::BadRequest,
                "invalid request",
                Some("This may be due to missing or invalid tags in the request".to_string()),
            ),
            (400, _) => (ErrorCategory::BadRequest, "invalid request", None),
            (429, _) => (
                ErrorCategory::RateLimited,
                "rate limited",
                Some("Please wait before retrying".to_string()),
            ),
            (_, AuthScheme::OAuthExchange) => (ErrorCategory::Other, "OAuth request failed", None),
            _ => (ErrorCategory::Other, "API request failed", None),
        };

    ApiError {
        status,
        category,
        summary,
        message,
        hint,
    }
}

/// Pull the human-readable message out of an error body.
///
/// The keys API reports `message`; the token endpoint reports an OAuth-style
/// `error` + `error_description` pair, so that pair is preferred there.
fn extract_message(body: &[u8], scheme: AuthScheme) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        let oauth_pair = str_field(&map, "error").map(|error| {
            match str_field(&map, "error_description") {
                Some(description) => format!("{error}: {description}"),
                None => error.to_string(),
            }
        });
        let message = str_field(&map, "message").map(str::to_string);

        let found = match scheme {
            AuthScheme::OAuthExchange => oauth_pair.or(message),
            AuthScheme::ApiKey | AuthScheme::Bearer => message.or(oauth_pair),
        };
        if let Some(found) = found {
            return found;
        }
    }

    let raw = String::from_utf8_lossy(body).trim().to_string();
    if raw.is_empty() {
        String::from("<no body>")
    } else {
        raw
    }
}

fn str_field<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    map.get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}
