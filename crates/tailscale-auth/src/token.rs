//! OAuth client-credentials exchange
//!
//! Trades an OAuth client id/secret for a short-lived access token by
//! POSTing a form to the token endpoint. The token is used for exactly one
//! API call and then dropped; there is no caching and no refresh.

use api_client::{AuthScheme, RetryPolicy, classify, send};
use common::{Secret, redact};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::Result;

/// Access token returned by the token endpoint.
#[derive(Debug)]
pub struct BearerToken {
    pub access_token: Secret<String>,
    pub token_type: String,
    /// Seconds until the token expires (delta, not absolute)
    pub expires_in: u64,
}

#[derive(Deserialize)]
struct TokenPayload {
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: u64,
}

/// Exchange client credentials for a bearer token.
///
/// Transport failures are retried per `policy`. Any status other than 200 is
/// classified with OAuth-specific remediation and returned without retrying.
pub async fn exchange_client_credentials(
    http: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &Secret<String>,
    policy: &RetryPolicy,
) -> Result<BearerToken> {
    info!(client_id = %redact(client_id), "exchanging OAuth client credentials");

    let request = http
        .post(token_url)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret.expose().as_str()),
            ("grant_type", "client_credentials"),
        ])
        .build()
        .map_err(|e| api_client::Error::Http(format!("building token request: {e}")))?;

    let response = send(http, request, policy).await?;
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| api_client::Error::Http(format!("reading token response: {e}")))?;

    if status != 200 {
        return Err(api_client::Error::Api(classify(status, &body, AuthScheme::OAuthExchange)).into());
    }

    let payload: TokenPayload = serde_json::from_slice(&body)
        .map_err(|e| api_client::Error::Decode(format!("invalid token response: {e}")))?;
    if payload.access_token.is_empty() {
        return Err(api_client::Error::Decode("token response has an empty access_token".into()).into());
    }

    debug!(
        token_type = %payload.token_type,
        expires_in = payload.expires_in,
        "OAuth access token obtained"
    );

    Ok(BearerToken {
        access_token: Secret::new(payload.access_token),
        token_type: payload.token_type,
        expires_in: payload.expires_in,
    })
}
