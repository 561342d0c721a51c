//! Auth-key API client
//!
//! One client serves both credential modes. The injected `Authorizer`
//! attaches the credential, runs its local format check before anything is
//! sent, and tells the client whether untagged keys may be requested.

use api_client::{AuthScheme, Authorizer, RetryPolicy, TagPolicy, classify, send};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{AuthKeyRecord, AuthKeySummary, CapabilityRequest, CreateKeyRequest};

#[derive(Deserialize)]
struct KeyList {
    #[serde(default)]
    keys: Vec<AuthKeySummary>,
}

/// Client for the tailnet auth-key collection.
pub struct KeysClient {
    http: reqwest::Client,
    keys_url: String,
    authorizer: Box<dyn Authorizer>,
    retry: RetryPolicy,
}

impl KeysClient {
    pub fn new(
        http: reqwest::Client,
        keys_url: impl Into<String>,
        authorizer: Box<dyn Authorizer>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            keys_url: keys_url.into(),
            authorizer,
            retry,
        }
    }

    pub fn scheme(&self) -> AuthScheme {
        self.authorizer.scheme()
    }

    /// Create an auth key.
    ///
    /// Credential format and tag policy are checked before any request is
    /// sent. Success is 200 or 201.
    pub async fn create_auth_key(&self, request: &CapabilityRequest) -> Result<AuthKeyRecord> {
        self.authorizer.validate()?;
        if request.tags.is_empty() && self.authorizer.tag_policy() == TagPolicy::Required {
            return Err(Error::TagsRequired);
        }

        let body = CreateKeyRequest::from(request);
        debug!(
            url = %self.keys_url,
            ephemeral = request.ephemeral,
            reusable = request.reusable,
            preauthorized = request.preauthorized,
            expiry_seconds = request.expiry_seconds,
            tags = ?request.tags,
            "creating auth key"
        );

        let (status, bytes) = self.execute(self.http.post(&self.keys_url).json(&body)).await?;
        if status != 200 && status != 201 {
            return Err(self.rejected(status, &bytes));
        }

        let record: AuthKeyRecord = decode(&bytes, "auth key response")?;
        info!(id = %record.id, expires = %record.expires, "auth key created");
        Ok(record)
    }

    /// List the tailnet's auth keys.
    pub async fn list_auth_keys(&self) -> Result<Vec<AuthKeySummary>> {
        self.authorizer.validate()?;
        debug!(url = %self.keys_url, "listing auth keys");

        let (status, bytes) = self.execute(self.http.get(&self.keys_url)).await?;
        if status != 200 {
            return Err(self.rejected(status, &bytes));
        }

        let list: KeyList = decode(&bytes, "key list response")?;
        debug!(count = list.keys.len(), "auth keys listed");
        Ok(list.keys)
    }

    /// Delete (revoke) an auth key by id. Success is 200 or 204.
    pub async fn delete_auth_key(&self, id: &str) -> Result<()> {
        self.authorizer.validate()?;
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::MissingKeyId);
        }

        let url = format!("{}/{id}", self.keys_url.trim_end_matches('/'));
        debug!(%url, "deleting auth key");

        let (status, bytes) = self.execute(self.http.delete(&url)).await?;
        if status != 200 && status != 204 {
            return Err(self.rejected(status, &bytes));
        }

        info!(id, "auth key deleted");
        Ok(())
    }

    /// Authorize, send through the retry executor and read the full body.
    async fn execute(&self, builder: reqwest::RequestBuilder) -> api_client::Result<(u16, Vec<u8>)> {
        let request = self
            .authorizer
            .authorize(builder)
            .build()
            .map_err(|e| api_client::Error::Http(format!("building request: {e}")))?;

        let response = send(&self.http, request, &self.retry).await?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| api_client::Error::Http(format!("reading response body: {e}")))?;
        Ok((status, body.to_vec()))
    }

    fn rejected(&self, status: u16, body: &[u8]) -> Error {
        api_client::Error::Api(classify(status, body, self.authorizer.scheme())).into()
    }
}

fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| api_client::Error::Decode(format!("failed to parse {what}: {e}")).into())
}
