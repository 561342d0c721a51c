//! Auth-key request and response types
//!
//! `CapabilityRequest` is the caller-facing description of the key to create.
//! `CreateKeyRequest` is its wire form: the flags nest under
//! `capabilities.devices.create` and the expiry is sent as `expirySeconds`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Parameters for a new auth key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityRequest {
    /// Devices authorized with the key are removed when they go offline
    pub ephemeral: bool,
    /// The key can register more than one device
    pub reusable: bool,
    /// Devices skip manual approval
    pub preauthorized: bool,
    /// Lifetime in seconds; 0 lets the service pick its maximum
    pub expiry_seconds: u64,
    /// ACL tags, each `tag:<name>`
    pub tags: Vec<String>,
    /// Free-form label; omitted from the request when empty
    pub description: String,
}

impl CapabilityRequest {
    /// Convert a lifetime in days to the seconds the API expects.
    pub fn expiry_seconds_from_days(days: u32) -> u64 {
        u64::from(days) * SECONDS_PER_DAY
    }
}

/// Flags applied to devices registered with a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceCreateCapabilities {
    pub reusable: bool,
    pub ephemeral: bool,
    pub preauthorized: bool,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceCapabilities {
    pub create: DeviceCreateCapabilities,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub devices: DeviceCapabilities,
}

/// Body of `POST /api/v2/tailnet/-/keys`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyRequest {
    pub capabilities: Capabilities,
    pub expiry_seconds: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl From<&CapabilityRequest> for CreateKeyRequest {
    fn from(request: &CapabilityRequest) -> Self {
        Self {
            capabilities: Capabilities {
                devices: DeviceCapabilities {
                    create: DeviceCreateCapabilities {
                        reusable: request.reusable,
                        ephemeral: request.ephemeral,
                        preauthorized: request.preauthorized,
                        tags: request.tags.clone(),
                    },
                },
            },
            expiry_seconds: request.expiry_seconds,
            description: request.description.clone(),
        }
    }
}

/// A freshly created auth key as returned by the API.
#[derive(Clone, Deserialize)]
pub struct AuthKeyRecord {
    pub id: String,
    pub key: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub description: Option<String>,
}

impl AuthKeyRecord {
    /// Device flags echoed back by the service.
    pub fn flags(&self) -> &DeviceCreateCapabilities {
        &self.capabilities.devices.create
    }
}

impl fmt::Debug for AuthKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthKeyRecord")
            .field("id", &self.id)
            .field("key", &"[REDACTED]")
            .field("created", &self.created)
            .field("expires", &self.expires)
            .field("capabilities", &self.capabilities)
            .field("description", &self.description)
            .finish()
    }
}

/// An existing key as reported by the list endpoint (no key material).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthKeySummary {
    pub id: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
}
