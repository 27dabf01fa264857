use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Device identity reported during registration.
///
/// The descriptor is fixed per build; only the timestamp changes between
/// registration attempts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProperties {
    pub timestamp: i64,
    pub manufacturer: String,
    pub model: String,
    pub os: String,
    pub os_version: String,
    pub software_version: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub sensors: Vec<String>,
}

impl DeviceProperties {
    /// The identity of this gateway build, stamped with the current UTC time.
    pub fn current() -> Self {
        Self {
            timestamp: Utc::now().timestamp(),
            manufacturer: "Intel".to_string(),
            model: "Advantech".to_string(),
            os: "wrlinux".to_string(),
            os_version: "7.0.0.13".to_string(),
            software_version: format!("pylon-bridge-v{}", env!("CARGO_PKG_VERSION")),
            device_type: "wrlinux".to_string(),
            sensors: vec!["temperature".to_string(), "humidity".to_string()],
        }
    }
}

/// Body sent to the registration endpoint. Built fresh per attempt, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub api_key: String,
    pub properties: DeviceProperties,
}

impl RegistrationRequest {
    pub fn new(api_key: impl Into<String>, properties: DeviceProperties) -> Self {
        Self {
            api_key: api_key.into(),
            properties,
        }
    }
}

/// Registration reply. Only the token is retained beyond the call; other
/// server-assigned identifiers are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegistrationResponse {
    pub token: String,
}
