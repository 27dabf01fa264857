use config::{Config, ConfigError, Environment};
use pylon_domain::{AcceptPolicy, TimestampMode};
use serde::{Deserialize, Serialize};

/// Runtime configuration, resolved from `PYLON_*` environment variables.
///
/// Settings without a serde default are required; resolving fails before
/// any network or broker activity when one is absent.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BridgeConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Host of the MQTT broker
    #[serde(default = "default_mqtt_broker_host")]
    pub mqtt_broker_host: String,

    /// Port of the MQTT broker
    #[serde(default = "default_mqtt_broker_port")]
    pub mqtt_broker_port: u16,

    /// Topic to subscribe to
    pub mqtt_topic: String,

    /// Base address of the ingestion API, e.g. http://ingress.local:8080
    pub ingress_address: String,

    /// API key exchanged for a bearer credential during registration
    pub ingress_api_key: String,

    /// Register even when a stored credential exists
    #[serde(default)]
    pub force_register: bool,

    /// Where the bearer credential is persisted between runs
    #[serde(default = "default_credential_path")]
    pub credential_path: String,

    /// Timeout for registration and event delivery calls, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// How the datum timestamp is rendered (raw | iso8601)
    #[serde(default = "default_timestamp_mode")]
    pub timestamp_mode: TimestampMode,

    /// Output field receiving the datum timestamp
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,

    /// Output field receiving the datum value
    #[serde(default = "default_value_field")]
    pub value_field: String,

    /// Which ingestion statuses count as accepted (no_content | any_success)
    #[serde(default = "default_accept_policy")]
    pub accept_policy: AcceptPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mqtt_broker_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_broker_port() -> u16 {
    1883
}

fn default_credential_path() -> String {
    match dirs::home_dir() {
        Some(home) => home
            .join(".pylon")
            .join("credential")
            .to_string_lossy()
            .into_owned(),
        None => "pylon-credential".to_string(),
    }
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_timestamp_mode() -> TimestampMode {
    TimestampMode::Iso8601
}

fn default_timestamp_field() -> String {
    "timestamp_iso8601".to_string()
}

fn default_value_field() -> String {
    "sensor_value".to_string()
}

fn default_accept_policy() -> AcceptPolicy {
    AcceptPolicy::NoContent
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("PYLON"))
            .build()?
            .try_deserialize()
    }
}
