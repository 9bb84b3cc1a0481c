// --- File: crates/calbridge_config/src/models.rs ---

use serde::{Deserialize, Serialize};

pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_TIME_ZONE: &str = "UTC";

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with the static assistant page. Served only when it exists.
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

// --- Google Calendar Config ---
// The service account key is either a file (key_path) or an inline blob
// (service_account_key, base64 encoded). Mark the blob as "secret_from_env"
// in config files and provide GCAL_SERVICE_ACCOUNT_KEY.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Deserialize, Serialize, Clone)]
pub struct GcalConfig {
    #[serde(default)]
    pub key_path: Option<String>,
    #[serde(default)]
    pub service_account_key: Option<String>,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl GcalConfig {
    /// True when some form of service account key material is configured.
    pub fn has_service_account(&self) -> bool {
        let present = |v: &Option<String>| {
            v.as_deref()
                .is_some_and(|s| !s.trim().is_empty() && s != "secret_from_env")
        };
        present(&self.key_path) || present(&self.service_account_key)
    }
}

// Keeps the inline key out of logs.
impl std::fmt::Debug for GcalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcalConfig")
            .field("key_path", &self.key_path)
            .field(
                "service_account_key",
                &self.service_account_key.as_ref().map(|_| "<redacted>"),
            )
            .field("calendar_id", &self.calendar_id)
            .field("time_zone", &self.time_zone)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for GcalConfig {
    fn default() -> Self {
        Self {
            key_path: None,
            service_account_key: None,
            calendar_id: default_calendar_id(),
            time_zone: default_time_zone(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

// --- Retry queue Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetryConfig {
    /// Seconds between two sweeps of the pending queue.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Delivery attempts before a pending event is abandoned.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    5
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gcal: GcalConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Reported by /api/status only.
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            gcal: GcalConfig::default(),
            retry: RetryConfig::default(),
            environment: default_environment(),
            log_level: default_log_level(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
