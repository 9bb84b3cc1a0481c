//! Environment variable handling for calbridge.
//!
//! Configuration keys map to `CALBRIDGE__SECTION__KEY` variables through the
//! `config` crate. Secrets marked `secret_from_env` in config files are looked
//! up under `CALBRIDGE_SECRET_SECTION_KEY`, falling back to `SECTION_KEY`.
//! A handful of conventional deployment variables (`PORT`,
//! `GOOGLE_APPLICATION_CREDENTIALS`, ...) are applied last.

use crate::models::AppConfig;
use serde_json::Value;
use std::env;
use tracing::warn;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "CALBRIDGE";

/// The prefix for secret environment variables
pub const SECRET_PREFIX: &str = "CALBRIDGE_SECRET";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// The separator for secret environment variables
pub const SECRET_SEPARATOR: &str = "_";

/// Marker value replaced by an environment variable at load time.
pub const SECRET_MARKER: &str = "secret_from_env";

pub const PORT: &str = "PORT";
pub const SERVICE_ACCOUNT_KEY: &str = "GOOGLE_SERVICE_ACCOUNT_KEY";
pub const SERVICE_ACCOUNT_KEY_PATH: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const DEFAULT_CALENDAR_ID: &str = "DEFAULT_CALENDAR_ID";
pub const DEFAULT_TIME_ZONE: &str = "DEFAULT_TIME_ZONE";

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a secret path to an environment variable name
///
/// `gcal.service_account_key` becomes `CALBRIDGE_SECRET_GCAL_SERVICE_ACCOUNT_KEY`.
pub fn secret_path_to_env_var(path: &str) -> String {
    let path = path.replace('.', SECRET_SEPARATOR);
    format!("{}{}{}", SECRET_PREFIX, SECRET_SEPARATOR, path).to_uppercase()
}

/// Short form of a secret variable name, e.g. `GCAL_SERVICE_ACCOUNT_KEY`.
pub fn legacy_secret_path_to_env_var(path: &str) -> String {
    path.replace('.', SECRET_SEPARATOR).to_uppercase()
}

fn lookup_secret<F>(path: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&secret_path_to_env_var(path)).or_else(|| lookup(&legacy_secret_path_to_env_var(path)))
}

/// Replace every `secret_from_env` string in `value` using `lookup`.
///
/// Markers without a matching variable become `null`, so optional fields
/// deserialize as absent instead of carrying the marker around.
pub fn inject_env_secrets_with<F>(value: &mut Value, lookup: &F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    fn walk<F>(path: &mut Vec<String>, obj: &mut Value, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut replaced = false;
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.clone());
                    replaced |= walk(path, v, lookup);
                    path.pop();
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let path_str = path.join(".");
                match lookup_secret(&path_str, lookup) {
                    Some(env_val) => {
                        *obj = Value::String(env_val);
                        replaced = true;
                    }
                    None => {
                        warn!("No environment variable found for secret {}", path_str);
                        *obj = Value::Null;
                    }
                }
            }
            _ => {}
        }
        replaced
    }

    walk(&mut Vec::new(), value, lookup)
}

/// Apply conventional deployment variables on top of a loaded configuration.
pub fn apply_deployment_overrides_with<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = non_empty(PORT) {
        match port.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!("Ignoring invalid PORT value: {}", port),
        }
    }
    if let Some(key) = non_empty(SERVICE_ACCOUNT_KEY) {
        config.gcal.service_account_key = Some(key);
    }
    if let Some(path) = non_empty(SERVICE_ACCOUNT_KEY_PATH) {
        config.gcal.key_path = Some(path);
    }
    if let Some(calendar_id) = non_empty(DEFAULT_CALENDAR_ID) {
        config.gcal.calendar_id = calendar_id;
    }
    if let Some(time_zone) = non_empty(DEFAULT_TIME_ZONE) {
        config.gcal.time_zone = time_zone;
    }
    config
}

/// [`apply_deployment_overrides_with`] reading the process environment.
pub fn apply_deployment_overrides(config: AppConfig) -> AppConfig {
    apply_deployment_overrides_with(config, |key| env::var(key).ok())
}
