use config::{Config, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

pub mod env_vars;
pub mod models;
pub use models::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("failed to post-process configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Loads the application configuration.
///
/// Sources, later ones winning:
/// 1. `{CONFIG_DIR}/default.*`
/// 2. `{CONFIG_DIR}/{RUN_ENV}.*`
/// 3. `CALBRIDGE__*` environment variables (`__` separates sections)
/// 4. `secret_from_env` markers, then conventional deployment variables
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string());
    let config_dir = PathBuf::from(env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()));
    let prefix = env_vars::get_config_prefix();

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!(
        "Loading configuration from {} and {}",
        default_path.display(),
        env_path.display()
    );

    let builder = Config::builder()
        .set_default("environment", run_env.clone())?
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .prefix_separator(env_vars::CONFIG_SEPARATOR)
                .separator(env_vars::CONFIG_SEPARATOR)
                .try_parsing(true),
        );

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    let config = apply_env_overrides_from_marker(raw_config)?;
    Ok(env_vars::apply_deployment_overrides(config))
}

/// Replaces `secret_from_env` markers with values from the process environment.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)?;
    env_vars::inject_env_secrets_with(&mut json, &|key: &str| env::var(key).ok());
    Ok(serde_json::from_value(json)?)
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment once.
///
/// `DOTENV_OVERRIDE` selects another file; the default is `.env`. A missing
/// file is not an error. Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = Config::builder()
            .build()
            .expect("empty config builds")
            .try_deserialize()
            .expect("defaults deserialize");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.gcal.calendar_id, DEFAULT_CALENDAR_ID);
        assert_eq!(config.retry.interval_secs, 60);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(!config.gcal.has_service_account());
    }

    #[test]
    fn test_file_source_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("default.toml");
        std::fs::write(
            &path,
            r#"
environment = "staging"

[server]
port = 4000

[gcal]
calendar_id = "team@group.calendar.google.com"
key_path = "/run/secrets/sa.json"

[retry]
interval_secs = 15
"#,
        )
        .expect("write config");

        let config: AppConfig = Config::builder()
            .add_source(File::from(path))
            .build()
            .expect("config builds")
            .try_deserialize()
            .expect("config deserializes");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.gcal.calendar_id, "team@group.calendar.google.com");
        assert_eq!(config.retry.interval_secs, 15);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(config.gcal.has_service_account());
    }

    #[test]
    fn test_unresolved_marker_is_not_a_service_account() {
        let mut config = AppConfig::default();
        config.gcal.service_account_key = Some("secret_from_env".to_string());
        assert!(!config.gcal.has_service_account());
    }

    #[test]
    fn test_debug_redacts_inline_key() {
        let mut config = AppConfig::default();
        config.gcal.service_account_key = Some("c3VwZXItc2VjcmV0".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("c3VwZXItc2VjcmV0"));
        assert!(rendered.contains("<redacted>"));
    }
}
