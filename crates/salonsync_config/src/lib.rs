// --- File: crates/salonsync_config/src/lib.rs ---
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub mod env_vars;
pub mod models;
pub use models::*;

use env_vars::{display_value, CONFIG_SEPARATOR};

/// Errors raised while loading or validating the application configuration.
#[derive(Error, Debug)]
pub enum ConfigValidationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Missing required configuration value: {0}")]
    Missing(String),
    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
    #[error("Could not load environment file {path}: {reason}")]
    Dotenv { path: String, reason: String },
}

/// Loads the configuration from `config/default`, `config/{RUN_ENV}` and
/// `SALONSYNC__*` environment variables, in that order of precedence.
pub fn load_config() -> Result<AppConfig, ConfigValidationError> {
    // Without a .env file the process environment has to carry everything
    if let Err(e) = ensure_dotenv_loaded() {
        debug!("{}", e);
    }
    let config_dir = env::var("SALONSYNC_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    load_config_from(Path::new(&config_dir))
}

/// Loads the configuration from an explicit directory.
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, ConfigValidationError> {
    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env_vars::get_config_prefix();

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);

    let builder = Config::builder()
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .prefix_separator(CONFIG_SEPARATOR)
                .separator(CONFIG_SEPARATOR)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("schedule.default_closed_weekdays"),
        );

    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate()?;

    info!(
        "Configuration loaded (env: {}, server: {}:{}, database: {}, cron_secret: {})",
        run_env,
        config.server.host,
        config.server.port,
        config.database.url,
        display_value("reminder.cron_secret", &config.reminder.cron_secret)
    );
    Ok(config)
}

impl AppConfig {
    /// Rejects configurations the service cannot start with.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.vault.encryption_key.trim().is_empty() {
            return Err(ConfigValidationError::Missing(
                "vault.encryption_key".to_string(),
            ));
        }
        if self.reminder.cron_secret.trim().is_empty() {
            return Err(ConfigValidationError::Missing(
                "reminder.cron_secret".to_string(),
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigValidationError::Missing("database.url".to_string()));
        }
        self.schedule.closed_weekdays()?;
        Ok(())
    }
}

static INIT_DOTENV: OnceCell<Result<(), String>> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// `DOTENV_OVERRIDE` selects a different file; the default is `.env`. Loading
/// happens at most once per process and later calls report the first outcome.
pub fn ensure_dotenv_loaded() -> Result<String, ConfigValidationError> {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    let outcome = INIT_DOTENV.get_or_init(|| load_dotenv(&dotenv_path).map_err(|e| e.to_string()));

    match outcome {
        Ok(()) => Ok(dotenv_path),
        Err(reason) => Err(ConfigValidationError::Dotenv {
            path: dotenv_path,
            reason: reason.clone(),
        }),
    }
}

fn load_dotenv(path: &str) -> Result<(), dotenv::Error> {
    dotenv::from_filename(path).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn valid_config() -> AppConfig {
        AppConfig {
            vault: VaultConfig {
                encryption_key: "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".to_string(),
            },
            reminder: ReminderConfig {
                cron_secret: "cron".to_string(),
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_missing_dotenv_file_is_reported() {
        let err = load_dotenv("does-not-exist.env").unwrap_err();
        assert!(matches!(err, dotenv::Error::Io(_)));
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_vault_key() {
        let mut config = valid_config();
        config.vault.encryption_key = String::new();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigValidationError::Missing(ref k) if k == "vault.encryption_key"));
    }

    #[test]
    fn test_validate_rejects_missing_cron_secret() {
        let mut config = valid_config();
        config.reminder.cron_secret = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_closed_weekdays_parsing() {
        let schedule = ScheduleConfig {
            default_closed_weekdays: vec!["sat".to_string(), "Sunday".to_string()],
        };
        assert_eq!(
            schedule.closed_weekdays().unwrap(),
            vec![Weekday::Sat, Weekday::Sun]
        );

        let bad = ScheduleConfig {
            default_closed_weekdays: vec!["someday".to_string()],
        };
        assert!(bad.closed_weekdays().is_err());
    }

    #[test]
    fn test_defaults_deserialize_from_empty_object() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.messaging.api_base_url, "https://api.line.me");
        assert!(config.schedule.default_closed_weekdays.is_empty());
    }
}
