// --- File: crates/salonsync_config/src/models.rs ---

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ConfigValidationError;

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite://salonsync.db, loaded via SALONSYNC__DATABASE__URL
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

// --- Credential Vault Config ---
// The key is process-wide and never derived from request data.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct VaultConfig {
    /// Base64 encoded 32 byte AES-256-GCM key. Loaded via SALONSYNC__VAULT__ENCRYPTION_KEY
    pub encryption_key: String,
}

// --- Reminder Batch Config ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ReminderConfig {
    /// Shared bearer secret presented by the external daily scheduler.
    pub cron_secret: String,
}

// --- Messaging Platform Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MessagingConfig {
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.line.me".to_string(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// --- Default Weekly Schedule ---
// Applies to salons (or weekdays) without an explicit schedule entry.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub default_closed_weekdays: Vec<String>,
}

impl ScheduleConfig {
    /// Parses the configured weekday names ("sat", "Sunday", ...).
    pub fn closed_weekdays(&self) -> Result<Vec<Weekday>, ConfigValidationError> {
        self.default_closed_weekdays
            .iter()
            .map(|name| {
                Weekday::from_str(name.trim()).map_err(|_| ConfigValidationError::Invalid {
                    key: "schedule.default_closed_weekdays".to_string(),
                    reason: format!("'{}' is not a weekday", name),
                })
            })
            .collect()
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}
