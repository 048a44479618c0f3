//! Environment variable handling for the SalonSync application.
//!
//! Every configuration key can be overridden from the environment using the
//! `SALONSYNC` prefix and `__` as the path separator, e.g. `server.port`
//! becomes `SALONSYNC__SERVER__PORT`.

use std::env;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "SALONSYNC";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// Placeholder printed instead of secret values
pub const REDACTED: &str = "<redacted>";

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a configuration path to an environment variable name
///
/// # Arguments
///
/// * `path` - The configuration path (e.g., "server.host")
///
/// # Returns
///
/// The environment variable name (e.g., "SALONSYNC__SERVER__HOST")
pub fn config_path_to_env_var(path: &str) -> String {
    let prefix = get_config_prefix();
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Check if a path is a secret path
///
/// Paths containing "secret", "key", "password" or "token" are considered secret
/// and must never be written to logs.
pub fn is_secret_path(path: &str) -> bool {
    let path_lower = path.to_lowercase();
    path_lower.contains("secret")
        || path_lower.contains("key")
        || path_lower.contains("password")
        || path_lower.contains("token")
}

/// Returns the value to print for a configuration path, hiding secrets.
pub fn display_value<'a>(path: &str, value: &'a str) -> &'a str {
    if is_secret_path(path) && !value.is_empty() {
        REDACTED
    } else {
        value
    }
}
