use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Explicit config file path.
pub const CONFIG_VAR: &str = "MONSYNC_CONFIG";
/// Comma-separated category selection.
pub const CATEGORIES_VAR: &str = "MONSYNC_CATEGORIES";
/// Repository root.
pub const REPO_VAR: &str = "MONSYNC_REPO";
pub const ZABBIX_URL_VAR: &str = "MONSYNC_ZABBIX_URL";
pub const ZABBIX_USER_VAR: &str = "MONSYNC_ZABBIX_USER";
pub const ZABBIX_PASSWORD_VAR: &str = "MONSYNC_ZABBIX_PASSWORD";
pub const ZABBIX_API_TOKEN_VAR: &str = "MONSYNC_ZABBIX_API_TOKEN";
pub const GRAFANA_URL_VAR: &str = "MONSYNC_GRAFANA_URL";
pub const GRAFANA_API_KEY_VAR: &str = "MONSYNC_GRAFANA_API_KEY";
pub const CONCURRENCY_VAR: &str = "MONSYNC_CONCURRENCY";
pub const TIMEOUT_VAR: &str = "MONSYNC_TIMEOUT_SECS";

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Returns the path to the config file.
///
/// `MONSYNC_CONFIG` wins over the default `~/.monsync/config.toml`.
pub fn config_file() -> Option<PathBuf> {
    if let Some(custom) = env_string(CONFIG_VAR) {
        return Some(PathBuf::from(custom));
    }
    home_dir()
        .ok()
        .map(|h| h.join(".monsync").join("config.toml"))
}

/// Reads an environment variable, treating blank values as unset.
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an environment variable.
///
/// Unset is `Ok(None)`; a value that does not parse is an error naming the variable.
pub fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_string(key)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("invalid value '{raw}' for {key}"))
        })
        .transpose()
}
