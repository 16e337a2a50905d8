//! Run configuration for monsync.
//!
//! Loads settings from `~/.monsync/config.toml` (or the file named by
//! `--config` / `MONSYNC_CONFIG`) with the following precedence:
//! CLI arguments > Environment variables > Config file
//!
//! ## Configuration File Format
//!
//! ```toml
//! # ~/.monsync/config.toml
//! categories = ["Websites", "Databases"]
//! concurrency = 4
//! timeout_secs = 30
//!
//! [repository]
//! root = "/srv/monitoring-repo"
//! # optional per-kind roots, each grouped by category directories
//! # templates = "/srv/zabbix-templates"
//!
//! [zabbix]
//! url = "https://zabbix.example.com/api_jsonrpc.php"
//! username = "Admin"
//! password = "secret"
//! # api_token = "..."           # skips user.login
//! # externalscripts_dir = "/usr/lib/zabbix/externalscripts"
//!
//! [grafana]
//! url = "https://grafana.example.com"
//! api_key = "glsa_..."
//! # folder_uid = "monitoring"
//! ```
//!
//! JSON and YAML files with the same shape are accepted, as are the keys of
//! the older auto-update configuration (`category` as a comma string,
//! `zabbix.user`, top-level `externalscript_path`).

use crate::env::{self, env_parse, env_string};
use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Worker limit when none is configured.
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Upper bound for the worker limit.
pub const MAX_CONCURRENCY: usize = 16;
/// Per-call timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Upper bound for the per-call timeout.
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Category selection as written in a config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryList {
    /// `["Websites", "Databases"]`
    List(Vec<String>),
    /// `"Websites, Databases"`
    Text(String),
}

impl CategoryList {
    fn into_vec(self) -> Vec<String> {
        match self {
            CategoryList::List(items) => items,
            CategoryList::Text(text) => split_categories(&text),
        }
    }
}

fn split_categories(text: &str) -> Vec<String> {
    text.split(',').map(str::to_string).collect()
}

/// Raw config file contents before overrides and validation.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default, alias = "category")]
    pub categories: Option<CategoryList>,
    #[serde(default)]
    pub repository: RepositoryFile,
    #[serde(default)]
    pub zabbix: ZabbixFile,
    #[serde(default)]
    pub grafana: GrafanaFile,
    /// Legacy location of `zabbix.externalscripts_dir`.
    #[serde(default)]
    pub externalscript_path: Option<PathBuf>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default, alias = "request_timeout_secs")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RepositoryFile {
    pub root: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub scripts: Option<PathBuf>,
    pub dashboards: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ZabbixFile {
    pub url: Option<String>,
    #[serde(alias = "user")]
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_token: Option<String>,
    #[serde(alias = "externalscript_path")]
    pub externalscripts_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GrafanaFile {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub folder_uid: Option<String>,
}

/// Values supplied on the command line.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub categories: Option<String>,
    pub repo: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Reads a config file, choosing the parser from its extension.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let parsed = match ext.as_str() {
            "json" => serde_json::from_str(&content).map_err(anyhow::Error::from),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(anyhow::Error::from),
            _ => toml::from_str(&content).map_err(anyhow::Error::from),
        };
        let file = parsed.with_context(|| format!("parsing config file {}", path.display()))?;

        tracing::debug!(
            target: "monsync::config",
            path = %path.display(),
            "Loaded configuration file"
        );
        Ok(file)
    }

    /// Overlays `MONSYNC_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        fn set(slot: &mut Option<String>, key: &str) {
            if let Some(value) = env_string(key) {
                *slot = Some(value);
                tracing::trace!(target: "monsync::config", key, "Using environment override");
            }
        }

        if let Some(list) = env_string(env::CATEGORIES_VAR) {
            self.categories = Some(CategoryList::Text(list));
        }
        if let Some(repo) = env_string(env::REPO_VAR) {
            self.repository.root = Some(PathBuf::from(repo));
        }
        set(&mut self.zabbix.url, env::ZABBIX_URL_VAR);
        set(&mut self.zabbix.username, env::ZABBIX_USER_VAR);
        set(&mut self.zabbix.password, env::ZABBIX_PASSWORD_VAR);
        set(&mut self.zabbix.api_token, env::ZABBIX_API_TOKEN_VAR);
        set(&mut self.grafana.url, env::GRAFANA_URL_VAR);
        set(&mut self.grafana.api_key, env::GRAFANA_API_KEY_VAR);
        if let Some(n) = env_parse::<usize>(env::CONCURRENCY_VAR)? {
            self.concurrency = Some(n);
        }
        if let Some(secs) = env_parse::<u64>(env::TIMEOUT_VAR)? {
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// Overlays command-line values.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(list) = &overrides.categories {
            self.categories = Some(CategoryList::Text(list.clone()));
        }
        if let Some(repo) = &overrides.repo {
            self.repository.root = Some(repo.clone());
        }
        if overrides.concurrency.is_some() {
            self.concurrency = overrides.concurrency;
        }
        if overrides.timeout_secs.is_some() {
            self.timeout_secs = overrides.timeout_secs;
        }
    }

    /// Validates the merged values into a [`SyncConfig`].
    pub fn resolve(self) -> Result<SyncConfig> {
        let repository = RepositoryConfig {
            root: self.repository.root,
            templates: self.repository.templates,
            scripts: self.repository.scripts,
            dashboards: self.repository.dashboards,
        };
        if repository.is_empty() {
            bail!(
                "no repository configured; set repository.root, {} or --repo",
                env::REPO_VAR
            );
        }

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if !(1..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            bail!("timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}, got {timeout_secs}");
        }

        let zabbix = match self.zabbix.url {
            None => None,
            Some(url) => {
                let auth = match (
                    self.zabbix.api_token,
                    self.zabbix.username,
                    self.zabbix.password,
                ) {
                    (Some(token), _, _) => ZabbixAuth::Token(token),
                    (None, Some(username), Some(password)) => {
                        ZabbixAuth::Password { username, password }
                    }
                    _ => bail!("zabbix needs either api_token or both username and password"),
                };
                Some(ZabbixSettings {
                    url: parse_url("zabbix.url", &url)?,
                    auth,
                    externalscripts_dir: self
                        .zabbix
                        .externalscripts_dir
                        .or(self.externalscript_path),
                })
            }
        };

        let grafana = match self.grafana.url {
            None => None,
            Some(url) => {
                let Some(api_key) = self.grafana.api_key else {
                    bail!("grafana.url is set but grafana.api_key is missing");
                };
                Some(GrafanaSettings {
                    url: parse_url("grafana.url", &url)?,
                    api_key,
                    folder_uid: self.grafana.folder_uid,
                })
            }
        };

        let categories = self
            .categories
            .map(CategoryList::into_vec)
            .unwrap_or_default();

        Ok(SyncConfig {
            categories: normalize_categories(categories),
            repository,
            zabbix,
            grafana,
            concurrency: clamp_concurrency(self.concurrency.unwrap_or(DEFAULT_CONCURRENCY)),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url> {
    Url::parse(raw.trim()).with_context(|| format!("{field} is not a valid URL: '{raw}'"))
}

fn normalize_categories(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for category in raw {
        let category = category.trim();
        if !category.is_empty() && !out.iter().any(|c| c.eq_ignore_ascii_case(category)) {
            out.push(category.to_string());
        }
    }
    out
}

fn clamp_concurrency(requested: usize) -> usize {
    let clamped = requested.clamp(1, MAX_CONCURRENCY);
    if clamped != requested {
        tracing::warn!(
            target: "monsync::config",
            requested,
            clamped,
            "Concurrency out of range"
        );
    }
    clamped
}

/// Where artifact files live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Repository laid out as `templates/`, `scripts/`, `dashboards/`.
    pub root: Option<PathBuf>,
    /// Dedicated Zabbix template root.
    pub templates: Option<PathBuf>,
    /// Dedicated Zabbix script root.
    pub scripts: Option<PathBuf>,
    /// Dedicated Grafana dashboard root.
    pub dashboards: Option<PathBuf>,
}

impl RepositoryConfig {
    fn is_empty(&self) -> bool {
        self.root.is_none()
            && self.templates.is_none()
            && self.scripts.is_none()
            && self.dashboards.is_none()
    }
}

/// How monsync authenticates against Zabbix.
#[derive(Clone, PartialEq, Eq)]
pub enum ZabbixAuth {
    /// `user.login` with these credentials.
    Password { username: String, password: String },
    /// Static API token; no login call.
    Token(String),
}

impl fmt::Debug for ZabbixAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZabbixAuth::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            ZabbixAuth::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

/// Zabbix endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZabbixSettings {
    /// API endpoint (`.../api_jsonrpc.php` is appended when missing).
    pub url: Url,
    pub auth: ZabbixAuth,
    /// Directory receiving executable copies of script artifacts.
    pub externalscripts_dir: Option<PathBuf>,
}

impl ZabbixSettings {
    /// Settings that log in with a username and password.
    pub fn with_password(url: &str, username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            url: parse_url("zabbix.url", url)?,
            auth: ZabbixAuth::Password {
                username: username.to_string(),
                password: password.to_string(),
            },
            externalscripts_dir: None,
        })
    }

    /// Settings that use a static API token.
    pub fn with_token(url: &str, token: &str) -> Result<Self> {
        Ok(Self {
            url: parse_url("zabbix.url", url)?,
            auth: ZabbixAuth::Token(token.to_string()),
            externalscripts_dir: None,
        })
    }
}

/// Grafana endpoint and API key.
#[derive(Clone, PartialEq, Eq)]
pub struct GrafanaSettings {
    pub url: Url,
    pub api_key: String,
    /// Folder receiving new dashboards.
    pub folder_uid: Option<String>,
}

impl GrafanaSettings {
    pub fn new(url: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            url: parse_url("grafana.url", url)?,
            api_key: api_key.to_string(),
            folder_uid: None,
        })
    }
}

impl fmt::Debug for GrafanaSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrafanaSettings")
            .field("url", &self.url.as_str())
            .field("api_key", &"<redacted>")
            .field("folder_uid", &self.folder_uid)
            .finish()
    }
}

/// Immutable configuration of one synchronization run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Selected categories; `*` selects everything, empty selects nothing.
    pub categories: Vec<String>,
    pub repository: RepositoryConfig,
    /// `None` when Zabbix is not a target of this run.
    pub zabbix: Option<ZabbixSettings>,
    /// `None` when Grafana is not a target of this run.
    pub grafana: Option<GrafanaSettings>,
    /// Maximum concurrent apply calls, within `1..=MAX_CONCURRENCY`.
    pub concurrency: usize,
    /// Bound on each network call.
    pub request_timeout: Duration,
}

impl SyncConfig {
    /// A configuration for `root` with defaults and no targets.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            categories: Vec::new(),
            repository: RepositoryConfig {
                root: Some(root.into()),
                ..RepositoryConfig::default()
            },
            zabbix: None,
            grafana: None,
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = normalize_categories(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_zabbix(mut self, zabbix: ZabbixSettings) -> Self {
        self.zabbix = Some(zabbix);
        self
    }

    pub fn with_grafana(mut self, grafana: GrafanaSettings) -> Self {
        self.grafana = Some(grafana);
        self
    }

    /// Sets the worker limit, clamped to `1..=MAX_CONCURRENCY`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = clamp_concurrency(concurrency);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    /// Loads the config file, then applies environment and CLI overrides.
    ///
    /// An explicit path (argument or `MONSYNC_CONFIG`) must exist. The default
    /// `~/.monsync/config.toml` is optional.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env_string(env::CONFIG_VAR).map(PathBuf::from));
        let mut file = match explicit {
            Some(path) => ConfigFile::read(&path)?,
            None => match env::config_file() {
                Some(default) if default.exists() => ConfigFile::read(&default)?,
                _ => ConfigFile::default(),
            },
        };
        file.apply_env()?;
        file.apply_overrides(overrides);
        file.resolve()
    }
}

impl fmt::Display for SyncConfig {
    /// Human-readable summary with secrets omitted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".into())
        };
        let categories = if self.categories.is_empty() {
            "(none)".to_string()
        } else {
            self.categories.join(", ")
        };
        writeln!(f, "categories:  {categories}")?;
        writeln!(f, "repository:  {}", show(&self.repository.root))?;
        if self.repository.templates.is_some()
            || self.repository.scripts.is_some()
            || self.repository.dashboards.is_some()
        {
            writeln!(f, "  templates:  {}", show(&self.repository.templates))?;
            writeln!(f, "  scripts:    {}", show(&self.repository.scripts))?;
            writeln!(f, "  dashboards: {}", show(&self.repository.dashboards))?;
        }
        match &self.zabbix {
            Some(z) => {
                let auth = match &z.auth {
                    ZabbixAuth::Password { username, .. } => format!("user {username}"),
                    ZabbixAuth::Token(_) => "api token".to_string(),
                };
                writeln!(f, "zabbix:      {} ({auth})", z.url)?;
                if let Some(dir) = &z.externalscripts_dir {
                    writeln!(f, "  externalscripts: {}", dir.display())?;
                }
            }
            None => writeln!(f, "zabbix:      not configured")?,
        }
        match &self.grafana {
            Some(g) => writeln!(f, "grafana:     {}", g.url)?,
            None => writeln!(f, "grafana:     not configured")?,
        }
        writeln!(f, "concurrency: {}", self.concurrency)?;
        write!(f, "timeout:     {}s", self.request_timeout.as_secs())
    }
}
