//! Run configuration for monsync.
//!
//! This crate provides utilities for:
//! - Loading the config file (TOML, JSON or YAML) including legacy keys.
//! - Overlaying `MONSYNC_*` environment variables and CLI values.
//! - Validating the result into an immutable [`SyncConfig`].

pub mod config;
pub mod env;

pub use config::{
    CategoryList, ConfigFile, ConfigOverrides, GrafanaSettings, RepositoryConfig, SyncConfig,
    ZabbixAuth, ZabbixSettings, DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS, MAX_CONCURRENCY,
    MAX_TIMEOUT_SECS,
};
pub use env::{config_file, env_parse, env_string, home_dir};
