use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use monsync_state::ConfigOverrides;
use std::path::PathBuf;

/// Output format for reports.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Command-line interface for the `monsync` application.
#[derive(Debug, Parser)]
#[command(
    name = "monsync",
    version,
    about = "Synchronizes Zabbix templates, Zabbix scripts and Grafana dashboards from a repository"
)]
pub struct Cli {
    /// Config file (default: `$MONSYNC_CONFIG`, then `~/.monsync/config.toml`).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Increases log verbosity (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every command that loads a configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Repository root laid out as `templates/`, `scripts/`, `dashboards/`.
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,
    /// Categories to sync, comma-separated or repeated; `*` selects all.
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,
    /// Maximum concurrent apply calls.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
    /// Per-request timeout in seconds.
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

impl SelectionArgs {
    /// Converts the flags into config overrides; unset flags override nothing.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            categories: (!self.categories.is_empty()).then(|| self.categories.join(",")),
            repo: self.repo.clone(),
            concurrency: self.concurrency,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Available `monsync` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Applies the selected artifacts to Zabbix and Grafana.
    #[command(alias = "sync")]
    Run {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Report format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Shows what `run` would apply without contacting any system.
    Plan {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Report format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Validates the configuration and prints the effective settings.
    CheckConfig {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}
