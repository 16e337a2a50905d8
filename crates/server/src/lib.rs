//! This crate provides the command-line front end of `monsync`.
//!
//! The main entry point is the [`run`] function, which parses arguments, sets up
//! logging, loads the configuration and dispatches to a command handler. The
//! synchronization itself lives in `monsync_sync`; this crate only wires it to
//! the terminal.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
mod commands;

pub use cli::{Cli, Commands, OutputFormat, SelectionArgs};

/// Default filter when `RUST_LOG` is unset, by `-v` count.
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,monsync=info",
        1 => "warn,monsync=debug",
        _ => "info,monsync=trace",
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    // stdout carries reports; logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The main entry point for the `monsync` application.
///
/// Returns an error when the configuration is invalid or when any artifact
/// failed, so the process exits non-zero in both cases.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Run { selection, format } => {
            commands::handle_run_command(config, &selection, format)
        }
        Commands::Plan { selection, format } => {
            commands::handle_plan_command(config, &selection, format)
        }
        Commands::CheckConfig { selection } => {
            commands::handle_check_config_command(config, &selection)
        }
    }
}
