use crate::cli::{OutputFormat, SelectionArgs};
use anyhow::{bail, Context, Result};
use monsync_state::SyncConfig;
use monsync_sync::{SyncOrchestrator, SyncReport};
use std::path::Path;

pub(crate) fn render_report(report: &SyncReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(report.format_summary()),
        OutputFormat::Json => report.to_json().context("failed to serialize sync report"),
    }
}

/// Warns about settings that make a run do nothing.
pub(crate) fn warn_if_idle(config: &SyncConfig) {
    if config.categories.is_empty() {
        tracing::warn!(
            target: "monsync::cli",
            "No categories selected; every artifact will be skipped (use `--category '*'` for all)"
        );
    }
    if config.zabbix.is_none() && config.grafana.is_none() {
        tracing::warn!(
            target: "monsync::cli",
            "Neither Zabbix nor Grafana is configured; every artifact will be skipped"
        );
    }
}

/// Handle the `run` command.
pub(crate) fn handle_run_command(
    config_path: Option<&Path>,
    selection: &SelectionArgs,
    format: OutputFormat,
) -> Result<()> {
    let config = SyncConfig::load(config_path, &selection.overrides())?;
    warn_if_idle(&config);
    let orchestrator = SyncOrchestrator::from_config(config)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let report = runtime.block_on(orchestrator.run());

    println!("{}", render_report(&report, format)?.trim_end());
    if report.has_failures() {
        bail!(
            "{} of {} artifacts failed",
            report.counts.failed,
            report.counts.total()
        );
    }
    Ok(())
}
