use crate::cli::{OutputFormat, SelectionArgs};
use crate::commands::run::warn_if_idle;
use anyhow::{bail, Context, Result};
use monsync_discovery::TargetKind;
use monsync_state::SyncConfig;
use monsync_sync::{SyncOrchestrator, SyncOutcome, SyncPlan, SyncResult};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

/// One artifact that a run would apply.
#[derive(Debug, Serialize)]
struct PlanEntry<'a> {
    path: &'a Path,
    kind: TargetKind,
    key: &'a str,
    categories: &'a [String],
}

#[derive(Debug, Serialize)]
struct PlanView<'a> {
    apply: Vec<PlanEntry<'a>>,
    settled: Vec<&'a SyncResult>,
}

fn view(plan: &SyncPlan) -> PlanView<'_> {
    let mut settled: Vec<&SyncResult> = plan.settled.iter().collect();
    settled.sort_by(|a, b| a.path.cmp(&b.path));
    PlanView {
        apply: plan
            .pending
            .iter()
            .map(|a| PlanEntry {
                path: &a.source_path,
                kind: a.kind,
                key: &a.key,
                categories: &a.categories,
            })
            .collect(),
        settled,
    }
}

pub(crate) fn render_plan(plan: &SyncPlan, format: OutputFormat) -> Result<String> {
    let view = view(plan);
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(&view).context("failed to serialize plan");
    }

    let failed = view
        .settled
        .iter()
        .filter(|r| r.outcome.is_failure())
        .count();
    let mut out = format!(
        "Plan: {} to apply, {} skipped, {} failed\n",
        view.apply.len(),
        view.settled.len() - failed,
        failed
    );
    for entry in &view.apply {
        let _ = writeln!(
            out,
            "  apply  {:<18} {}  ({})",
            entry.kind.label(),
            entry.path.display(),
            entry.key
        );
    }
    for result in &view.settled {
        let kind = result.kind.map(|k| k.label()).unwrap_or("unknown");
        let _ = match &result.outcome {
            SyncOutcome::Skipped(reason) => writeln!(
                out,
                "  skip   {:<18} {}  {reason}",
                kind,
                result.path.display()
            ),
            SyncOutcome::Failed(err) => writeln!(
                out,
                "  fail   {:<18} {}  ({}): {err}",
                kind,
                result.path.display(),
                err.kind()
            ),
            // a plan never applies anything
            SyncOutcome::Created | SyncOutcome::Updated => Ok(()),
        };
    }
    Ok(out)
}

/// Handle the `plan` command.
pub(crate) fn handle_plan_command(
    config_path: Option<&Path>,
    selection: &SelectionArgs,
    format: OutputFormat,
) -> Result<()> {
    let config = SyncConfig::load(config_path, &selection.overrides())?;
    warn_if_idle(&config);
    let plan = SyncOrchestrator::from_config(config)?.plan();

    println!("{}", render_plan(&plan, format)?.trim_end());
    let failed = plan
        .settled
        .iter()
        .filter(|r| r.outcome.is_failure())
        .count();
    if failed > 0 {
        bail!("{failed} artifacts cannot be applied");
    }
    Ok(())
}
