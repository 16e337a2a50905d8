use crate::cli::SelectionArgs;
use anyhow::{bail, Result};
use monsync_state::SyncConfig;
use std::path::Path;

/// Repository directories that are configured but missing on disk.
fn missing_roots(config: &SyncConfig) -> Vec<String> {
    let repo = &config.repository;
    [
        ("repository", &repo.root),
        ("templates", &repo.templates),
        ("scripts", &repo.scripts),
        ("dashboards", &repo.dashboards),
    ]
    .into_iter()
    .filter_map(|(label, path)| {
        path.as_ref()
            .filter(|p| !p.is_dir())
            .map(|p| format!("{label} directory {} does not exist", p.display()))
    })
    .collect()
}

/// Handle the `check-config` command.
pub(crate) fn handle_check_config_command(
    config_path: Option<&Path>,
    selection: &SelectionArgs,
) -> Result<()> {
    let config = SyncConfig::load(config_path, &selection.overrides())?;
    print!("{config}");

    let problems = missing_roots(&config);
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("error: {problem}");
        }
        bail!("configuration has {} problem(s)", problems.len());
    }
    println!("Configuration OK");
    Ok(())
}
