//! Run reporting types for tracking what was applied, skipped and failed.

use crate::error::{ErrorKind, SyncError};
use monsync_discovery::TargetKind;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Reasons why an artifact was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// None of its categories is selected.
    CategoryExcluded,
    /// Its target system has no endpoint in the configuration.
    TargetNotConfigured,
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::CategoryExcluded => "category-excluded",
            SkipReason::TargetNotConfigured => "target-not-configured",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No object with the artifact's key existed; one was created.
    Created,
    /// The existing object was overwritten.
    Updated,
    Skipped(SkipReason),
    Failed(#[serde(serialize_with = "serialize_error")] SyncError),
}

fn serialize_error<S: Serializer>(err: &SyncError, serializer: S) -> Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct("SyncError", 2)?;
    s.serialize_field("kind", &err.kind())?;
    s.serialize_field("message", &err.to_string())?;
    s.end()
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }
}

/// Outcome of one discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Repository-relative source path.
    pub path: PathBuf,
    /// Target kind, when classification got that far.
    pub kind: Option<TargetKind>,
    /// Identifying key, when decoding got that far.
    pub key: Option<String>,
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

/// Per-outcome totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    fn add(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Skipped(_) => self.skipped += 1,
            SyncOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.failed
    }
}

/// Complete report of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// One entry per discovered file, ordered by path.
    pub results: Vec<SyncResult>,
    pub counts: OutcomeCounts,
}

impl SyncReport {
    pub fn new(mut results: Vec<SyncResult>) -> Self {
        results.sort_by(|a, b| a.path.cmp(&b.path).then(a.key.cmp(&b.key)));
        let mut counts = OutcomeCounts::default();
        for result in &results {
            counts.add(&result.outcome);
        }
        Self { results, counts }
    }

    pub fn has_failures(&self) -> bool {
        self.counts.failed > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &SyncResult> {
        self.results.iter().filter(|r| r.outcome.is_failure())
    }

    /// Totals per target kind; files that never got a kind are not counted.
    pub fn counts_by_kind(&self) -> BTreeMap<&'static str, OutcomeCounts> {
        let mut by_kind: BTreeMap<&'static str, OutcomeCounts> = BTreeMap::new();
        for result in &self.results {
            if let Some(kind) = result.kind {
                by_kind.entry(kind.label()).or_default().add(&result.outcome);
            }
        }
        by_kind
    }

    /// Number of failures of the given kind.
    pub fn failed_with(&self, kind: ErrorKind) -> usize {
        self.failures()
            .filter(|r| matches!(&r.outcome, SyncOutcome::Failed(e) if e.kind() == kind))
            .count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Generates a formatted summary for display.
    pub fn format_summary(&self) -> String {
        let c = &self.counts;
        let mut out = String::new();
        out.push_str(&format!(
            "Sync complete: {} created, {} updated, {} skipped, {} failed\n",
            c.created, c.updated, c.skipped, c.failed
        ));
        for (kind, k) in self.counts_by_kind() {
            out.push_str(&format!(
                "  {:<18} {} created, {} updated, {} skipped, {} failed\n",
                kind, k.created, k.updated, k.skipped, k.failed
            ));
        }
        let failures: Vec<_> = self.failures().collect();
        if !failures.is_empty() {
            out.push_str("Failures:\n");
            for result in failures {
                if let SyncOutcome::Failed(err) = &result.outcome {
                    let kind = result.kind.map(|k| k.label()).unwrap_or("unknown");
                    out.push_str(&format!(
                        "  {} [{}] ({}): {}\n",
                        result.path.display(),
                        kind,
                        err.kind(),
                        err
                    ));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    fn result(path: &str, kind: Option<TargetKind>, outcome: SyncOutcome) -> SyncResult {
        SyncResult {
            path: PathBuf::from(path),
            kind,
            key: None,
            outcome,
        }
    }

    fn sample() -> SyncReport {
        SyncReport::new(vec![
            result(
                "templates/web.xml",
                Some(TargetKind::ZabbixTemplate),
                SyncOutcome::Created,
            ),
            result(
                "dashboards/db.json",
                Some(TargetKind::GrafanaDashboard),
                SyncOutcome::Skipped(SkipReason::CategoryExcluded),
            ),
            result(
                "templates/bad.xml",
                Some(TargetKind::ZabbixTemplate),
                SyncOutcome::Failed(ClientError::Auth("login rejected".into()).into()),
            ),
        ])
    }

    #[test]
    fn counts_and_ordering() {
        let report = sample();
        assert_eq!(
            report.counts,
            OutcomeCounts {
                created: 1,
                updated: 0,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(report.counts.total(), 3);
        assert_eq!(report.results[0].path, PathBuf::from("dashboards/db.json"));
        assert!(report.has_failures());
        assert_eq!(report.failed_with(ErrorKind::Auth), 1);

        let by_kind = report.counts_by_kind();
        assert_eq!(by_kind["zabbix-template"].created, 1);
        assert_eq!(by_kind["zabbix-template"].failed, 1);
        assert_eq!(by_kind["grafana-dashboard"].skipped, 1);
    }

    #[test]
    fn summary_lists_failure_path_and_reason() {
        let summary = sample().format_summary();
        assert!(summary.starts_with("Sync complete: 1 created, 0 updated, 1 skipped, 1 failed"));
        assert!(summary.contains("templates/bad.xml [zabbix-template] (auth): authentication failed: login rejected"));
    }

    #[test]
    fn json_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["counts"]["failed"], 1);
        let results = json["results"].as_array().unwrap();
        assert_eq!(results[0]["outcome"], "skipped");
        assert_eq!(results[0]["detail"], "category-excluded");
        assert_eq!(results[1]["outcome"], "failed");
        assert_eq!(results[1]["detail"]["kind"], "auth");
        assert_eq!(results[1]["kind"], "zabbix_template");
        assert_eq!(results[2]["outcome"], "created");
    }

    #[test]
    fn empty_report_has_no_failures() {
        let report = SyncReport::default();
        assert!(!report.has_failures());
        assert_eq!(report.format_summary().lines().count(), 1);
    }
}
