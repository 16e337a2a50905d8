//! Sync orchestrator that drives artifacts from the repository to their targets.

use crate::error::{ClientError, SyncError};
use crate::filter::CategoryFilter;
use crate::report::{SkipReason, SyncOutcome, SyncReport, SyncResult};
use crate::targets::{ApplyOutcome, ArtifactTarget, GrafanaClient, ZabbixClient};
use crate::Result;
use futures::stream::{self, StreamExt};
use monsync_discovery::{
    artifact_roots, classify, decode, discover_artifacts, ArtifactRoot, ArtifactSource,
    CanonicalArtifact, DecodeError, TargetKind, TargetSystem,
};
use monsync_state::SyncConfig;
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Network calls one apply may need: lookup, write, and a re-login with retry.
const CALLS_PER_APPLY: u32 = 4;
/// Network calls authentication may need.
const CALLS_PER_LOGIN: u32 = 2;

/// Artifacts ready to apply, and the files already settled without a network call.
#[derive(Debug, Default)]
pub struct SyncPlan {
    /// Selected artifacts whose target is configured, in discovery order.
    pub pending: Vec<CanonicalArtifact>,
    /// Skipped and failed files.
    pub settled: Vec<SyncResult>,
}

/// A target plus the authentication failure that disabled it, if any.
struct Gate {
    target: Arc<dyn ArtifactTarget>,
    failure: OnceLock<ClientError>,
}

impl Gate {
    fn new(target: Arc<dyn ArtifactTarget>) -> Self {
        Self {
            target,
            failure: OnceLock::new(),
        }
    }

    fn poison(&self, err: &ClientError) {
        // first failure wins; later ones carry no new information
        let _ = self.failure.set(err.clone());
    }

    fn blocked(&self) -> Option<ClientError> {
        self.failure.get().map(|err| {
            ClientError::Auth(format!(
                "{} unavailable after authentication failure: {err}",
                self.target.system()
            ))
        })
    }
}

/// Runs Discover, Classify, Decode, Filter, Apply and Report over one repository.
///
/// Every stage is isolated per artifact: a failure becomes a `Failed` result and
/// the rest of the run continues. An authentication failure disables its target
/// system for the remainder of the run while the other system proceeds.
///
/// ```no_run
/// use monsync_state::SyncConfig;
/// use monsync_sync::SyncOrchestrator;
///
/// # async fn demo() -> anyhow::Result<()> {
/// let config = SyncConfig::load(None, &Default::default())?;
/// let report = SyncOrchestrator::from_config(config)?.run().await;
/// println!("{}", report.format_summary());
/// # Ok(())
/// # }
/// ```
pub struct SyncOrchestrator {
    config: SyncConfig,
    filter: CategoryFilter,
    targets: HashMap<TargetSystem, Arc<dyn ArtifactTarget>>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator without targets; add them with [`Self::with_target`].
    pub fn new(config: SyncConfig) -> Self {
        let filter = CategoryFilter::new(&config.categories);
        Self {
            config,
            filter,
            targets: HashMap::new(),
        }
    }

    /// Creates an orchestrator with clients for every system in `config`.
    pub fn from_config(config: SyncConfig) -> Result<Self> {
        let timeout = config.request_timeout;
        let zabbix = config
            .zabbix
            .as_ref()
            .map(|settings| ZabbixClient::new(settings, timeout))
            .transpose()?;
        let grafana = config
            .grafana
            .as_ref()
            .map(|settings| GrafanaClient::new(settings, timeout))
            .transpose()?;

        let mut orchestrator = Self::new(config);
        if let Some(zabbix) = zabbix {
            orchestrator = orchestrator.with_target(Arc::new(zabbix));
        }
        if let Some(grafana) = grafana {
            orchestrator = orchestrator.with_target(Arc::new(grafana));
        }
        Ok(orchestrator)
    }

    /// Registers the target for its system, replacing any previous one.
    pub fn with_target(mut self, target: Arc<dyn ArtifactTarget>) -> Self {
        self.targets.insert(target.system(), target);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Scan roots derived from the repository configuration.
    pub fn roots(&self) -> Vec<ArtifactRoot> {
        let repo = &self.config.repository;
        let dedicated: Vec<(TargetKind, PathBuf)> = [
            (TargetKind::ZabbixTemplate, &repo.templates),
            (TargetKind::ZabbixScript, &repo.scripts),
            (TargetKind::GrafanaDashboard, &repo.dashboards),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.clone().map(|p| (kind, p)))
        .collect();
        artifact_roots(repo.root.as_deref(), &dedicated)
    }

    /// Runs every offline stage: discovery, classification, decoding and filtering.
    pub fn plan(&self) -> SyncPlan {
        let discovery = discover_artifacts(&self.roots());
        let mut settled: Vec<SyncResult> = discovery
            .issues
            .into_iter()
            .map(|issue| {
                tracing::warn!(
                    target: "monsync::sync",
                    path = %issue.path.display(),
                    error = %issue.message,
                    "Cannot read file; skipping"
                );
                SyncResult {
                    path: issue.path,
                    kind: None,
                    key: None,
                    outcome: SyncOutcome::Failed(SyncError::Read(issue.message)),
                }
            })
            .collect();

        // pure stages; indexed collect keeps discovery order
        let prepared: Vec<std::result::Result<CanonicalArtifact, SyncResult>> =
            discovery.sources.par_iter().map(prepare).collect();

        let mut seen: HashMap<(TargetKind, String), PathBuf> = HashMap::new();
        let mut pending = Vec::new();
        for item in prepared {
            let artifact = match item {
                Ok(artifact) => artifact,
                Err(failed) => {
                    settled.push(failed);
                    continue;
                }
            };

            match seen.entry((artifact.kind, artifact.key.clone())) {
                Entry::Occupied(first) => {
                    let err = DecodeError::DuplicateKey {
                        path: artifact.source_path.clone(),
                        key: artifact.key.clone(),
                        first: first.get().clone(),
                    };
                    tracing::warn!(
                        target: "monsync::sync",
                        path = %artifact.source_path.display(),
                        kind = %artifact.kind,
                        error = %err,
                        "Duplicate key; skipping"
                    );
                    settled.push(settle(&artifact, SyncOutcome::Failed(err.into())));
                    continue;
                }
                Entry::Vacant(slot) => {
                    slot.insert(artifact.source_path.clone());
                }
            }

            if !self.filter.keeps(&artifact) {
                settled.push(settle(
                    &artifact,
                    SyncOutcome::Skipped(SkipReason::CategoryExcluded),
                ));
            } else if !self.targets.contains_key(&artifact.kind.system()) {
                settled.push(settle(
                    &artifact,
                    SyncOutcome::Skipped(SkipReason::TargetNotConfigured),
                ));
            } else {
                pending.push(artifact);
            }
        }

        SyncPlan { pending, settled }
    }

    fn apply_budget(&self) -> Duration {
        self.config.request_timeout.saturating_mul(CALLS_PER_APPLY)
    }

    fn login_budget(&self) -> Duration {
        self.config.request_timeout.saturating_mul(CALLS_PER_LOGIN)
    }

    /// Executes the run and returns its report.
    ///
    /// Never fails: every discovered file ends up in the report with an outcome.
    pub async fn run(&self) -> SyncReport {
        let SyncPlan {
            pending,
            mut settled,
        } = self.plan();
        tracing::info!(
            target: "monsync::sync",
            pending = pending.len(),
            settled = settled.len(),
            concurrency = self.config.concurrency,
            "Applying artifacts"
        );

        let mut gates: HashMap<TargetSystem, Gate> = HashMap::new();
        for artifact in &pending {
            let system = artifact.kind.system();
            if let (Entry::Vacant(slot), Some(target)) =
                (gates.entry(system), self.targets.get(&system))
            {
                slot.insert(Gate::new(Arc::clone(target)));
            }
        }
        futures::future::join_all(gates.values().map(|gate| self.authenticate(gate))).await;

        let applied: Vec<SyncResult> = stream::iter(pending.into_iter().filter_map(|artifact| {
            gates
                .get(&artifact.kind.system())
                .map(|gate| self.apply_one(gate, artifact))
        }))
        .buffer_unordered(self.config.concurrency.max(1))
        .collect()
        .await;
        settled.extend(applied);

        let report = SyncReport::new(settled);
        tracing::info!(
            target: "monsync::sync",
            created = report.counts.created,
            updated = report.counts.updated,
            skipped = report.counts.skipped,
            failed = report.counts.failed,
            "Sync finished"
        );
        report
    }

    async fn authenticate(&self, gate: &Gate) {
        let budget = self.login_budget();
        let result = match tokio::time::timeout(budget, gate.target.authenticate()).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Auth(format!(
                "no answer within {}s",
                budget.as_secs()
            ))),
        };
        match result {
            Ok(()) => tracing::debug!(
                target: "monsync::sync",
                system = %gate.target.system(),
                "Authenticated"
            ),
            Err(err) => {
                tracing::error!(
                    target: "monsync::sync",
                    system = %gate.target.system(),
                    error = %err,
                    "Authentication failed; skipping all artifacts for this system"
                );
                gate.poison(&err);
            }
        }
    }

    async fn apply_one(&self, gate: &Gate, artifact: CanonicalArtifact) -> SyncResult {
        let result = match gate.blocked() {
            Some(err) => Err(err),
            None => {
                let budget = self.apply_budget();
                match tokio::time::timeout(budget, gate.target.apply(&artifact)).await {
                    Ok(result) => result,
                    Err(_) => Err(ClientError::Timeout(budget)),
                }
            }
        };

        let outcome = match result {
            Ok(ApplyOutcome::Created) => SyncOutcome::Created,
            Ok(ApplyOutcome::Updated) => SyncOutcome::Updated,
            Err(err) => {
                if err.is_auth() {
                    gate.poison(&err);
                }
                tracing::warn!(
                    target: "monsync::sync",
                    path = %artifact.source_path.display(),
                    kind = %artifact.kind,
                    key = %artifact.key,
                    error = %err,
                    "Apply failed"
                );
                SyncOutcome::Failed(err.into())
            }
        };
        if !outcome.is_failure() {
            tracing::debug!(
                target: "monsync::sync",
                path = %artifact.source_path.display(),
                kind = %artifact.kind,
                key = %artifact.key,
                outcome = ?outcome,
                "Applied"
            );
        }
        settle(&artifact, outcome)
    }
}

fn prepare(source: &ArtifactSource) -> std::result::Result<CanonicalArtifact, SyncResult> {
    let failed = |kind: Option<TargetKind>, err: SyncError| {
        tracing::warn!(
            target: "monsync::sync",
            path = %source.relative_path.display(),
            kind = ?kind,
            error = %err,
            "Cannot use file; skipping"
        );
        SyncResult {
            path: source.relative_path.clone(),
            kind,
            key: None,
            outcome: SyncOutcome::Failed(err),
        }
    };
    let classification = classify(source).map_err(|e| failed(None, e.into()))?;
    decode(source, &classification).map_err(|e| failed(Some(classification.kind), e.into()))
}

fn settle(artifact: &CanonicalArtifact, outcome: SyncOutcome) -> SyncResult {
    SyncResult {
        path: artifact.source_path.clone(),
        kind: Some(artifact.kind),
        key: Some(artifact.key.clone()),
        outcome,
    }
}
