//! Synchronization engine for monitoring artifacts.
//!
//! Applies Zabbix templates, Zabbix scripts and Grafana dashboards stored in a
//! repository to their target systems. A run discovers files, classifies and
//! decodes them, keeps those in the selected categories, and applies them
//! through one [`ArtifactTarget`] per system. Every file ends up in the
//! [`SyncReport`] with exactly one outcome.
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use monsync_discovery::{CanonicalArtifact, TargetSystem};
//! use monsync_state::SyncConfig;
//! use monsync_sync::{ApplyOutcome, ArtifactTarget, ClientError, SyncOrchestrator};
//! use std::sync::Arc;
//!
//! struct AcceptAll;
//!
//! #[async_trait]
//! impl ArtifactTarget for AcceptAll {
//!     fn system(&self) -> TargetSystem {
//!         TargetSystem::Grafana
//!     }
//!
//!     async fn authenticate(&self) -> Result<(), ClientError> {
//!         Ok(())
//!     }
//!
//!     async fn apply(&self, _artifact: &CanonicalArtifact) -> Result<ApplyOutcome, ClientError> {
//!         Ok(ApplyOutcome::Created)
//!     }
//! }
//!
//! let repo = tempfile::tempdir().unwrap();
//! let dir = repo.path().join("dashboards").join("Infra");
//! std::fs::create_dir_all(&dir).unwrap();
//! std::fs::write(dir.join("hosts.json"), r#"{"uid": "hosts", "title": "Hosts"}"#).unwrap();
//!
//! let config = SyncConfig::new(repo.path()).with_categories(["Infra"]);
//! let orchestrator = SyncOrchestrator::new(config).with_target(Arc::new(AcceptAll));
//! let report = tokio::runtime::Runtime::new()
//!     .unwrap()
//!     .block_on(orchestrator.run());
//! assert_eq!(report.counts.created, 1);
//! assert!(!report.has_failures());
//! ```

#![deny(unsafe_code)]

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod report;
pub mod targets;

pub use error::{ClientError, ErrorKind, SyncError};
pub use filter::{CategoryFilter, WILDCARD};
pub use orchestrator::{SyncOrchestrator, SyncPlan};
pub use report::{OutcomeCounts, SkipReason, SyncOutcome, SyncReport, SyncResult};
pub use targets::{
    dashboard_uid, ApplyOutcome, ArtifactTarget, GrafanaClient, ScriptInstaller, ZabbixClient,
};
