//! Discovery, classification and decoding of monitoring artifacts.
//!
//! This crate provides mechanisms for:
//! - Scanning a repository for Zabbix templates, Zabbix scripts and Grafana dashboards.
//! - Classifying each file into a target kind and serialization format.
//! - Decoding XML, JSON, YAML and script files into one canonical representation.
//!
//! # Examples
//!
//! ```
//! use monsync_discovery::{classify, decode, discover_artifacts, ArtifactRoot, TargetKind};
//! use tempfile::tempdir;
//!
//! let temp = tempdir().unwrap();
//! let dir = temp.path().join("dashboards/Databases");
//! std::fs::create_dir_all(&dir).unwrap();
//! std::fs::write(dir.join("mysql.json"), r#"{"uid": "mysql", "title": "MySQL", "panels": []}"#).unwrap();
//!
//! let found = discover_artifacts(&[ArtifactRoot::repository(temp.path())]);
//! assert_eq!(found.sources.len(), 1);
//!
//! let source = &found.sources[0];
//! let classification = classify(source).unwrap();
//! assert_eq!(classification.kind, TargetKind::GrafanaDashboard);
//!
//! let artifact = decode(source, &classification).unwrap();
//! assert_eq!(artifact.key, "mysql");
//! assert!(artifact.has_category("databases"));
//! ```

#![deny(unsafe_code)]

/// Error type for discovery operations.
pub type Error = anyhow::Error;
/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification by path convention and content sniffing.
pub mod classify;
/// Decoding into canonical artifacts.
pub mod decode;
/// Classification and decoding errors.
pub mod error;
/// Repository scanning.
pub mod scanner;
/// Artifact types shared across the workspace.
pub mod types;

pub use classify::{classify, sniff_format};
pub use decode::decode;
pub use error::{ClassifyError, DecodeError};
pub use scanner::{artifact_roots, discover_artifacts, is_hidden_component, is_ignored_file};
pub use types::{
    parse_comma_list, ArtifactFormat, ArtifactRoot, ArtifactSource, CanonicalArtifact,
    Classification, Confidence, Discovery, DiscoveryIssue, Payload, TargetKind, TargetSystem,
};
