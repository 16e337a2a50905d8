//! Trait definition for target systems.

use crate::error::ClientError;
use async_trait::async_trait;
use monsync_discovery::{CanonicalArtifact, TargetSystem};
use serde::Serialize;

/// What an apply call did on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyOutcome {
    Created,
    Updated,
}

#[cfg(test)]
use mockall::automock;

/// A system that receives artifacts.
///
/// Implementations look up the artifact's key and then either create a new
/// object or overwrite the existing one, so applying the same artifact twice
/// yields `Created` followed by `Updated`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ArtifactTarget: Send + Sync {
    /// The system this target writes to.
    fn system(&self) -> TargetSystem;

    /// Establishes credentials before the first apply.
    async fn authenticate(&self) -> Result<(), ClientError>;

    /// Creates or overwrites the object identified by `artifact.key`.
    async fn apply(&self, artifact: &CanonicalArtifact) -> Result<ApplyOutcome, ClientError>;
}
