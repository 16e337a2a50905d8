//! Grafana HTTP API client for dashboards.

use crate::error::ClientError;
use crate::targets::traits::{ApplyOutcome, ArtifactTarget};
use anyhow::Context;
use async_trait::async_trait;
use monsync_discovery::{CanonicalArtifact, Payload, TargetKind, TargetSystem};
use monsync_state::GrafanaSettings;
use reqwest::{StatusCode, Url};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Longest UID Grafana accepts.
const MAX_UID_LEN: usize = 40;

/// Derives the dashboard UID from an identifying key.
///
/// Keys that are already valid UIDs are used as-is; anything else maps to a
/// stable hash so the same key always addresses the same dashboard.
///
/// ```
/// use monsync_sync::dashboard_uid;
///
/// assert_eq!(dashboard_uid("db-overview"), "db-overview");
/// let derived = dashboard_uid("Databases / Overview");
/// assert_eq!(derived.len(), 40);
/// assert_eq!(derived, dashboard_uid("Databases / Overview"));
/// ```
pub fn dashboard_uid(key: &str) -> String {
    let valid = !key.is_empty()
        && key.len() <= MAX_UID_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        return key.to_string();
    }
    let digest = Sha256::digest(key.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(MAX_UID_LEN);
    hex
}

/// Grafana client authenticated with a bearer API key on every request.
pub struct GrafanaClient {
    base: Url,
    api_key: String,
    folder_uid: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl GrafanaClient {
    pub fn new(settings: &GrafanaSettings, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base: settings.url.clone(),
            api_key: settings.api_key.clone(),
            folder_uid: settings.folder_uid.clone(),
            client,
            timeout,
        })
    }

    fn api_url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        let full = format!("{}/{path}", self.base.path().trim_end_matches('/'));
        url.set_path(&full);
        url
    }

    /// Fetches the dashboard stored under `uid`, if any.
    pub async fn lookup(&self, uid: &str) -> Result<Option<Value>, ClientError> {
        let resp = self
            .client
            .get(self.api_url(&format!("api/dashboards/uid/{uid}")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = resp
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout))?;
        check_status(status, "dashboard lookup", &text)?;

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ClientError::Api(format!("dashboard lookup: invalid JSON: {e}")))
    }

    /// Creates the dashboard, or overwrites the one with the same UID.
    ///
    /// The save always overwrites; the lookup only decides whether the result
    /// is reported as created or updated.
    pub async fn apply_dashboard(
        &self,
        artifact: &CanonicalArtifact,
    ) -> Result<ApplyOutcome, ClientError> {
        let Payload::Object(model) = &artifact.payload else {
            return Err(ClientError::Api(format!(
                "dashboard {} has no model payload",
                artifact.key
            )));
        };
        let uid = dashboard_uid(&artifact.key);
        let existing = self.lookup(&uid).await?;

        let mut dashboard = model.clone();
        dashboard.insert("uid".into(), Value::String(uid.clone()));
        dashboard.insert("id".into(), Value::Null);

        let mut body = json!({
            "dashboard": dashboard,
            // a title clash under another UID in the folder must not block the save
            "overwrite": true,
            "message": format!("monsync: {}", artifact.source_path.display()),
        });
        // keep an existing dashboard in its folder unless one is configured
        let folder = self.folder_uid.clone().or_else(|| {
            existing
                .as_ref()
                .and_then(|e| e.pointer("/meta/folderUid"))
                .and_then(Value::as_str)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
        });
        if let Some(folder) = folder {
            body["folderUid"] = Value::String(folder);
        }

        let resp = self
            .client
            .post(self.api_url("api/dashboards/db"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout))?;
        check_status(status, "dashboard save", &text)?;

        tracing::debug!(
            target: "monsync::sync",
            uid = %uid,
            update = existing.is_some(),
            "Saved Grafana dashboard"
        );
        Ok(if existing.is_some() {
            ApplyOutcome::Updated
        } else {
            ApplyOutcome::Created
        })
    }
}

fn check_status(status: StatusCode, what: &str, body: &str) -> Result<(), ClientError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ClientError::Auth(format!("{what} returned HTTP {status}")));
    }
    if !status.is_success() {
        return Err(ClientError::Api(format!(
            "{what} returned HTTP {status}: {}",
            body.trim()
        )));
    }
    Ok(())
}

#[async_trait]
impl ArtifactTarget for GrafanaClient {
    fn system(&self) -> TargetSystem {
        TargetSystem::Grafana
    }

    async fn authenticate(&self) -> Result<(), ClientError> {
        // API keys are sent with every request; there is no session
        Ok(())
    }

    async fn apply(&self, artifact: &CanonicalArtifact) -> Result<ApplyOutcome, ClientError> {
        match artifact.kind {
            TargetKind::GrafanaDashboard => self.apply_dashboard(artifact).await,
            other => Err(ClientError::Api(format!("{other} is not a Grafana artifact"))),
        }
    }
}
