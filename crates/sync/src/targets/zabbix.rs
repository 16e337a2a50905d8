//! Zabbix JSON-RPC client for templates and scripts.

use crate::error::ClientError;
use crate::targets::install::ScriptInstaller;
use crate::targets::traits::{ApplyOutcome, ArtifactTarget};
use anyhow::Context;
use async_trait::async_trait;
use monsync_discovery::{CanonicalArtifact, Payload, TargetKind, TargetSystem};
use monsync_state::{ZabbixAuth, ZabbixSettings};
use parking_lot::RwLock;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const API_PATH: &str = "api_jsonrpc.php";

/// Sections of a template export covered by `configuration.import`.
const IMPORT_SECTIONS: &[&str] = &[
    "templates",
    "items",
    "triggers",
    "discoveryRules",
    "graphs",
    "valueMaps",
    "httptests",
];

/// Error texts Zabbix uses for an expired or revoked session, lowercased.
const SESSION_EXPIRED_MARKERS: &[&str] = &[
    "session terminated",
    "re-login",
    "not authorized",
    "not authorised",
];

/// Defaults for `script.create`: a script run on the server from the host menu.
const SCRIPT_DEFAULTS: &[(&str, i64)] = &[("type", 0), ("scope", 2), ("execute_on", 2)];

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcError {
    fn detail(&self) -> String {
        let data = match &self.data {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        if data.is_empty() {
            format!("{} (code {})", self.message, self.code)
        } else {
            format!("{} {} (code {})", self.message, data, self.code)
        }
    }

    fn is_session_expired(&self) -> bool {
        let detail = self.detail().to_lowercase();
        SESSION_EXPIRED_MARKERS.iter().any(|m| detail.contains(m))
    }
}

enum CallError {
    Rpc(RpcError),
    Client(ClientError),
}

impl CallError {
    fn into_client_error(self, method: &str) -> ClientError {
        match self {
            CallError::Rpc(err) if err.is_session_expired() => {
                ClientError::Auth(format!("{method}: {}", err.detail()))
            }
            CallError::Rpc(err) => ClientError::Api(format!("{method}: {}", err.detail())),
            CallError::Client(err) => err,
        }
    }
}

/// JSON-RPC session against one Zabbix server.
///
/// The session token is shared by all concurrent calls. It is replaced only
/// when Zabbix reports the session as expired, in which case the client logs
/// in again once and retries the failed call once.
pub struct ZabbixClient {
    endpoint: Url,
    auth: ZabbixAuth,
    client: reqwest::Client,
    timeout: Duration,
    session: RwLock<Option<String>>,
    login_gate: tokio::sync::Mutex<()>,
    next_id: AtomicU64,
    installer: Option<ScriptInstaller>,
}

impl ZabbixClient {
    pub fn new(settings: &ZabbixSettings, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        let session = match &settings.auth {
            ZabbixAuth::Token(token) => Some(token.clone()),
            ZabbixAuth::Password { .. } => None,
        };
        Ok(Self {
            endpoint: api_endpoint(&settings.url),
            auth: settings.auth.clone(),
            client,
            timeout,
            session: RwLock::new(session),
            login_gate: tokio::sync::Mutex::new(()),
            next_id: AtomicU64::new(1),
            installer: settings
                .externalscripts_dir
                .as_ref()
                .map(ScriptInstaller::new),
        })
    }

    /// The JSON-RPC endpoint in use.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Looks up the identifier of the object named `key`.
    pub async fn find_existing(
        &self,
        kind: TargetKind,
        key: &str,
    ) -> Result<Option<String>, ClientError> {
        let (method, id_field, filter_field) = match kind {
            TargetKind::ZabbixTemplate => ("template.get", "templateid", "host"),
            TargetKind::ZabbixScript => ("script.get", "scriptid", "name"),
            TargetKind::GrafanaDashboard => {
                return Err(ClientError::Api(format!("{kind} is not a Zabbix object")))
            }
        };
        let result = self
            .call(
                method,
                json!({
                    "output": [id_field],
                    "filter": { filter_field: [key] },
                }),
            )
            .await?;

        let found = result
            .as_array()
            .and_then(|items| items.first())
            .and_then(|item| item.get(id_field))
            .map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        Ok(found)
    }

    /// Imports a template export, creating or updating by template name.
    pub async fn apply_template(
        &self,
        artifact: &CanonicalArtifact,
    ) -> Result<ApplyOutcome, ClientError> {
        let Payload::Document(source) = &artifact.payload else {
            return Err(ClientError::Api(format!(
                "template {} has no document payload",
                artifact.key
            )));
        };
        let existing = self
            .find_existing(TargetKind::ZabbixTemplate, &artifact.key)
            .await?;
        let update = existing.is_some();

        self.call(
            "configuration.import",
            json!({
                "format": artifact.format.label(),
                "rules": import_rules(update),
                "source": source,
            }),
        )
        .await?;

        Ok(if update {
            ApplyOutcome::Updated
        } else {
            ApplyOutcome::Created
        })
    }

    /// Registers a script, updating it in place when one with the same name exists.
    ///
    /// Script bodies are also installed into the external scripts directory
    /// when one is configured.
    pub async fn apply_script(
        &self,
        artifact: &CanonicalArtifact,
    ) -> Result<ApplyOutcome, ClientError> {
        let Payload::Object(params) = &artifact.payload else {
            return Err(ClientError::Api(format!(
                "script {} has no parameter payload",
                artifact.key
            )));
        };
        if let Some(installer) = &self.installer {
            installer.install(artifact)?;
        }

        let existing = self
            .find_existing(TargetKind::ZabbixScript, &artifact.key)
            .await?;

        let mut params: Map<String, Value> = params.clone();
        params.insert("name".into(), Value::String(artifact.key.clone()));
        for (field, value) in SCRIPT_DEFAULTS {
            params
                .entry(field.to_string())
                .or_insert_with(|| Value::from(*value));
        }

        match existing {
            Some(id) => {
                params.insert("scriptid".into(), Value::String(id));
                self.call("script.update", Value::Object(params)).await?;
                Ok(ApplyOutcome::Updated)
            }
            None => {
                self.call("script.create", Value::Object(params)).await?;
                Ok(ApplyOutcome::Created)
            }
        }
    }

    async fn session_token(&self) -> Result<String, ClientError> {
        let current = self.session.read().clone();
        match current {
            Some(token) => Ok(token),
            None => self.login(None).await,
        }
    }

    /// Logs in unless another task already replaced the `stale` token.
    async fn login(&self, stale: Option<&str>) -> Result<String, ClientError> {
        let _gate = self.login_gate.lock().await;
        let current = self.session.read().clone();
        if let Some(current) = current {
            if stale != Some(current.as_str()) {
                return Ok(current);
            }
        }

        let (username, password) = match &self.auth {
            ZabbixAuth::Password { username, password } => (username, password),
            ZabbixAuth::Token(_) => {
                return Err(ClientError::Auth(
                    "API token was rejected by Zabbix".into(),
                ))
            }
        };

        let result = self
            .send(
                "user.login",
                &json!({ "username": username, "password": password }),
                None,
            )
            .await
            .map_err(|err| match err {
                CallError::Rpc(rpc) => ClientError::Auth(rpc.detail()),
                CallError::Client(ClientError::Auth(msg)) => ClientError::Auth(msg),
                CallError::Client(other) => {
                    ClientError::Auth(format!("cannot reach Zabbix: {other}"))
                }
            })?;
        let token = result
            .as_str()
            .ok_or_else(|| ClientError::Auth("user.login returned no session token".into()))?
            .to_string();

        *self.session.write() = Some(token.clone());
        tracing::debug!(
            target: "monsync::sync",
            endpoint = %self.endpoint,
            user = %username,
            "Zabbix login succeeded"
        );
        Ok(token)
    }

    /// Authenticated call with a single re-login on session expiry.
    async fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let token = self.session_token().await?;
        match self.send(method, &params, Some(&token)).await {
            Ok(value) => Ok(value),
            Err(CallError::Rpc(err)) if err.is_session_expired() => {
                tracing::info!(
                    target: "monsync::sync",
                    method,
                    "Zabbix session expired; logging in again"
                );
                let fresh = self.login(Some(&token)).await?;
                self.send(method, &params, Some(&fresh))
                    .await
                    .map_err(|e| e.into_client_error(method))
            }
            Err(err) => Err(err.into_client_error(method)),
        }
    }

    async fn send(
        &self,
        method: &str,
        params: &Value,
        token: Option<&str>,
    ) -> Result<Value, CallError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        tracing::trace!(target: "monsync::sync", method, id, "Zabbix call");

        let transport = |e: reqwest::Error| CallError::Client(ClientError::from_reqwest(e, self.timeout));
        let resp = request.send().await.map_err(transport)?;
        let status = resp.status();
        let text = resp.text().await.map_err(transport)?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CallError::Client(ClientError::Auth(format!(
                "{method} returned HTTP {status}"
            ))));
        }
        if !status.is_success() {
            return Err(CallError::Client(ClientError::Api(format!(
                "{method} returned HTTP {status}: {}",
                snippet(&text)
            ))));
        }

        let parsed: RpcResponse = serde_json::from_str(&text).map_err(|e| {
            CallError::Client(ClientError::Api(format!(
                "{method}: invalid JSON-RPC response: {e}"
            )))
        })?;
        if let Some(err) = parsed.error {
            return Err(CallError::Rpc(err));
        }
        parsed.result.ok_or_else(|| {
            CallError::Client(ClientError::Api(format!("{method}: response has no result")))
        })
    }
}

#[async_trait]
impl ArtifactTarget for ZabbixClient {
    fn system(&self) -> TargetSystem {
        TargetSystem::Zabbix
    }

    /// Logs in with `user.login`; a static API token needs no call.
    async fn authenticate(&self) -> Result<(), ClientError> {
        self.session_token().await.map(|_| ())
    }

    async fn apply(&self, artifact: &CanonicalArtifact) -> Result<ApplyOutcome, ClientError> {
        match artifact.kind {
            TargetKind::ZabbixTemplate => self.apply_template(artifact).await,
            TargetKind::ZabbixScript => self.apply_script(artifact).await,
            TargetKind::GrafanaDashboard => Err(ClientError::Api(format!(
                "{} is not a Zabbix artifact",
                artifact.kind
            ))),
        }
    }
}

/// Appends `api_jsonrpc.php` unless the URL already names a PHP endpoint.
fn api_endpoint(url: &Url) -> Url {
    if url.path().ends_with(".php") {
        return url.clone();
    }
    let mut endpoint = url.clone();
    let path = format!("{}/{API_PATH}", url.path().trim_end_matches('/'));
    endpoint.set_path(&path);
    endpoint
}

fn import_rules(update_existing: bool) -> Value {
    let rules: Map<String, Value> = IMPORT_SECTIONS
        .iter()
        .map(|section| {
            (
                section.to_string(),
                json!({ "createMissing": true, "updateExisting": update_existing }),
            )
        })
        .collect();
    Value::Object(rules)
}

fn snippet(text: &str) -> &str {
    const MAX: usize = 200;
    if text.len() <= MAX {
        return text;
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use monsync_discovery::ArtifactFormat;
    use std::path::PathBuf;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn rpc_ok(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "result": result, "id": 1}))
    }

    fn rpc_err(message: &str, data: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32602, "message": message, "data": data},
            "id": 1
        }))
    }

    fn rpc(name: &str) -> MockBuilder {
        Mock::given(method("POST"))
            .and(path("/api_jsonrpc.php"))
            .and(body_partial_json(json!({"method": name})))
    }

    fn client(server: &MockServer) -> ZabbixClient {
        let settings = ZabbixSettings::with_password(&server.uri(), "Admin", "zabbix").unwrap();
        ZabbixClient::new(&settings, TIMEOUT).unwrap()
    }

    fn template(key: &str) -> CanonicalArtifact {
        CanonicalArtifact {
            kind: TargetKind::ZabbixTemplate,
            format: ArtifactFormat::Xml,
            name: key.into(),
            key: key.into(),
            categories: vec!["Websites".into()],
            payload: Payload::Document("<zabbix_export/>".into()),
            source_path: PathBuf::from("templates/web.xml"),
        }
    }

    fn script(key: &str, body: &str) -> CanonicalArtifact {
        let mut params = Map::new();
        params.insert("command".into(), Value::String(body.into()));
        CanonicalArtifact {
            kind: TargetKind::ZabbixScript,
            format: ArtifactFormat::Script,
            name: key.into(),
            key: key.into(),
            categories: vec![],
            payload: Payload::Object(params),
            source_path: PathBuf::from(format!("scripts/{key}")),
        }
    }

    #[test]
    fn endpoint_gets_api_path_appended() {
        let base = Url::parse("http://zbx.local/zabbix/").unwrap();
        assert_eq!(
            api_endpoint(&base).as_str(),
            "http://zbx.local/zabbix/api_jsonrpc.php"
        );
        let full = Url::parse("http://zbx.local/api_jsonrpc.php").unwrap();
        assert_eq!(api_endpoint(&full), full);
    }

    #[test]
    fn session_expiry_detection() {
        let expired = RpcError {
            code: -32602,
            message: "Invalid params.".into(),
            data: Some(json!("Session terminated, re-login, please.")),
        };
        assert!(expired.is_session_expired());
        let other = RpcError {
            code: -32500,
            message: "Application error.".into(),
            data: Some(json!("No permissions to referred object")),
        };
        assert!(!other.is_session_expired());
    }

    #[test]
    fn session_expiry_detection_ignores_case_and_spelling() {
        for data in [
            "Not authorised.",
            "not authorized.",
            "SESSION TERMINATED, RE-LOGIN, PLEASE.",
        ] {
            let err = RpcError {
                code: -32602,
                message: "Invalid params.".into(),
                data: Some(json!(data)),
            };
            assert!(err.is_session_expired(), "{data}");
        }
    }

    #[tokio::test]
    async fn creates_missing_template() {
        let server = MockServer::start().await;
        rpc("user.login")
            .and(body_partial_json(json!({"params": {"username": "Admin", "password": "zabbix"}})))
            .respond_with(rpc_ok(json!("tok")))
            .expect(1)
            .mount(&server)
            .await;
        rpc("template.get")
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(json!({"params": {"filter": {"host": ["Web"]}}})))
            .respond_with(rpc_ok(json!([])))
            .mount(&server)
            .await;
        rpc("configuration.import")
            .and(body_partial_json(json!({"params": {
                "format": "xml",
                "rules": {"templates": {"createMissing": true, "updateExisting": false}}
            }})))
            .respond_with(rpc_ok(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let zabbix = client(&server);
        zabbix.authenticate().await.unwrap();
        let outcome = zabbix.apply(&template("Web")).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Created);
    }

    #[tokio::test]
    async fn updates_existing_template() {
        let server = MockServer::start().await;
        rpc("user.login").respond_with(rpc_ok(json!("tok"))).mount(&server).await;
        rpc("template.get")
            .respond_with(rpc_ok(json!([{"templateid": "10001"}])))
            .mount(&server)
            .await;
        rpc("configuration.import")
            .and(body_partial_json(json!({"params": {
                "rules": {"httptests": {"createMissing": true, "updateExisting": true}}
            }})))
            .respond_with(rpc_ok(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let zabbix = client(&server);
        assert_eq!(
            zabbix.find_existing(TargetKind::ZabbixTemplate, "Web").await.unwrap(),
            Some("10001".to_string())
        );
        assert_eq!(
            zabbix.apply(&template("Web")).await.unwrap(),
            ApplyOutcome::Updated
        );
    }

    #[tokio::test]
    async fn http_401_on_login_is_auth_error() {
        let server = MockServer::start().await;
        rpc("user.login")
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).authenticate().await.unwrap_err();
        assert!(err.is_auth(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn rejected_credentials_are_auth_error() {
        let server = MockServer::start().await;
        rpc("user.login")
            .respond_with(rpc_err("Application error.", "Incorrect user name or password or account is temporarily blocked."))
            .mount(&server)
            .await;

        let err = client(&server).authenticate().await.unwrap_err();
        match err {
            ClientError::Auth(msg) => assert!(msg.contains("Incorrect user name")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_auth_error_on_login() {
        let settings =
            ZabbixSettings::with_password("http://127.0.0.1:9/", "Admin", "zabbix").unwrap();
        let zabbix = ZabbixClient::new(&settings, TIMEOUT).unwrap();
        let err = zabbix.authenticate().await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn expired_session_relogs_once_and_retries() {
        let server = MockServer::start().await;
        rpc("user.login")
            .respond_with(rpc_ok(json!("tok1")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        rpc("user.login")
            .respond_with(rpc_ok(json!("tok2")))
            .expect(1)
            .mount(&server)
            .await;
        rpc("template.get")
            .and(header("authorization", "Bearer tok1"))
            .respond_with(rpc_err("Invalid params.", "Session terminated, re-login, please."))
            .mount(&server)
            .await;
        rpc("template.get")
            .and(header("authorization", "Bearer tok2"))
            .respond_with(rpc_ok(json!([])))
            .mount(&server)
            .await;
        rpc("configuration.import")
            .and(header("authorization", "Bearer tok2"))
            .respond_with(rpc_ok(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server).apply(&template("Web")).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Created);
    }

    #[tokio::test]
    async fn second_expiry_is_auth_error() {
        let server = MockServer::start().await;
        rpc("user.login")
            .respond_with(rpc_ok(json!("tok")))
            .mount(&server)
            .await;
        // the retry after re-login is rejected too
        rpc("template.get")
            .respond_with(rpc_err("Invalid params.", "Session terminated, re-login, please."))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server).apply(&template("Web")).await.unwrap_err();
        assert!(err.is_auth(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn static_token_skips_login() {
        let server = MockServer::start().await;
        rpc("user.login")
            .respond_with(rpc_ok(json!("never")))
            .expect(0)
            .mount(&server)
            .await;
        rpc("script.get")
            .and(header("authorization", "Bearer static"))
            .respond_with(rpc_ok(json!([])))
            .mount(&server)
            .await;
        rpc("script.create")
            .and(header("authorization", "Bearer static"))
            .and(body_partial_json(json!({"params": {
                "name": "check.sh",
                "command": "echo ok",
                "type": 0,
                "scope": 2,
                "execute_on": 2
            }})))
            .respond_with(rpc_ok(json!({"scriptids": ["7"]})))
            .expect(1)
            .mount(&server)
            .await;

        let settings = ZabbixSettings::with_token(&server.uri(), "static").unwrap();
        let zabbix = ZabbixClient::new(&settings, TIMEOUT).unwrap();
        zabbix.authenticate().await.unwrap();
        assert_eq!(
            zabbix.apply(&script("check.sh", "echo ok")).await.unwrap(),
            ApplyOutcome::Created
        );
    }

    #[tokio::test]
    async fn existing_script_is_updated_and_installed() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();
        rpc("user.login").respond_with(rpc_ok(json!("tok"))).mount(&server).await;
        rpc("script.get")
            .and(body_partial_json(json!({"params": {"filter": {"name": ["check.sh"]}}})))
            .respond_with(rpc_ok(json!([{"scriptid": "42"}])))
            .mount(&server)
            .await;
        rpc("script.update")
            .and(body_partial_json(json!({"params": {"scriptid": "42", "name": "check.sh"}})))
            .respond_with(rpc_ok(json!({"scriptids": ["42"]})))
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = ZabbixSettings::with_password(&server.uri(), "Admin", "zabbix").unwrap();
        settings.externalscripts_dir = Some(tmp.path().to_path_buf());
        let zabbix = ZabbixClient::new(&settings, TIMEOUT).unwrap();

        let outcome = zabbix.apply(&script("check.sh", "echo ok\n")).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Updated);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("check.sh")).unwrap(),
            "echo ok\n"
        );
    }

    #[tokio::test]
    async fn import_failure_is_api_error() {
        let server = MockServer::start().await;
        rpc("user.login").respond_with(rpc_ok(json!("tok"))).mount(&server).await;
        rpc("template.get").respond_with(rpc_ok(json!([]))).mount(&server).await;
        rpc("configuration.import")
            .respond_with(rpc_err("Invalid params.", "Invalid tag \"/zabbix_export\": unexpected tag \"x\"."))
            .mount(&server)
            .await;

        let err = client(&server).apply(&template("Web")).await.unwrap_err();
        match err {
            ClientError::Api(msg) => {
                assert!(msg.starts_with("configuration.import"));
                assert!(msg.contains("unexpected tag"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        rpc("user.login").respond_with(rpc_ok(json!("tok"))).mount(&server).await;
        rpc("template.get")
            .respond_with(rpc_ok(json!([])).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let settings = ZabbixSettings::with_password(&server.uri(), "Admin", "zabbix").unwrap();
        let zabbix = ZabbixClient::new(&settings, Duration::from_millis(200)).unwrap();
        let err = zabbix.apply(&template("Web")).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn dashboard_is_rejected_without_calls() {
        let server = MockServer::start().await;
        let zabbix = client(&server);
        let mut artifact = template("db");
        artifact.kind = TargetKind::GrafanaDashboard;
        assert!(matches!(
            zabbix.apply(&artifact).await,
            Err(ClientError::Api(_))
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
