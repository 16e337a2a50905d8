use monsync_state::{ConfigOverrides, SyncConfig, ZabbixAuth};
use monsync_test_utils::{env_guard, set_env_var};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

const CONFIG: &str = r#"
categories = "Websites"
timeout_secs = 20

[repository]
root = "/srv/repo"

[zabbix]
url = "http://zabbix.local/api_jsonrpc.php"
username = "Admin"
password = "file-password"
"#;

fn clear_env() -> Vec<monsync_test_utils::EnvVarGuard> {
    [
        "MONSYNC_CONFIG",
        "MONSYNC_CATEGORIES",
        "MONSYNC_REPO",
        "MONSYNC_ZABBIX_URL",
        "MONSYNC_ZABBIX_USER",
        "MONSYNC_ZABBIX_PASSWORD",
        "MONSYNC_ZABBIX_API_TOKEN",
        "MONSYNC_GRAFANA_URL",
        "MONSYNC_GRAFANA_API_KEY",
        "MONSYNC_CONCURRENCY",
        "MONSYNC_TIMEOUT_SECS",
    ]
    .into_iter()
    .map(|key| set_env_var(key, None))
    .collect()
}

#[test]
fn env_overrides_file_and_cli_overrides_env() {
    let _g = env_guard();
    let _clean = clear_env();
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, CONFIG).unwrap();

    let _cat = set_env_var("MONSYNC_CATEGORIES", Some("Databases"));
    let _pw = set_env_var("MONSYNC_ZABBIX_PASSWORD", Some("env-password"));
    let _conc = set_env_var("MONSYNC_CONCURRENCY", Some("3"));

    let overrides = ConfigOverrides {
        concurrency: Some(6),
        ..ConfigOverrides::default()
    };
    let config = SyncConfig::load(Some(&path), &overrides).unwrap();

    assert_eq!(config.categories, vec!["Databases"]);
    assert_eq!(config.concurrency, 6);
    assert_eq!(config.request_timeout, Duration::from_secs(20));
    assert_eq!(
        config.zabbix.unwrap().auth,
        ZabbixAuth::Password {
            username: "Admin".into(),
            password: "env-password".into()
        }
    );
}

#[test]
fn explicit_missing_file_is_an_error() {
    let _g = env_guard();
    let _clean = clear_env();
    let tmp = tempdir().unwrap();
    let err = SyncConfig::load(
        Some(&tmp.path().join("absent.toml")),
        &ConfigOverrides::default(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));
}

#[test]
fn default_file_is_optional_when_env_supplies_everything() {
    let _g = env_guard();
    let _clean = clear_env();
    let tmp = tempdir().unwrap();
    let _home = set_env_var("HOME", tmp.path().to_str());
    let _repo = set_env_var("MONSYNC_REPO", Some("/srv/from-env"));
    let _url = set_env_var("MONSYNC_GRAFANA_URL", Some("http://grafana:3000"));
    let _key = set_env_var("MONSYNC_GRAFANA_API_KEY", Some("key"));

    let config = SyncConfig::load(None, &ConfigOverrides::default()).unwrap();
    assert_eq!(config.repository.root, Some(PathBuf::from("/srv/from-env")));
    assert!(config.grafana.is_some());
    assert!(config.zabbix.is_none());
    assert!(config.categories.is_empty());
}

#[test]
fn json_config_selected_by_extension() {
    let _g = env_guard();
    let _clean = clear_env();
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"category": "Infra", "repository": {"root": "/r"}, "zabbix": {"url": "http://z", "api_token": "t"}}"#,
    )
    .unwrap();

    let config = SyncConfig::load(Some(&path), &ConfigOverrides::default()).unwrap();
    assert_eq!(config.categories, vec!["Infra"]);
    assert_eq!(config.zabbix.unwrap().auth, ZabbixAuth::Token("t".into()));
}

#[test]
fn bad_env_number_fails_load() {
    let _g = env_guard();
    let _clean = clear_env();
    let _repo = set_env_var("MONSYNC_REPO", Some("/srv/repo"));
    let _timeout = set_env_var("MONSYNC_TIMEOUT_SECS", Some("soon"));
    let tmp = tempdir().unwrap();
    let _home = set_env_var("HOME", tmp.path().to_str());

    let err = SyncConfig::load(None, &ConfigOverrides::default()).unwrap_err();
    assert!(err.to_string().contains("MONSYNC_TIMEOUT_SECS"));
}
