//! Shared test utilities for monsync crates.
//!
//! This crate provides repository fixtures and sample artifacts used across
//! multiple crates in the monsync workspace.

use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = monsync_test_utils::set_env_var("MONSYNC_DOC_VAR", Some("value"));
/// assert_eq!(std::env::var("MONSYNC_DOC_VAR").unwrap(), "value");
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// Zabbix XML export of a single template.
///
/// `category` becomes a `category` tag on the template.
pub fn template_xml(key: &str, category: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<zabbix_export>
    <version>6.0</version>
    <templates>
        <template>
            <template>{key}</template>
            <name>{key}</name>
            <groups>
                <group>
                    <name>Templates</name>
                </group>
            </groups>
            <tags>
                <tag>
                    <tag>category</tag>
                    <value>{category}</value>
                </tag>
            </tags>
        </template>
    </templates>
</zabbix_export>
"#
    )
}

/// Zabbix JSON export of a single template.
pub fn template_json(key: &str, category: &str) -> String {
    format!(
        r#"{{"zabbix_export": {{"version": "6.0", "templates": [{{"template": "{key}", "name": "{key}", "groups": [{{"name": "Templates"}}], "tags": [{{"tag": "category", "value": "{category}"}}]}}]}}}}"#
    )
}

/// Grafana dashboard model tagged with `category`.
pub fn dashboard_json(uid: &str, title: &str, category: &str) -> String {
    format!(
        r#"{{"uid": "{uid}", "title": "{title}", "tags": ["{category}"], "schemaVersion": 39, "panels": []}}"#
    )
}

/// Shell script with a category header comment.
pub fn script_body(category: &str) -> String {
    format!("#!/bin/sh\n# category: {category}\necho ok\n")
}

/// Temporary artifact repository laid out by directory convention.
///
/// The tempdir is automatically cleaned up when this struct is dropped.
pub struct RepoFixture {
    pub tempdir: tempfile::TempDir,
}

impl RepoFixture {
    /// Create an empty repository fixture.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            tempdir: tempfile::tempdir()?,
        })
    }

    /// Root of the repository.
    pub fn root(&self) -> &Path {
        self.tempdir.path()
    }

    /// Write a file below the repository root, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> std::io::Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Write `templates/<category>/<file>` as an XML template export.
    pub fn add_template(&self, category: &str, file: &str, key: &str) -> std::io::Result<PathBuf> {
        self.write(
            &format!("templates/{category}/{file}"),
            &template_xml(key, category),
        )
    }

    /// Write `dashboards/<category>/<file>` as a dashboard model.
    pub fn add_dashboard(
        &self,
        category: &str,
        file: &str,
        uid: &str,
    ) -> std::io::Result<PathBuf> {
        self.write(
            &format!("dashboards/{category}/{file}"),
            &dashboard_json(uid, uid, category),
        )
    }

    /// Write `scripts/<category>/<file>` as a shell script.
    pub fn add_script(&self, category: &str, file: &str) -> std::io::Result<PathBuf> {
        self.write(&format!("scripts/{category}/{file}"), &script_body(category))
    }
}
