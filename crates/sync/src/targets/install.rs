//! Installation of script bodies into the Zabbix external scripts directory.

use crate::error::ClientError;
use monsync_discovery::{ArtifactFormat, CanonicalArtifact, Payload};
use std::fs;
use std::path::{Path, PathBuf};

/// Copies script artifacts into a directory and marks them executable.
#[derive(Debug, Clone)]
pub struct ScriptInstaller {
    dir: PathBuf,
}

impl ScriptInstaller {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the script body, overwriting any previous copy.
    ///
    /// Returns `Ok(None)` for artifacts that are not plain script bodies.
    pub fn install(&self, artifact: &CanonicalArtifact) -> Result<Option<PathBuf>, ClientError> {
        if artifact.format != ArtifactFormat::Script {
            return Ok(None);
        }
        let Payload::Object(params) = &artifact.payload else {
            return Ok(None);
        };
        let Some(body) = params.get("command").and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        // key is a bare file name for script bodies; refuse anything else
        let bare = Path::new(&artifact.key).file_name().and_then(|n| n.to_str());
        if bare != Some(artifact.key.as_str()) {
            return Err(ClientError::Io(format!(
                "refusing to install script with path-like name '{}'",
                artifact.key
            )));
        }

        let io = |e: std::io::Error, what: &Path| {
            ClientError::Io(format!("{}: {e}", what.display()))
        };
        fs::create_dir_all(&self.dir).map_err(|e| io(e, &self.dir))?;
        let target = self.dir.join(&artifact.key);
        fs::write(&target, body).map_err(|e| io(e, &target))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(0o755))
                .map_err(|e| io(e, &target))?;
        }

        tracing::debug!(
            target: "monsync::sync",
            path = %target.display(),
            "Installed external script"
        );
        Ok(Some(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monsync_discovery::TargetKind;
    use serde_json::{json, Map, Value};
    use tempfile::tempdir;

    fn script(key: &str, format: ArtifactFormat, params: Value) -> CanonicalArtifact {
        let Value::Object(map) = params else {
            panic!("params must be an object")
        };
        CanonicalArtifact {
            kind: TargetKind::ZabbixScript,
            format,
            name: key.into(),
            key: key.into(),
            categories: vec![],
            payload: Payload::Object(map),
            source_path: PathBuf::from(format!("scripts/{key}")),
        }
    }

    #[test]
    fn installs_executable_copy() {
        let tmp = tempdir().unwrap();
        let installer = ScriptInstaller::new(tmp.path().join("externalscripts"));
        let artifact = script(
            "check.sh",
            ArtifactFormat::Script,
            json!({"command": "#!/bin/sh\necho ok\n"}),
        );

        let path = installer.install(&artifact).unwrap().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/sh\necho ok\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn overwrites_previous_copy() {
        let tmp = tempdir().unwrap();
        let installer = ScriptInstaller::new(tmp.path());
        installer
            .install(&script("a.sh", ArtifactFormat::Script, json!({"command": "old"})))
            .unwrap();
        let path = installer
            .install(&script("a.sh", ArtifactFormat::Script, json!({"command": "new"})))
            .unwrap()
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "new");
    }

    #[test]
    fn descriptors_are_not_installed() {
        let tmp = tempdir().unwrap();
        let installer = ScriptInstaller::new(tmp.path());
        let artifact = script(
            "Ping host",
            ArtifactFormat::Yaml,
            json!({"name": "Ping host", "command": "ping {HOST.CONN}"}),
        );
        assert!(installer.install(&artifact).unwrap().is_none());
        assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[test]
    fn path_like_names_are_rejected() {
        let tmp = tempdir().unwrap();
        let installer = ScriptInstaller::new(tmp.path());
        let mut params = Map::new();
        params.insert("command".into(), Value::String("x".into()));
        let artifact = script("../escape.sh", ArtifactFormat::Script, Value::Object(params));
        assert!(matches!(installer.install(&artifact), Err(ClientError::Io(_))));
    }
}
