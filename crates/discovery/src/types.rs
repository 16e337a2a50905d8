use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Destination system of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSystem {
    /// Zabbix JSON-RPC API.
    Zabbix,
    /// Grafana HTTP API.
    Grafana,
}

impl TargetSystem {
    /// Returns a stable label for this system.
    pub fn label(&self) -> &'static str {
        match self {
            TargetSystem::Zabbix => "zabbix",
            TargetSystem::Grafana => "grafana",
        }
    }
}

impl fmt::Display for TargetSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of object an artifact becomes on its target system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Zabbix template, imported with `configuration.import`.
    ZabbixTemplate,
    /// Zabbix script, registered with `script.create` / `script.update`.
    ZabbixScript,
    /// Grafana dashboard, posted to `/api/dashboards/db`.
    GrafanaDashboard,
}

impl TargetKind {
    /// Returns a stable label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            TargetKind::ZabbixTemplate => "zabbix-template",
            TargetKind::ZabbixScript => "zabbix-script",
            TargetKind::GrafanaDashboard => "grafana-dashboard",
        }
    }

    /// Returns the system that receives this kind of artifact.
    pub fn system(&self) -> TargetSystem {
        match self {
            TargetKind::ZabbixTemplate | TargetKind::ZabbixScript => TargetSystem::Zabbix,
            TargetKind::GrafanaDashboard => TargetSystem::Grafana,
        }
    }

    /// Maps a repository directory name to the kind it conventionally holds.
    ///
    /// ```
    /// use monsync_discovery::TargetKind;
    ///
    /// assert_eq!(TargetKind::from_dir_name("Templates"), Some(TargetKind::ZabbixTemplate));
    /// assert_eq!(TargetKind::from_dir_name("externalscripts"), Some(TargetKind::ZabbixScript));
    /// assert_eq!(TargetKind::from_dir_name("Websites"), None);
    /// ```
    pub fn from_dir_name(name: &str) -> Option<TargetKind> {
        match name.to_ascii_lowercase().as_str() {
            "templates" | "zabbix_templates" | "zabbix-templates" => {
                Some(TargetKind::ZabbixTemplate)
            }
            "scripts" | "externalscripts" | "zabbix_scripts" | "zabbix-scripts" => {
                Some(TargetKind::ZabbixScript)
            }
            "dashboards" | "grafana_dashboards" | "grafana-dashboards" => {
                Some(TargetKind::GrafanaDashboard)
            }
            _ => None,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Serialization format of an artifact file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// Zabbix XML export.
    Xml,
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
    /// Plain executable script body (shell, Python, ...).
    Script,
}

impl ArtifactFormat {
    /// Returns the format name understood by Zabbix `configuration.import`.
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactFormat::Xml => "xml",
            ArtifactFormat::Json => "json",
            ArtifactFormat::Yaml => "yaml",
            ArtifactFormat::Script => "script",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A directory scanned for artifacts.
///
/// A root without a kind is a monorepo whose top-level directories follow the
/// `templates/`, `scripts/`, `dashboards/` convention. A root with a kind holds
/// only that kind of artifact, grouped by category directories.
#[derive(Debug, Clone)]
pub struct ArtifactRoot {
    /// The root directory path.
    pub root: PathBuf,
    /// Kind of every artifact below this root, if dedicated.
    pub kind: Option<TargetKind>,
}

impl ArtifactRoot {
    /// A repository root laid out by directory convention.
    pub fn repository(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            kind: None,
        }
    }

    /// A root dedicated to a single artifact kind.
    pub fn dedicated(root: impl Into<PathBuf>, kind: TargetKind) -> Self {
        Self {
            root: root.into(),
            kind: Some(kind),
        }
    }
}

/// A candidate artifact file read from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path relative to the scanned root, used in reports.
    pub relative_path: PathBuf,
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// Category implied by the directory grouping, if any.
    pub category: Option<String>,
    /// Kind implied by the directory convention, if any.
    pub kind_hint: Option<TargetKind>,
}

impl ArtifactSource {
    /// Returns the file extension in lowercase.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    /// Returns the file name, falling back to the full path.
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// How a classification was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Both kind and format come from path conventions.
    Convention,
    /// At least one of kind or format was sniffed from the content.
    Sniffed,
}

/// Result of classifying an [`ArtifactSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Target kind.
    pub kind: TargetKind,
    /// Serialization format.
    pub format: ArtifactFormat,
    /// Whether content sniffing was needed.
    pub confidence: Confidence,
}

/// Definition forwarded verbatim to the target API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Payload {
    /// Original document text (Zabbix `configuration.import` source).
    Document(String),
    /// Structured object (Grafana dashboard model, Zabbix script parameters).
    Object(serde_json::Map<String, serde_json::Value>),
}

/// Format-independent representation of a decoded artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalArtifact {
    /// Target kind.
    pub kind: TargetKind,
    /// Original serialization.
    pub format: ArtifactFormat,
    /// Display name.
    pub name: String,
    /// Identifying key, unique within the kind's namespace.
    pub key: String,
    /// Category tags, declared in the file or implied by its directory.
    pub categories: Vec<String>,
    /// Definition passed through to the target.
    pub payload: Payload,
    /// Repository-relative path of the source file.
    pub source_path: PathBuf,
}

impl CanonicalArtifact {
    /// Returns true if any category tag equals `category`, ignoring case.
    pub fn has_category(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

/// A file that could not be read during discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryIssue {
    /// Path of the offending entry.
    pub path: PathBuf,
    /// Underlying I/O error message.
    pub message: String,
}

/// Everything found below the scanned roots.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Readable candidate files, in path order per root.
    pub sources: Vec<ArtifactSource>,
    /// Entries that could not be read.
    pub issues: Vec<DiscoveryIssue>,
}

/// Splits a comma-separated list into trimmed, non-empty entries.
///
/// ```
/// use monsync_discovery::parse_comma_list;
///
/// assert_eq!(parse_comma_list(" Websites, ,Databases "), vec!["Websites", "Databases"]);
/// ```
pub fn parse_comma_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_to_system() {
        assert_eq!(TargetKind::ZabbixTemplate.system(), TargetSystem::Zabbix);
        assert_eq!(TargetKind::ZabbixScript.system(), TargetSystem::Zabbix);
        assert_eq!(TargetKind::GrafanaDashboard.system(), TargetSystem::Grafana);
    }

    #[test]
    fn dir_name_mapping_is_case_insensitive() {
        assert_eq!(
            TargetKind::from_dir_name("DASHBOARDS"),
            Some(TargetKind::GrafanaDashboard)
        );
        assert_eq!(
            TargetKind::from_dir_name("zabbix-scripts"),
            Some(TargetKind::ZabbixScript)
        );
        assert_eq!(TargetKind::from_dir_name("docs"), None);
    }

    #[test]
    fn has_category_ignores_case() {
        let artifact = CanonicalArtifact {
            kind: TargetKind::GrafanaDashboard,
            format: ArtifactFormat::Json,
            name: "db".into(),
            key: "db".into(),
            categories: vec!["Databases".into()],
            payload: Payload::Object(serde_json::Map::new()),
            source_path: PathBuf::from("dashboards/db.json"),
        };
        assert!(artifact.has_category("databases"));
        assert!(!artifact.has_category("websites"));
    }

    #[test]
    fn comma_list_drops_blanks() {
        assert!(parse_comma_list("").is_empty());
        assert_eq!(parse_comma_list("a,b"), vec!["a", "b"]);
    }

    #[test]
    fn extension_is_lowercased() {
        let source = ArtifactSource {
            path: PathBuf::from("/repo/templates/Web.XML"),
            relative_path: PathBuf::from("templates/Web.XML"),
            bytes: Vec::new(),
            category: None,
            kind_hint: Some(TargetKind::ZabbixTemplate),
        };
        assert_eq!(source.extension().as_deref(), Some("xml"));
        assert_eq!(source.file_name(), "Web.XML");
    }
}
