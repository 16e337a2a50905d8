//! Artifact classification by path convention, falling back to content sniffing.

use crate::error::ClassifyError;
use crate::types::{ArtifactFormat, ArtifactSource, Classification, Confidence, TargetKind};
use regex::Regex;
use std::sync::LazyLock;

/// Bytes inspected when sniffing content.
const PEEK_BYTES: usize = 4096;

const SCRIPT_EXTENSIONS: &[&str] = &["sh", "bash", "py", "pl", "rb", "php"];

static YAML_KEY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*\s*:(\s|$)").expect("valid regex"));

fn format_from_extension(ext: &str) -> Option<ArtifactFormat> {
    match ext {
        "xml" => Some(ArtifactFormat::Xml),
        "json" => Some(ArtifactFormat::Json),
        "yaml" | "yml" => Some(ArtifactFormat::Yaml),
        e if SCRIPT_EXTENSIONS.contains(&e) => Some(ArtifactFormat::Script),
        _ => None,
    }
}

/// Returns the leading text of a file, without BOM or leading whitespace.
fn peek(bytes: &[u8]) -> Option<&str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut end = bytes.len().min(PEEK_BYTES);
    // back off to a char boundary when the peek splits a multi-byte sequence
    let text = loop {
        match std::str::from_utf8(&bytes[..end]) {
            Ok(text) => break text,
            Err(err) if err.error_len().is_none() && end > 0 => end = err.valid_up_to(),
            Err(_) => return None,
        }
    };
    Some(text.trim_start())
}

/// Infers the format from the first significant characters of a document.
///
/// ```
/// use monsync_discovery::{sniff_format, ArtifactFormat};
///
/// assert_eq!(sniff_format(b"<?xml version=\"1.0\"?>"), Some(ArtifactFormat::Xml));
/// assert_eq!(sniff_format(b"  {\"title\": \"x\"}"), Some(ArtifactFormat::Json));
/// assert_eq!(sniff_format(b"zabbix_export:\n  version: '6.0'"), Some(ArtifactFormat::Yaml));
/// assert_eq!(sniff_format(b"#!/bin/sh\necho ok"), Some(ArtifactFormat::Script));
/// assert_eq!(sniff_format(b"just some words"), None);
/// ```
pub fn sniff_format(bytes: &[u8]) -> Option<ArtifactFormat> {
    let text = peek(bytes)?;
    if text.starts_with('<') {
        return Some(ArtifactFormat::Xml);
    }
    if text.starts_with('{') || text.starts_with('[') {
        return Some(ArtifactFormat::Json);
    }
    if text.starts_with("#!") {
        return Some(ArtifactFormat::Script);
    }
    let first = text
        .lines()
        .map(str::trim_end)
        .find(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))?;
    if first == "---" || YAML_KEY_LINE.is_match(first) {
        return Some(ArtifactFormat::Yaml);
    }
    None
}

/// Infers the target kind from document content.
fn sniff_kind(bytes: &[u8], format: ArtifactFormat) -> Option<TargetKind> {
    if format == ArtifactFormat::Script {
        return Some(TargetKind::ZabbixScript);
    }
    let text = peek(bytes)?;
    if text.contains("zabbix_export") {
        return Some(TargetKind::ZabbixTemplate);
    }
    let dashboard_markers = match format {
        ArtifactFormat::Json => ["\"panels\"", "\"schemaVersion\""],
        ArtifactFormat::Yaml => ["panels:", "schemaVersion:"],
        ArtifactFormat::Xml | ArtifactFormat::Script => return None,
    };
    dashboard_markers
        .iter()
        .any(|m| text.contains(m))
        .then_some(TargetKind::GrafanaDashboard)
}

fn compatible(kind: TargetKind, format: ArtifactFormat) -> bool {
    match kind {
        TargetKind::ZabbixTemplate => format != ArtifactFormat::Script,
        TargetKind::ZabbixScript => true,
        TargetKind::GrafanaDashboard => {
            matches!(format, ArtifactFormat::Json | ArtifactFormat::Yaml)
        }
    }
}

/// Classifies a source into a target kind and serialization format.
///
/// Format comes from the extension when it is a known one and from content
/// sniffing otherwise. Kind comes from the directory convention recorded at
/// discovery, falling back to content sniffing. Pairs the target cannot accept
/// (an XML dashboard, a template written as a shell script) are rejected.
/// The function is pure: the same source always yields the same answer.
pub fn classify(source: &ArtifactSource) -> Result<Classification, ClassifyError> {
    let path = &source.relative_path;
    let mut sniffed = false;

    let format = match source.extension().as_deref().and_then(format_from_extension) {
        Some(format) => format,
        None => match sniff_format(&source.bytes) {
            Some(format) => {
                sniffed = true;
                format
            }
            // anything under a scripts directory is installed as-is
            None if source.kind_hint == Some(TargetKind::ZabbixScript) => ArtifactFormat::Script,
            None => {
                return Err(ClassifyError::new(
                    path,
                    "unknown extension and unrecognised content",
                ))
            }
        },
    };

    let kind = match source.kind_hint {
        Some(kind) => kind,
        None => {
            sniffed = true;
            sniff_kind(&source.bytes, format).ok_or_else(|| {
                ClassifyError::new(
                    path,
                    format!("no target directory convention and no {format} content markers"),
                )
            })?
        }
    };

    if !compatible(kind, format) {
        return Err(ClassifyError::new(
            path,
            format!("{kind} cannot be written as {format}"),
        ));
    }

    Ok(Classification {
        kind,
        format,
        confidence: if sniffed {
            Confidence::Sniffed
        } else {
            Confidence::Convention
        },
    })
}
