use crate::types::{ArtifactRoot, ArtifactSource, Discovery, DiscoveryIssue, TargetKind};
use pathdiff::diff_paths;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const MAX_DEPTH: usize = 8;

/// Extensions that never hold artifacts.
const IGNORED_EXTENSIONS: &[&str] = &[
    "md", "markdown", "rst", "txt", "png", "jpg", "jpeg", "gif", "svg", "lock",
];

/// File name prefixes that never hold artifacts.
const IGNORED_PREFIXES: &[&str] = &["readme", "license", "changelog", "contributing"];

/// Returns true if the name starts with a dot (hidden file/directory).
pub fn is_hidden_component(name: &str) -> bool {
    name.starts_with('.')
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && is_hidden_component(&entry.file_name().to_string_lossy())
}

/// Returns true if a file is documentation or tooling rather than an artifact.
///
/// ```
/// use monsync_discovery::is_ignored_file;
/// use std::path::Path;
///
/// assert!(is_ignored_file(Path::new("templates/README.md")));
/// assert!(is_ignored_file(Path::new("scripts/requirements.txt")));
/// assert!(!is_ignored_file(Path::new("templates/web.xml")));
/// ```
pub fn is_ignored_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if IGNORED_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return true;
    }
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| IGNORED_EXTENSIONS.contains(&ext.as_str()))
}

/// Derives the kind hint and category grouping from a root-relative path.
///
/// For a dedicated root the first directory is the category. Otherwise the
/// first directory named after a kind (`templates/`, `dashboards/`, ...) sets
/// the hint and the directory right below it is the category.
fn layout_of(relative: &Path, dedicated: Option<TargetKind>) -> (Option<TargetKind>, Option<String>) {
    let mut dirs: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    // last component is the file itself
    dirs.pop();

    if dedicated.is_some() {
        return (dedicated, dirs.into_iter().next());
    }

    match dirs
        .iter()
        .enumerate()
        .find_map(|(i, d)| TargetKind::from_dir_name(d).map(|k| (i, k)))
    {
        Some((idx, kind)) => (Some(kind), dirs.get(idx + 1).cloned()),
        None => (None, dirs.into_iter().next()),
    }
}

/// Resolved form of a path, or the path itself when it cannot be resolved.
fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Scans one root, leaving out the `nested` dedicated roots and files already `seen`.
fn scan_root(
    root_cfg: &ArtifactRoot,
    nested: &[PathBuf],
    seen: &mut HashSet<PathBuf>,
    out: &mut Discovery,
) {
    let root = &root_cfg.root;
    if !root.exists() {
        tracing::debug!(root = %root.display(), "Artifact root does not exist; skipping");
        return;
    }

    let is_nested_root = |e: &DirEntry| {
        let nested_here = e.file_type().is_dir() && nested.contains(&canonical(e.path()));
        if nested_here {
            tracing::debug!(
                path = %e.path().display(),
                "Leaving dedicated root to its own scan"
            );
        }
        nested_here
    };

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e) && !is_nested_root(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                out.issues.push(DiscoveryIssue {
                    path,
                    message: err.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() || is_ignored_file(entry.path()) {
            continue;
        }

        let path = entry.into_path();
        if !seen.insert(canonical(&path)) {
            continue;
        }
        let relative = diff_paths(&path, root).unwrap_or_else(|| path.clone());
        match fs::read(&path) {
            Ok(bytes) => {
                let (kind_hint, category) = layout_of(&relative, root_cfg.kind);
                out.sources.push(ArtifactSource {
                    path,
                    relative_path: relative,
                    bytes,
                    category,
                    kind_hint,
                });
            }
            Err(err) => out.issues.push(DiscoveryIssue {
                path: relative,
                message: err.to_string(),
            }),
        }
    }
}

/// Enumerates candidate artifact files below the given roots.
///
/// Hidden entries and documentation files are not candidates. Files are
/// returned in file-name order within each root, and roots are scanned in the
/// order given, so repeated scans of the same tree yield the same sequence.
/// Unreadable entries are reported as issues rather than aborting the scan.
///
/// Every file is reported at most once. A dedicated root nested inside another
/// root is scanned only as the dedicated root, so its kind and category layout
/// apply; other overlaps (symlinks, repeated roots) keep the first sighting.
pub fn discover_artifacts(roots: &[ArtifactRoot]) -> Discovery {
    let dedicated: Vec<PathBuf> = roots
        .iter()
        .filter(|r| r.kind.is_some())
        .map(|r| canonical(&r.root))
        .collect();
    let mut seen = HashSet::new();
    let mut discovery = Discovery::default();
    for root in roots {
        let own = canonical(&root.root);
        let nested: Vec<PathBuf> = dedicated.iter().filter(|d| **d != own).cloned().collect();
        scan_root(root, &nested, &mut seen, &mut discovery);
    }
    tracing::debug!(
        sources = discovery.sources.len(),
        issues = discovery.issues.len(),
        "Artifact discovery finished"
    );
    discovery
}

/// Builds scan roots from a repository root and optional dedicated roots.
pub fn artifact_roots(
    repository: Option<&Path>,
    dedicated: &[(TargetKind, PathBuf)],
) -> Vec<ArtifactRoot> {
    let mut roots: Vec<ArtifactRoot> = repository
        .map(|r| vec![ArtifactRoot::repository(r)])
        .unwrap_or_default();
    roots.extend(
        dedicated
            .iter()
            .map(|(kind, path)| ArtifactRoot::dedicated(path.clone(), *kind)),
    );
    roots
}
