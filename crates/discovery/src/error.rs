use crate::types::ArtifactFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Neither path conventions nor content sniffing identified the artifact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot classify {}: {reason}", path.display())]
pub struct ClassifyError {
    /// Repository-relative path of the file.
    pub path: PathBuf,
    /// Why classification failed.
    pub reason: String,
}

impl ClassifyError {
    pub(crate) fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Malformed artifact content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The document does not parse in its declared format.
    #[error("invalid {format} in {}: {message}", path.display())]
    Parse {
        path: PathBuf,
        format: ArtifactFormat,
        message: String,
    },
    /// A field needed to identify the artifact is absent.
    #[error("{} has no {field}", path.display())]
    MissingField { path: PathBuf, field: &'static str },
    /// The file is not valid UTF-8.
    #[error("{} is not valid UTF-8 text", path.display())]
    NotText { path: PathBuf },
    /// Another file already claimed this identifying key.
    #[error("{} duplicates key '{key}' already defined by {}", path.display(), first.display())]
    DuplicateKey {
        path: PathBuf,
        key: String,
        first: PathBuf,
    },
}

impl DecodeError {
    pub(crate) fn parse(
        path: impl Into<PathBuf>,
        format: ArtifactFormat,
        err: impl std::fmt::Display,
    ) -> Self {
        DecodeError::Parse {
            path: path.into(),
            format,
            message: err.to_string(),
        }
    }
}
