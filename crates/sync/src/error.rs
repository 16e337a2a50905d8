//! Error taxonomy for per-artifact failures.

use monsync_discovery::{ClassifyError, DecodeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a target client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Credentials rejected, session unrecoverable, or login endpoint unreachable.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// The target answered with an error.
    #[error("API error: {0}")]
    Api(String),
    /// The call did not complete in time.
    #[error("timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
    /// The request could not be delivered.
    #[error("transport error: {0}")]
    Transport(String),
    /// Local filesystem failure.
    #[error("I/O error: {0}")]
    Io(String),
}

impl ClientError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout)
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Why a single artifact failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("cannot read artifact: {0}")]
    Read(String),
    #[error(transparent)]
    Unclassifiable(#[from] ClassifyError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Read(_) => ErrorKind::Io,
            SyncError::Unclassifiable(_) => ErrorKind::Unclassifiable,
            SyncError::Decode(_) => ErrorKind::Decode,
            SyncError::Client(client) => match client {
                ClientError::Auth(_) => ErrorKind::Auth,
                ClientError::Api(_) => ErrorKind::Api,
                ClientError::Timeout(_) => ErrorKind::Timeout,
                ClientError::Transport(_) => ErrorKind::Transport,
                ClientError::Io(_) => ErrorKind::Io,
            },
        }
    }
}

/// Coarse failure category, stable across releases for report consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unclassifiable,
    Decode,
    Auth,
    Api,
    Timeout,
    Transport,
    Io,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Unclassifiable => "unclassifiable",
            ErrorKind::Decode => "decode",
            ErrorKind::Auth => "auth",
            ErrorKind::Api => "api",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Transport => "transport",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
