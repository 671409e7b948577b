//! Domain errors for the organization metadata cache.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four entity families held by an organization cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Repository,
    Environment,
    EnvironmentSecret,
    TeamRepository,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::Environment => "environment",
            Self::EnvironmentSecret => "environment secret",
            Self::TeamRepository => "team repository",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single call against the remote API.
///
/// "Resource does not exist" is never a `RemoteError`: point queries report it
/// as `Ok(None)` so the cache can turn it into [`CacheError::NotFound`].
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("GitHub returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// HTTP status attached to the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors surfaced by the entity caches.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("remote query for {kind} in {scope} failed: {source}")]
    RemoteQuery {
        kind: EntityKind,
        scope: String,
        #[source]
        source: RemoteError,
    },

    #[error("{kind} '{item}' not found in {scope}")]
    NotFound {
        kind: EntityKind,
        scope: String,
        item: String,
    },

    #[error("{kind} lookup in {scope} was cancelled")]
    Cancelled { kind: EntityKind, scope: String },
}

impl CacheError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::RemoteQuery { kind, .. }
            | Self::NotFound { kind, .. }
            | Self::Cancelled { kind, .. } => *kind,
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
