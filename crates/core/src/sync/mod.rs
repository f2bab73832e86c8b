//! Load/save boundary between the in-memory catalog and a document store.

pub mod gateway;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::validate::ValidationError;
use crate::store::{StoreError, VersionToken};

/// The two documents the gateway persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Movies,
    Site,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Resource::Movies => "movies",
            Resource::Site => "site",
        })
    }
}

/// Last-known token per resource. `None` means the document did not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTokens {
    #[serde(default)]
    pub movies: Option<VersionToken>,
    #[serde(default)]
    pub site: Option<VersionToken>,
}

/// Tokens of both documents after a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTokens {
    pub movies: VersionToken,
    pub site: VersionToken,
}

impl From<SavedTokens> for VersionTokens {
    fn from(saved: SavedTokens) -> Self {
        Self {
            movies: Some(saved.movies),
            site: Some(saved.site),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid catalog: {0}")]
    Invalid(#[from] ValidationError),

    /// Someone else wrote the document after the caller loaded it.
    #[error("{resource} changed since it was loaded ({path}); reload and retry")]
    Conflict { resource: Resource, path: String },

    #[error("{resource}: {source}")]
    Upstream {
        resource: Resource,
        #[source]
        source: StoreError,
    },

    #[error("{resource} document is not valid JSON for its shape: {source}")]
    Decode {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {resource}: {source}")]
    Encode {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },
}

impl SyncError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::Conflict { .. })
    }

    /// Status code reported by the store, for upstream failures.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            SyncError::Upstream { source, .. } => source.status(),
            _ => None,
        }
    }
}
