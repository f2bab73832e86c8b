//! Remote document stores.
//!
//! A store holds whole JSON documents at named paths and guards writes with
//! an opaque version token. Two backends ship with the crate:
//! [`github::GitHubStore`] for the GitHub contents API and
//! [`memory::MemoryStore`] for development and tests.

pub mod github;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque fingerprint of a stored document, as issued by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw document bytes plus the token describing that exact content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub content: Vec<u8>,
    pub version: VersionToken,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The precondition token no longer matches the stored document.
    #[error("version conflict writing {path}")]
    Conflict { path: String },

    /// The store answered with an unexpected status.
    #[error("{operation} {path} failed: {status} {message}")]
    Status {
        operation: &'static str,
        path: String,
        status: u16,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered 2xx but the payload could not be understood.
    #[error("malformed store response for {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("store misconfigured: {0}")]
    Config(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// HTTP status reported by the store, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            StoreError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// A keyed document store with compare-and-swap writes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the document at `path`. `Ok(None)` means it does not exist yet.
    async fn fetch(&self, path: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Write `content` at `path` if its current token equals `expected`.
    ///
    /// `expected = None` creates the document and fails with
    /// [`StoreError::Conflict`] if one already exists. Returns the token of
    /// the newly written content.
    async fn store(
        &self,
        path: &str,
        content: Vec<u8>,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, StoreError>;

    /// Short backend name for health reporting.
    fn name(&self) -> &'static str;
}
