//! Session storage abstraction and implementations
//!
//! Provides trait-based storage for session persistence with
//! local filesystem implementation.

mod local;

pub use local::LocalSessionStore;

use crate::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid session data: {0}")]
    InvalidData(String),

    #[error("Invalid session id: {0:?}")]
    InvalidId(String),

    #[error("Session lineage contains a cycle at {0}")]
    LineageCycle(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Lightweight view of a stored session for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub parent_session_id: Option<String>,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            parent_session_id: session.parent_session_id.clone(),
            message_count: session.messages.len(),
            created_at: session.metadata.created_at,
            last_updated: session.metadata.last_updated,
        }
    }
}

/// Filter criteria for session listing
#[derive(Debug, Default, Clone)]
pub struct SessionFilter {
    /// Only sessions compacted from this parent
    pub parent_session_id: Option<String>,

    /// Only root sessions
    pub roots_only: bool,

    /// Maximum number of results
    pub limit: Option<usize>,
}

impl SessionFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by parent session
    pub fn children_of(mut self, parent_session_id: impl Into<String>) -> Self {
        self.parent_session_id = Some(parent_session_id.into());
        self
    }

    /// Only list root sessions
    pub fn roots_only(mut self) -> Self {
        self.roots_only = true;
        self
    }

    /// Limit results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if a session matches this filter
    pub fn matches(&self, info: &SessionInfo) -> bool {
        if self.roots_only && info.parent_session_id.is_some() {
            return false;
        }

        if let Some(ref parent) = self.parent_session_id {
            if info.parent_session_id.as_ref() != Some(parent) {
                return false;
            }
        }

        true
    }
}

/// Session storage trait for different backends
///
/// Implementations must tolerate concurrent use on different session ids.
/// Concurrent writers to the same id are not arbitrated.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Save a session, overwriting any previous record with the same id
    async fn save(&self, session: &Session) -> StorageResult<()>;

    /// Load a session by ID
    async fn load(&self, session_id: &str) -> StorageResult<Session>;

    /// Check if a session exists
    async fn exists(&self, session_id: &str) -> StorageResult<bool>;

    /// List stored sessions, newest first
    async fn list(&self, filter: &SessionFilter) -> StorageResult<Vec<SessionInfo>>;

    /// Walk parent links from `session_id` up to its root.
    ///
    /// The returned ids start with `session_id` and end with the root, so the
    /// number of compactions between them is `len() - 1`.
    async fn lineage(&self, session_id: &str) -> StorageResult<Vec<String>> {
        let mut chain = vec![session_id.to_string()];
        let mut seen: HashSet<String> = chain.iter().cloned().collect();
        let mut current = self.load(session_id).await?;

        while let Some(parent_id) = current.parent_session_id.take() {
            if !seen.insert(parent_id.clone()) {
                return Err(StorageError::LineageCycle(parent_id));
            }
            current = self.load(&parent_id).await?;
            chain.push(parent_id);
        }

        Ok(chain)
    }
}
