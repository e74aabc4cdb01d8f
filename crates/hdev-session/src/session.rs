//! Session data structures
//!
//! Defines the persisted shape of a conversation:
//! - Session: identity, lineage, model, history and usage
//! - SessionMetadata: timestamps and the invocation context
//! - CompactionMetadata: how a child session was produced from its parent

use crate::{Message, ModelSpec, UsageRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Generate a fresh session identifier
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Session metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Creation timestamp; preserved across saves
    pub created_at: DateTime<Utc>,

    /// Last save timestamp
    pub last_updated: DateTime<Utc>,

    /// Repository (or working directory) the session was started in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,

    /// Command line the agent was started with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_args: Option<Vec<String>>,
}

impl SessionMetadata {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_updated: now,
            root_dir: None,
            cli_args: None,
        }
    }

    /// Update the modified timestamp
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

impl Default for SessionMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Record of the compaction that created a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactionMetadata {
    pub original_session_id: String,
    pub original_message_count: usize,
    pub original_token_count: u64,
    pub summary_token_count: u64,
    pub compaction_ratio: f64,
    pub timestamp: DateTime<Utc>,
}

/// Complete session with history, usage and lineage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,

    /// Session this one was compacted from; `None` for roots
    pub parent_session_id: Option<String>,

    pub model_spec: ModelSpec,

    #[serde(default)]
    pub usage: Vec<UsageRecord>,

    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub metadata: SessionMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compaction: Option<CompactionMetadata>,
}

impl Session {
    /// Create a new empty root session
    pub fn new(model_spec: ModelSpec) -> Self {
        Self::with_id(new_session_id(), model_spec)
    }

    /// Create a root session with a known id
    pub fn with_id(session_id: impl Into<String>, model_spec: ModelSpec) -> Self {
        Self {
            session_id: session_id.into(),
            parent_session_id: None,
            model_spec,
            usage: Vec::new(),
            messages: Vec::new(),
            metadata: SessionMetadata::new(),
            compaction: None,
        }
    }

    /// Set the parent session
    pub fn with_parent(mut self, parent_session_id: impl Into<String>) -> Self {
        self.parent_session_id = Some(parent_session_id.into());
        self
    }

    /// Replace the message history
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Get the session ID
    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// Whether this session has no parent
    pub fn is_root(&self) -> bool {
        self.parent_session_id.is_none()
    }

    /// Add a message to the session
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.metadata.touch();
    }

    /// Get all messages as a slice
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Check if the session is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

/// Find the repository root above `start`, falling back to `start` itself
pub fn detect_root_dir(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(".git").is_dir())
        .unwrap_or(start)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec() -> ModelSpec {
        ModelSpec::new("test-model", 100_000, 4_096)
    }

    #[test]
    fn test_session_creation() {
        let session = Session::new(spec());
        assert!(session.is_root());
        assert!(session.is_empty());
        assert!(Uuid::parse_str(session.id()).is_ok());
    }

    #[test]
    fn test_add_messages() {
        let mut session = Session::new(spec());
        session.add_message(Message::user("Hello"));
        session.add_message(Message::assistant("Hi there!"));
        assert_eq!(session.len(), 2);
        assert!(session.metadata.last_updated >= session.metadata.created_at);
    }

    #[test]
    fn test_child_session() {
        let parent = Session::new(spec());
        let child = Session::new(spec()).with_parent(parent.id());
        assert!(!child.is_root());
        assert_eq!(child.parent_session_id.as_deref(), Some(parent.id()));
    }

    #[test]
    fn test_compaction_record_omitted_for_plain_sessions() {
        let value = serde_json::to_value(Session::new(spec())).unwrap();
        assert!(value.get("compaction").is_none());
        assert!(value["parent_session_id"].is_null());
    }

    #[test]
    fn test_detect_root_dir() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("repo");
        let nested = repo.join("src").join("bin");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(repo.join(".git")).unwrap();

        assert_eq!(detect_root_dir(&nested), repo);

        let outside = temp.path().join("plain");
        std::fs::create_dir_all(&outside).unwrap();
        assert_eq!(detect_root_dir(&outside), outside);
    }
}
