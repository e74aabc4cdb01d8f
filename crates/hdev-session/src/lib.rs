//! Session records and persistence for hdev
//!
//! This crate provides:
//! - Conversation messages and structured content blocks
//! - Model descriptors and per-call usage records
//! - Sessions with parent/child lineage created by compaction
//! - Local file storage keyed by session id

pub mod message;
pub mod model;
pub mod session;
pub mod storage;
pub mod usage;

pub use message::{ContentBlock, Message, MessageContent, Role, has_incomplete_tool_use};
pub use model::{CachePricing, ModelSpec, Pricing};
pub use session::{CompactionMetadata, Session, SessionMetadata, detect_root_dir, new_session_id};
pub use storage::{
    LocalSessionStore, SessionFilter, SessionInfo, SessionStore, StorageError, StorageResult,
};
pub use usage::{TokenUsage, UsageRecord};
