//! Conversation compaction and session transitions for hdev
//!
//! When a conversation approaches the model's context window it is summarized
//! and continued on a new session whose parent is the original. The original
//! session is persisted untouched, so the full history stays reachable by
//! walking parent links.
//!
//! # Modules
//!
//! - [`context`]: token accounting, threshold policy, summarizer, compacter
//! - [`agent`]: live conversation state and the loop driver that applies
//!   transitions between turns
//! - [`llm`]: the model API seam
//! - [`config`]: layered configuration
//! - [`logging`]: tracing subscriber setup

pub mod agent;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod logging;

pub use agent::{AgentContext, AgentLoop, UsageSummary, UserInterface};
pub use config::{CompactionConfig, ConfigLoader, HdevConfig, LogFormat, LoggingConfig};
pub use context::{
    CompactionSummary, CompactionTransition, ContextUsage, ConversationCompacter, Summarizer,
    TokenAccountant, should_compact,
};
pub use error::{HdevError, HdevResult};
pub use llm::ModelApi;
pub use logging::init_logging;
