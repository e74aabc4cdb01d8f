//! Context window management
//!
//! Token accounting, the compaction threshold policy, conversation
//! summarization and the compacter that turns an over-threshold session into
//! a [`CompactionTransition`] onto a new session.

pub mod accountant;
pub mod compacter;
pub mod policy;
pub mod summarizer;
pub mod types;

pub use accountant::{TokenAccountant, render_transcript};
pub use compacter::{ConversationCompacter, MIN_COMPACTABLE_MESSAGES, summary_message};
pub use policy::{ContextUsage, context_usage, should_compact};
pub use summarizer::{SUMMARY_MAX_TOKENS, SUMMARY_SYSTEM_PROMPT, Summarizer, extract_summary};
pub use types::{CompactionSummary, CompactionTransition};
