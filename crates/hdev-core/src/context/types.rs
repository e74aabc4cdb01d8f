//! Compaction result types

use chrono::{DateTime, Utc};
use hdev_session::{CompactionMetadata, Message};
use serde::{Deserialize, Serialize};

/// Summary produced for an over-threshold conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactionSummary {
    pub original_message_count: usize,
    pub original_token_count: u64,
    pub summary_token_count: u64,
    /// `summary_token_count / original_token_count`; 0.0 when the original
    /// count is 0
    pub compaction_ratio: f64,
    pub summary: String,
    /// When the summary was generated
    pub timestamp: DateTime<Utc>,
}

impl CompactionSummary {
    pub fn new(
        original_message_count: usize,
        original_token_count: u64,
        summary_token_count: u64,
        summary: impl Into<String>,
    ) -> Self {
        let compaction_ratio = if original_token_count == 0 {
            0.0
        } else {
            summary_token_count as f64 / original_token_count as f64
        };

        Self {
            original_message_count,
            original_token_count,
            summary_token_count,
            compaction_ratio,
            summary: summary.into(),
            timestamp: Utc::now(),
        }
    }

    /// Tokens no longer in context after compaction
    pub fn tokens_saved(&self) -> u64 {
        self.original_token_count
            .saturating_sub(self.summary_token_count)
    }
}

/// Everything needed to move a live conversation onto a new session
#[derive(Debug, Clone, PartialEq)]
pub struct CompactionTransition {
    pub original_session_id: String,
    pub new_session_id: String,
    /// Replacement history for the new session
    pub compacted_messages: Vec<Message>,
    pub original_message_count: usize,
    pub summary: CompactionSummary,
}

impl CompactionTransition {
    /// User-facing notice for this transition
    pub fn notification(&self) -> String {
        format!(
            "Conversation compacted: {} messages → new session {}",
            self.original_message_count, self.new_session_id
        )
    }

    /// Record stored on the new session
    pub fn compaction_metadata(&self) -> CompactionMetadata {
        CompactionMetadata {
            original_session_id: self.original_session_id.clone(),
            original_message_count: self.original_message_count,
            original_token_count: self.summary.original_token_count,
            summary_token_count: self.summary.summary_token_count,
            compaction_ratio: self.summary.compaction_ratio,
            timestamp: self.summary.timestamp,
        }
    }
}
