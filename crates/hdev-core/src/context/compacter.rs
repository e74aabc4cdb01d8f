//! Conversation compaction and session transition

use super::accountant::TokenAccountant;
use super::policy::should_compact;
use super::summarizer::Summarizer;
use super::types::{CompactionSummary, CompactionTransition};
use crate::config::CompactionConfig;
use crate::error::{HdevError, HdevResult};
use crate::llm::ModelApi;
use hdev_session::{Message, Session, has_incomplete_tool_use, new_session_id};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Histories shorter than this are never compacted
pub const MIN_COMPACTABLE_MESSAGES: usize = 2;

/// Decides when a conversation needs compacting and builds the transition
/// onto a fresh session.
///
/// Nothing here mutates or persists a session; callers apply the returned
/// [`CompactionTransition`].
#[derive(Clone)]
pub struct ConversationCompacter {
    accountant: TokenAccountant,
    summarizer: Summarizer,
    config: CompactionConfig,
}

impl ConversationCompacter {
    pub fn new(api: Arc<dyn ModelApi>, config: CompactionConfig) -> Self {
        Self {
            accountant: TokenAccountant::new(api.clone()),
            summarizer: Summarizer::new(api),
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &CompactionConfig {
        &self.config
    }

    /// Check if compaction is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Token accountant shared with callers that display usage
    pub fn accountant(&self) -> &TokenAccountant {
        &self.accountant
    }

    /// Summarize the session if it is over threshold.
    ///
    /// Returns `Ok(None)` when compaction is disabled, not needed, or the
    /// token count could not be obtained. Summarization failures are returned
    /// as errors.
    pub async fn check_and_compact(
        &self,
        session: &Session,
    ) -> HdevResult<Option<CompactionSummary>> {
        if !self.config.enabled {
            return Ok(None);
        }
        if !is_compactable(session) {
            return Ok(None);
        }

        let token_count = match self
            .accountant
            .count_tokens(session.messages(), &session.model_spec)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(session_id = %session.id(), "Skipping compaction check: {}", e);
                return Ok(None);
            }
        };

        if !should_compact(token_count, &session.model_spec, self.config.threshold_ratio) {
            debug!(
                session_id = %session.id(),
                tokens = token_count,
                context_window = session.model_spec.context_window,
                "Compaction not needed"
            );
            return Ok(None);
        }

        info!(
            session_id = %session.id(),
            tokens = token_count,
            context_window = session.model_spec.context_window,
            "Compaction threshold reached, summarizing {} messages",
            session.len()
        );

        self.summarize(session, token_count).await
    }

    /// Build a transition onto a new session if the session is over
    /// threshold
    pub async fn compact_and_transition(
        &self,
        session: &Session,
    ) -> HdevResult<Option<CompactionTransition>> {
        let summary = self.check_and_compact(session).await?;
        Ok(summary.map(|summary| build_transition(session, summary)))
    }

    /// Build a transition regardless of the threshold.
    ///
    /// The disabled flag and the minimum history length still apply.
    pub async fn force_compact(
        &self,
        session: &Session,
    ) -> HdevResult<Option<CompactionTransition>> {
        if !self.config.enabled || !is_compactable(session) {
            return Ok(None);
        }

        let token_count = match self
            .accountant
            .count_tokens(session.messages(), &session.model_spec)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(session_id = %session.id(), "Cannot compact: {}", e);
                return Ok(None);
            }
        };

        info!(session_id = %session.id(), tokens = token_count, "Forced compaction");
        let summary = self.summarize(session, token_count).await?;
        Ok(summary.map(|summary| build_transition(session, summary)))
    }

    async fn summarize(
        &self,
        session: &Session,
        token_count: u64,
    ) -> HdevResult<Option<CompactionSummary>> {
        match self
            .summarizer
            .summarize_counted(session.messages(), &session.model_spec, token_count)
            .await
        {
            Ok(summary) => Ok(Some(summary)),
            Err(HdevError::TokenCounting(reason)) => {
                warn!(
                    session_id = %session.id(),
                    "Discarding summary, could not count its tokens: {}",
                    reason
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn is_compactable(session: &Session) -> bool {
    if session.len() < MIN_COMPACTABLE_MESSAGES {
        return false;
    }
    if has_incomplete_tool_use(session.messages()) {
        debug!(session_id = %session.id(), "History ends with pending tool use");
        return false;
    }
    true
}

fn build_transition(session: &Session, summary: CompactionSummary) -> CompactionTransition {
    let mut new_id = new_session_id();
    while new_id == session.session_id {
        new_id = new_session_id();
    }

    CompactionTransition {
        original_session_id: session.session_id.clone(),
        new_session_id: new_id,
        compacted_messages: vec![summary_message(&summary)],
        original_message_count: session.len(),
        summary,
    }
}

/// The single user-role message that replaces a compacted history
pub fn summary_message(summary: &CompactionSummary) -> Message {
    Message::user(format!(
        "### Conversation Summary (Compacted from {} previous messages)\n\n{}\n\nContinue the conversation from this point.",
        summary.original_message_count, summary.summary
    ))
}
