//! Agent loop driver
//!
//! Owns the live [`AgentContext`] and performs the turn-boundary compaction
//! step: when the history has grown past the threshold it is summarized, the
//! original session is persisted untouched, and the conversation continues
//! on a child session seeded with the summary.

use super::context::AgentContext;
use super::interface::UserInterface;
use super::usage::UsageSummary;
use crate::context::{CompactionTransition, ContextUsage, ConversationCompacter, context_usage};
use crate::error::{HdevError, HdevResult};
use hdev_session::{ContentBlock, Message, Session, SessionStore, TokenUsage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The live history must be longer than this before compaction is checked
pub const MIN_HISTORY_FOR_COMPACTION: usize = 2;

/// Save attempts per session before giving up for this flush
pub const DEFAULT_SAVE_ATTEMPTS: u32 = 3;

/// Base delay between save attempts; grows linearly per attempt
pub const DEFAULT_SAVE_BACKOFF: Duration = Duration::from_millis(100);

/// Drives one conversation: history, tool-result buffering, usage and
/// compaction transitions.
pub struct AgentLoop {
    context: AgentContext,
    compacter: ConversationCompacter,
    store: Arc<dyn SessionStore>,
    ui: Arc<dyn UserInterface>,
    /// Set once the compaction step ran for the current turn boundary
    compaction_checked: bool,
    save_attempts: u32,
    save_backoff: Duration,
}

impl AgentLoop {
    pub fn new(
        context: AgentContext,
        compacter: ConversationCompacter,
        store: Arc<dyn SessionStore>,
        ui: Arc<dyn UserInterface>,
    ) -> Self {
        Self {
            context,
            compacter,
            store,
            ui,
            compaction_checked: false,
            save_attempts: DEFAULT_SAVE_ATTEMPTS,
            save_backoff: DEFAULT_SAVE_BACKOFF,
        }
    }

    /// Continue a stored session
    pub async fn resume(
        session_id: &str,
        compacter: ConversationCompacter,
        store: Arc<dyn SessionStore>,
        ui: Arc<dyn UserInterface>,
    ) -> HdevResult<Self> {
        let session = store.load(session_id).await?;
        let message_count = session.len();
        info!(session_id = %session_id, messages = message_count, "Resuming session");

        ui.handle_system_message(&format!(
            "Resumed session {} with {} messages",
            session_id, message_count
        ));
        Ok(Self::new(
            AgentContext::from_session(session),
            compacter,
            store,
            ui,
        ))
    }

    /// Configure save retries; `attempts` is clamped to at least one
    pub fn with_save_retries(mut self, attempts: u32, backoff: Duration) -> Self {
        self.save_attempts = attempts.max(1);
        self.save_backoff = backoff;
        self
    }

    pub fn context(&self) -> &AgentContext {
        &self.context
    }

    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    pub fn messages(&self) -> &[Message] {
        self.context.messages()
    }

    /// Turn-boundary step, run before accepting user input.
    ///
    /// Applies at most one compaction per boundary and returns the applied
    /// transition. A second call before the next user message is a no-op.
    pub async fn begin_turn(&mut self) -> Option<CompactionTransition> {
        if self.compaction_checked {
            debug!(session_id = %self.session_id(), "Compaction already checked this turn");
            return None;
        }
        self.compaction_checked = true;
        self.check_compaction().await
    }

    async fn check_compaction(&mut self) -> Option<CompactionTransition> {
        if !self.context.tool_result_buffer().is_empty() {
            debug!(session_id = %self.session_id(), "Tool results pending, skipping compaction");
            return None;
        }
        if self.context.messages().len() <= MIN_HISTORY_FOR_COMPACTION {
            return None;
        }

        let original = self.context.to_session();
        let transition = match self.compacter.compact_and_transition(&original).await {
            Ok(Some(transition)) => transition,
            Ok(None) => return None,
            Err(e) => {
                warn!(session_id = %original.id(), "Compaction failed: {}", e);
                let reason = match e {
                    HdevError::Summarization(reason) => reason,
                    other => other.to_string(),
                };
                self.ui
                    .handle_system_message(&format!("Compaction failed: {}", reason));
                return None;
            }
        };

        // The live session is only replaced once the original is on disk
        if let Err(e) = self.save_with_retry(&original).await {
            warn!(session_id = %original.id(), "Compaction aborted: {}", e);
            self.ui.handle_system_message(&format!(
                "Compaction aborted: session {} could not be saved ({})",
                original.id(),
                e
            ));
            return None;
        }

        self.context.apply_transition(&transition);
        info!(
            original_session_id = %transition.original_session_id,
            new_session_id = %transition.new_session_id,
            original_messages = transition.original_message_count,
            ratio = transition.summary.compaction_ratio,
            "Conversation compacted"
        );
        self.ui.handle_system_message(&transition.notification());

        let new_session = self.context.to_session();
        if let Err(e) = self.save_with_retry(&new_session).await {
            self.warn_not_durable(new_session.id(), &e);
        }

        Some(transition)
    }

    /// Append user input; opens a new turn boundary
    pub fn push_user_message(&mut self, content: impl Into<String>) {
        self.context.push_message(Message::user(content));
        self.compaction_checked = false;
    }

    pub fn push_assistant_message(&mut self, message: Message) {
        self.context.push_message(message);
    }

    pub fn buffer_tool_result(&mut self, result: ContentBlock) {
        self.context.buffer_tool_result(result);
    }

    /// Fold buffered tool results into the history
    pub fn flush_tool_results(&mut self) -> bool {
        self.context.flush_tool_results()
    }

    pub fn report_usage(&mut self, usage: TokenUsage) {
        self.context.report_usage(usage);
    }

    pub fn usage_summary(&self) -> UsageSummary {
        self.context.usage_summary()
    }

    /// Current context consumption; `None` when tokens cannot be counted
    pub async fn context_usage(&self) -> Option<ContextUsage> {
        let count = self
            .compacter
            .accountant()
            .count_tokens(self.context.messages(), &self.context.model_spec)
            .await;

        match count {
            Ok(tokens) => Some(context_usage(
                tokens,
                &self.context.model_spec,
                self.compacter.config().threshold_ratio,
            )),
            Err(e) => {
                warn!(session_id = %self.session_id(), "Context usage unavailable: {}", e);
                None
            }
        }
    }

    /// Persist the current session. An empty history is not written.
    pub async fn flush(&mut self) -> HdevResult<()> {
        if self.context.messages().is_empty() {
            return Ok(());
        }

        let session = self.context.to_session();
        match self.save_with_retry(&session).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.warn_not_durable(session.id(), &e);
                Err(e)
            }
        }
    }

    async fn save_with_retry(&self, session: &Session) -> HdevResult<()> {
        let mut attempt = 1;
        loop {
            match self.store.save(session).await {
                Ok(()) => {
                    debug!(session_id = %session.id(), attempt, "Session saved");
                    return Ok(());
                }
                Err(e) if attempt < self.save_attempts => {
                    warn!(
                        session_id = %session.id(),
                        attempt,
                        "Session save failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(self.save_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn warn_not_durable(&self, session_id: &str, error: &HdevError) {
        warn!(session_id = %session_id, "Session is not durable: {}", error);
        self.ui.handle_system_message(&format!(
            "Warning: session {} is not yet durable ({}); it will be saved again on the next flush",
            session_id, error
        ));
    }
}
