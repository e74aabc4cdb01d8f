//! Live state of one agent conversation

use super::usage::UsageSummary;
use crate::context::CompactionTransition;
use hdev_session::{
    CompactionMetadata, ContentBlock, Message, ModelSpec, Session, SessionMetadata, TokenUsage,
    UsageRecord, detect_root_dir, new_session_id,
};
use std::path::Path;

/// Mutable conversation state owned by the agent loop.
///
/// Holds everything a [`Session`] persists plus the buffer of tool results
/// that have not yet been folded into the history.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub session_id: String,
    pub parent_session_id: Option<String>,
    pub model_spec: ModelSpec,
    pub usage: Vec<UsageRecord>,
    pub metadata: SessionMetadata,
    /// Set on sessions created by compaction
    pub compaction: Option<CompactionMetadata>,
    messages: Vec<Message>,
    tool_result_buffer: Vec<ContentBlock>,
}

impl AgentContext {
    /// Start a fresh root conversation
    pub fn new(model_spec: ModelSpec) -> Self {
        Self {
            session_id: new_session_id(),
            parent_session_id: None,
            model_spec,
            usage: Vec::new(),
            metadata: SessionMetadata::new(),
            compaction: None,
            messages: Vec::new(),
            tool_result_buffer: Vec::new(),
        }
    }

    /// Record the repository the conversation runs in
    pub fn with_working_dir(mut self, dir: &Path) -> Self {
        self.metadata.root_dir = Some(detect_root_dir(dir));
        self
    }

    /// Record the command line the agent was started with
    pub fn with_cli_args(mut self, args: Vec<String>) -> Self {
        self.metadata.cli_args = Some(args);
        self
    }

    /// Rebuild live state from a stored session; the tool buffer starts empty
    pub fn from_session(session: Session) -> Self {
        Self {
            session_id: session.session_id,
            parent_session_id: session.parent_session_id,
            model_spec: session.model_spec,
            usage: session.usage,
            metadata: session.metadata,
            compaction: session.compaction,
            messages: session.messages,
            tool_result_buffer: Vec::new(),
        }
    }

    /// Snapshot of the persistable state
    pub fn to_session(&self) -> Session {
        Session {
            session_id: self.session_id.clone(),
            parent_session_id: self.parent_session_id.clone(),
            model_spec: self.model_spec.clone(),
            usage: self.usage.clone(),
            messages: self.messages.clone(),
            metadata: self.metadata.clone(),
            compaction: self.compaction.clone(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn tool_result_buffer(&self) -> &[ContentBlock] {
        &self.tool_result_buffer
    }

    /// Append a message to the history
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Hold a tool result until the pending tool uses are all answered
    pub fn buffer_tool_result(&mut self, result: ContentBlock) {
        self.tool_result_buffer.push(result);
    }

    /// Move buffered results into one tool-result message.
    ///
    /// Returns `false` when the buffer was empty.
    pub fn flush_tool_results(&mut self) -> bool {
        if self.tool_result_buffer.is_empty() {
            return false;
        }
        let results = std::mem::take(&mut self.tool_result_buffer);
        self.messages.push(Message::tool_results(results));
        true
    }

    /// Record usage of one model call under the current model
    pub fn report_usage(&mut self, usage: TokenUsage) {
        self.usage
            .push(UsageRecord::new(usage, self.model_spec.clone()));
    }

    pub fn usage_summary(&self) -> UsageSummary {
        UsageSummary::from_records(&self.usage)
    }

    /// Move onto the session described by `transition`.
    ///
    /// The new session keeps the usage history and invocation context but
    /// starts its own timestamps.
    pub(crate) fn apply_transition(&mut self, transition: &CompactionTransition) {
        self.parent_session_id = Some(transition.original_session_id.clone());
        self.session_id = transition.new_session_id.clone();
        self.messages = transition.compacted_messages.clone();
        self.tool_result_buffer.clear();
        self.compaction = Some(transition.compaction_metadata());

        let mut metadata = SessionMetadata::new();
        metadata.root_dir = self.metadata.root_dir.take();
        metadata.cli_args = self.metadata.cli_args.take();
        self.metadata = metadata;
    }
}
