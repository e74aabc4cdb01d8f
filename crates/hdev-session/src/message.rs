//! Conversation message types
//!
//! A [`Message`] is one turn of a conversation. Content is either plain text
//! or a list of [`ContentBlock`]s carrying text, tool invocations and tool
//! results. Messages are never edited once pushed onto a history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Human input
    User,
    /// Model response
    Assistant,
    /// Results of tool calls requested by the assistant
    ToolResult,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::ToolResult => write!(f, "tool-result"),
        }
    }
}

/// One block of structured message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text
    Text { text: String },

    /// Tool invocation requested by the assistant
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Result of a tool invocation
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentBlock {
    /// Create a text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool-use block
    pub fn tool_use(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Create a successful tool-result block
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error: false,
        }
    }
}

/// Message content: plain text or structured blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Iterate over content blocks; plain text is not a block
    pub fn blocks(&self) -> &[ContentBlock] {
        match self {
            MessageContent::Text(_) => &[],
            MessageContent::Blocks(blocks) => blocks,
        }
    }
}

/// Individual conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    pub content: MessageContent,

    /// When the message was created
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: MessageContent) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::Text(content.into()))
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageContent::Text(content.into()))
    }

    /// Create an assistant message with structured blocks (text and tool uses)
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self::new(Role::Assistant, MessageContent::Blocks(blocks))
    }

    /// Create a tool-result message from result blocks
    pub fn tool_results(blocks: Vec<ContentBlock>) -> Self {
        Self::new(Role::ToolResult, MessageContent::Blocks(blocks))
    }

    /// Ids of tool invocations requested in this message
    pub fn tool_use_ids(&self) -> Vec<&str> {
        self.content
            .blocks()
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Ids of tool invocations answered in this message
    pub fn tool_result_ids(&self) -> Vec<&str> {
        self.content
            .blocks()
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Concatenated text blocks (or the plain text content)
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Whether the history ends with tool invocations that have no result yet.
///
/// Only the trailing assistant message and what follows it are inspected;
/// earlier exchanges are assumed complete.
pub fn has_incomplete_tool_use(messages: &[Message]) -> bool {
    let Some(last_assistant) = messages.iter().rposition(|m| m.role == Role::Assistant) else {
        return false;
    };

    let requested: HashSet<&str> = messages[last_assistant].tool_use_ids().into_iter().collect();
    if requested.is_empty() {
        return false;
    }

    let answered: HashSet<&str> = messages[last_assistant + 1..]
        .iter()
        .flat_map(|m| m.tool_result_ids())
        .collect();

    !requested.is_subset(&answered)
}
