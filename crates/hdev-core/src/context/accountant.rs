//! Token accounting through the model API

use crate::error::{HdevError, HdevResult};
use crate::llm::ModelApi;
use hdev_session::{ContentBlock, Message, MessageContent, ModelSpec};
use std::fmt::Write;
use std::sync::Arc;

/// Counts context tokens with the provider's tokenizer
#[derive(Clone)]
pub struct TokenAccountant {
    api: Arc<dyn ModelApi>,
}

impl TokenAccountant {
    pub fn new(api: Arc<dyn ModelApi>) -> Self {
        Self { api }
    }

    /// Count the tokens `messages` occupy for `model`.
    ///
    /// Any failure is reported as `HdevError::TokenCounting`.
    pub async fn count_tokens(&self, messages: &[Message], model: &ModelSpec) -> HdevResult<u64> {
        self.api
            .count_tokens(messages, model)
            .await
            .map_err(|e| match e {
                HdevError::TokenCounting(_) => e,
                other => HdevError::token_counting(other.to_string()),
            })
    }
}

/// Render messages as a plain-text transcript, one `role: content` paragraph
/// per message.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut transcript = String::new();
    for message in messages {
        let body = match &message.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .map(render_block)
                .collect::<Vec<_>>()
                .join("\n"),
        };
        let _ = write!(transcript, "{}: {}\n\n", message.role, body);
    }
    transcript
}

fn render_block(block: &ContentBlock) -> String {
    match block {
        ContentBlock::Text { text } => text.clone(),
        ContentBlock::ToolUse { name, input, .. } => {
            format!("[Tool Use: {}]\n{}", name, input)
        }
        ContentBlock::ToolResult { content, .. } => format!("[Tool Result]\n{}", content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockModelApi;
    use serde_json::json;

    #[test]
    fn test_render_transcript() {
        let messages = vec![
            Message::user("List the files"),
            Message::assistant_blocks(vec![
                ContentBlock::text("Looking."),
                ContentBlock::tool_use("t1", "list_directory", json!({"path": "."})),
            ]),
            Message::tool_results(vec![ContentBlock::tool_result("t1", "Cargo.toml")]),
        ];

        let transcript = render_transcript(&messages);
        assert_eq!(
            transcript,
            "user: List the files\n\n\
             assistant: Looking.\n[Tool Use: list_directory]\n{\"path\":\".\"}\n\n\
             tool-result: [Tool Result]\nCargo.toml\n\n"
        );
    }

    #[tokio::test]
    async fn test_transport_errors_become_counting_errors() {
        let mut api = MockModelApi::new();
        api.expect_count_tokens()
            .returning(|_, _| Err(HdevError::model_api("connection reset")));

        let accountant = TokenAccountant::new(Arc::new(api));
        let model = ModelSpec::new("m", 1000, 100);
        let err = accountant
            .count_tokens(&[Message::user("hi")], &model)
            .await
            .unwrap_err();
        assert!(matches!(err, HdevError::TokenCounting(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_count_is_passed_through() {
        let mut api = MockModelApi::new();
        api.expect_count_tokens().times(1).returning(|_, _| Ok(321));

        let accountant = TokenAccountant::new(Arc::new(api));
        let model = ModelSpec::new("m", 1000, 100);
        assert_eq!(
            accountant.count_tokens(&[Message::user("hi")], &model).await.unwrap(),
            321
        );
    }
}
