//! Conversation summarization for compaction

use super::accountant::{TokenAccountant, render_transcript};
use super::types::CompactionSummary;
use crate::error::{HdevError, HdevResult};
use crate::llm::ModelApi;
use hdev_session::{Message, ModelSpec};
use std::sync::Arc;
use tracing::debug;

/// Response budget for one summary
pub const SUMMARY_MAX_TOKENS: u64 = 4000;

/// System prompt for the summarization request
pub const SUMMARY_SYSTEM_PROMPT: &str = "\
Summarize the following conversation for continuity.
Include:
1. Key points and decisions
2. Current state of development/discussion
3. Any outstanding questions or tasks
4. The most recent context that future messages will reference

Be comprehensive yet concise. The summary will be used to start a new conversation \
that continues where this one left off.";

/// Produces one summary text for a full conversation history
#[derive(Clone)]
pub struct Summarizer {
    api: Arc<dyn ModelApi>,
    accountant: TokenAccountant,
    max_tokens: u64,
}

impl Summarizer {
    pub fn new(api: Arc<dyn ModelApi>) -> Self {
        Self {
            accountant: TokenAccountant::new(api.clone()),
            api,
            max_tokens: SUMMARY_MAX_TOKENS,
        }
    }

    /// Set the response budget
    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Summarize `messages`, counting the original tokens first
    pub async fn summarize(
        &self,
        messages: &[Message],
        model_spec: &ModelSpec,
    ) -> HdevResult<CompactionSummary> {
        let original_token_count = self.accountant.count_tokens(messages, model_spec).await?;
        self.summarize_counted(messages, model_spec, original_token_count)
            .await
    }

    /// Summarize `messages` whose token count is already known.
    ///
    /// Fails with `HdevError::Summarization` when generation fails or the
    /// response is blank, and with `HdevError::TokenCounting` when the summary
    /// itself cannot be counted.
    pub async fn summarize_counted(
        &self,
        messages: &[Message],
        model_spec: &ModelSpec,
        original_token_count: u64,
    ) -> HdevResult<CompactionSummary> {
        let request = vec![Message::user(render_transcript(messages))];
        let model = self.request_model(model_spec);

        let response = self
            .api
            .generate(SUMMARY_SYSTEM_PROMPT, &request, &model)
            .await
            .map_err(|e| match e {
                HdevError::Summarization(_) => e,
                other => HdevError::summarization(other.to_string()),
            })?;

        let summary = extract_summary(&response);
        if summary.is_empty() {
            return Err(HdevError::summarization("model returned an empty summary"));
        }

        let summary_token_count = self
            .accountant
            .count_tokens(&[Message::user(summary.clone())], model_spec)
            .await?;

        debug!(
            original_tokens = original_token_count,
            summary_tokens = summary_token_count,
            "Generated conversation summary"
        );

        Ok(CompactionSummary::new(
            messages.len(),
            original_token_count,
            summary_token_count,
            summary,
        ))
    }

    fn request_model(&self, model_spec: &ModelSpec) -> ModelSpec {
        let mut model = model_spec.clone();
        model.max_tokens = if model.max_tokens == 0 {
            self.max_tokens
        } else {
            model.max_tokens.min(self.max_tokens)
        };
        model
    }
}

/// Extract the summary text, unwrapping `<summary>` tags when present
pub fn extract_summary(response: &str) -> String {
    if let Some(start) = response.find("<summary>") {
        let body = &response[start + "<summary>".len()..];
        if let Some(end) = body.find("</summary>") {
            return body[..end].trim().to_string();
        }
    }
    response.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockModelApi;
    use hdev_session::Role;

    fn model() -> ModelSpec {
        ModelSpec::new("m", 100_000, 64_000)
    }

    fn history() -> Vec<Message> {
        vec![Message::user("Add a cache"), Message::assistant("Done.")]
    }

    #[test]
    fn test_extract_summary() {
        let with_tags = "<analysis>thinking...</analysis>\n<summary>\nThe actual summary\n</summary>\nextra";
        assert_eq!(extract_summary(with_tags), "The actual summary");
        assert_eq!(extract_summary("  Just a plain summary \n"), "Just a plain summary");
        assert_eq!(extract_summary("<summary>unterminated"), "<summary>unterminated");
    }

    #[tokio::test]
    async fn test_summarize_builds_single_transcript_request() {
        let mut api = MockModelApi::new();
        api.expect_count_tokens()
            .times(2)
            .returning(|messages, _| Ok(if messages.len() == 2 { 1000 } else { 50 }));
        api.expect_generate()
            .times(1)
            .withf(|system, messages, model| {
                system == SUMMARY_SYSTEM_PROMPT
                    && messages.len() == 1
                    && messages[0].role == Role::User
                    && messages[0].text() == "user: Add a cache\n\nassistant: Done.\n\n"
                    && model.max_tokens == SUMMARY_MAX_TOKENS
            })
            .returning(|_, _, _| Ok("<summary>Cache added.</summary>".to_string()));

        let summary = Summarizer::new(Arc::new(api))
            .summarize(&history(), &model())
            .await
            .unwrap();

        assert_eq!(summary.summary, "Cache added.");
        assert_eq!(summary.original_message_count, 2);
        assert_eq!(summary.original_token_count, 1000);
        assert_eq!(summary.summary_token_count, 50);
        assert_eq!(summary.compaction_ratio, 0.05);
    }

    #[tokio::test]
    async fn test_blank_response_is_an_error() {
        let mut api = MockModelApi::new();
        api.expect_generate()
            .returning(|_, _, _| Ok("  \n ".to_string()));
        api.expect_count_tokens().never();

        let err = Summarizer::new(Arc::new(api))
            .summarize_counted(&history(), &model(), 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, HdevError::Summarization(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_summarization_error() {
        let mut api = MockModelApi::new();
        api.expect_generate()
            .returning(|_, _, _| Err(HdevError::model_api("503 overloaded")));

        let err = Summarizer::new(Arc::new(api))
            .summarize_counted(&history(), &model(), 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, HdevError::Summarization(_)));
        assert!(err.to_string().contains("503 overloaded"));
    }

    #[tokio::test]
    async fn test_summary_count_failure_aborts() {
        let mut api = MockModelApi::new();
        api.expect_generate()
            .returning(|_, _, _| Ok("A summary".to_string()));
        api.expect_count_tokens()
            .returning(|_, _| Err(HdevError::model_api("timeout")));

        let err = Summarizer::new(Arc::new(api))
            .summarize_counted(&history(), &model(), 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, HdevError::TokenCounting(_)));
    }

    #[test]
    fn test_request_model_caps_max_tokens() {
        let summarizer = Summarizer::new(Arc::new(MockModelApi::new()));
        assert_eq!(summarizer.request_model(&model()).max_tokens, 4000);
        assert_eq!(
            summarizer
                .request_model(&ModelSpec::new("small", 8000, 1024))
                .max_tokens,
            1024
        );
        assert_eq!(
            summarizer
                .request_model(&ModelSpec::new("unknown", 0, 0))
                .max_tokens,
            4000
        );
    }
}
