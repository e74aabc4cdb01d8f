//! Model API seam used by compaction

use crate::error::HdevResult;
use async_trait::async_trait;
use hdev_session::{Message, ModelSpec};

/// The two model calls compaction depends on.
///
/// Both may fail with a transport error; implementations report it as
/// `HdevError::ModelApi` and callers reclassify it for their step.
///
/// # Examples
///
/// ```no_run
/// use hdev_core::llm::ModelApi;
/// use hdev_session::{Message, ModelSpec};
///
/// # async fn example(api: &dyn ModelApi) -> hdev_core::HdevResult<()> {
/// let model = ModelSpec::new("claude-sonnet-4-20250514", 200_000, 64_000);
/// let history = vec![Message::user("Hello")];
/// let tokens = api.count_tokens(&history, &model).await?;
/// println!("{} tokens in context", tokens);
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelApi: Send + Sync {
    /// Count the input tokens `messages` would occupy for `model`
    async fn count_tokens(&self, messages: &[Message], model: &ModelSpec) -> HdevResult<u64>;

    /// Generate one text completion under `system`
    async fn generate(
        &self,
        system: &str,
        messages: &[Message],
        model: &ModelSpec,
    ) -> HdevResult<String>;
}
