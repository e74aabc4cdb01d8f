//! Compaction threshold policy

use hdev_session::ModelSpec;
use serde::{Deserialize, Serialize};

/// Whether `token_count` has reached `threshold_ratio` of the model's window.
///
/// An unknown (zero) context window never triggers compaction.
pub fn should_compact(token_count: u64, model_spec: &ModelSpec, threshold_ratio: f64) -> bool {
    if !model_spec.has_context_window() {
        return false;
    }
    token_count as f64 >= threshold(model_spec, threshold_ratio)
}

fn threshold(model_spec: &ModelSpec, threshold_ratio: f64) -> f64 {
    threshold_ratio * model_spec.context_window as f64
}

/// Snapshot of context window consumption for status display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextUsage {
    pub token_count: u64,
    pub context_window: u64,
    /// Share of the window in use, in percent
    pub usage_percentage: f64,
    /// Token count at which compaction triggers
    pub compaction_threshold: u64,
    pub tokens_until_compaction: u64,
}

impl ContextUsage {
    pub fn new(token_count: u64, model_spec: &ModelSpec, threshold_ratio: f64) -> Self {
        let context_window = model_spec.context_window;
        let usage_percentage = if context_window == 0 {
            0.0
        } else {
            token_count as f64 / context_window as f64 * 100.0
        };
        let compaction_threshold = threshold(model_spec, threshold_ratio).ceil() as u64;

        Self {
            token_count,
            context_window,
            usage_percentage,
            compaction_threshold,
            tokens_until_compaction: compaction_threshold.saturating_sub(token_count),
        }
    }

    /// Whether this snapshot is past the compaction threshold
    pub fn over_threshold(&self) -> bool {
        self.context_window > 0 && self.tokens_until_compaction == 0
    }
}

impl std::fmt::Display for ContextUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} tokens ({:.1}%), {} until compaction",
            self.token_count,
            self.context_window,
            self.usage_percentage,
            self.tokens_until_compaction
        )
    }
}

/// Compute a [`ContextUsage`] snapshot
pub fn context_usage(token_count: u64, model_spec: &ModelSpec, threshold_ratio: f64) -> ContextUsage {
    ContextUsage::new(token_count, model_spec, threshold_ratio)
}
