//! Aggregated token usage and cost

use hdev_session::UsageRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Token and cost totals for one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// Tokens served from the prompt cache
    pub cached_tokens: u64,
    /// Cost in USD
    pub total_cost: f64,
}

impl ModelUsage {
    fn add(&mut self, record: &UsageRecord) {
        self.total_input_tokens += record.usage.input_tokens;
        self.total_output_tokens += record.usage.output_tokens;
        self.cached_tokens += record.usage.cache_read_input_tokens;
        self.total_cost += record.cost_usd();
    }
}

/// Usage across a conversation, with a per-model breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub cached_tokens: u64,
    pub total_cost: f64,
    pub model_breakdown: BTreeMap<String, ModelUsage>,
}

impl UsageSummary {
    /// Aggregate a sequence of usage records
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.total_input_tokens += record.usage.input_tokens;
            summary.total_output_tokens += record.usage.output_tokens;
            summary.cached_tokens += record.usage.cache_read_input_tokens;
            summary.total_cost += record.cost_usd();
            summary
                .model_breakdown
                .entry(record.model_spec.title.clone())
                .or_default()
                .add(record);
        }
        summary
    }
}
