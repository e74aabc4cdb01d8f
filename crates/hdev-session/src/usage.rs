//! Per-call token usage records

use crate::ModelSpec;
use serde::{Deserialize, Serialize};

/// Token counts reported for one model API call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            ..Default::default()
        }
    }

    pub fn with_cache(mut self, creation: u64, read: u64) -> Self {
        self.cache_creation_input_tokens = creation;
        self.cache_read_input_tokens = read;
        self
    }
}

/// Usage of one call together with the model it was billed under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub usage: TokenUsage,
    pub model_spec: ModelSpec,
}

impl UsageRecord {
    pub fn new(usage: TokenUsage, model_spec: ModelSpec) -> Self {
        Self { usage, model_spec }
    }

    /// Cost of this call in USD
    pub fn cost_usd(&self) -> f64 {
        let pricing = self.model_spec.pricing;
        let cache = self.model_spec.cache_pricing;
        let micro = self.usage.input_tokens as f64 * pricing.input
            + self.usage.output_tokens as f64 * pricing.output
            + self.usage.cache_read_input_tokens as f64 * cache.read
            + self.usage.cache_creation_input_tokens as f64 * cache.write;
        micro / 1_000_000.0
    }
}
