//! Model descriptors stored alongside each session

use serde::{Deserialize, Serialize};

/// Price per million tokens (USD)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pricing {
    pub input: f64,
    pub output: f64,
}

/// Price per million cached tokens (USD)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CachePricing {
    pub read: f64,
    pub write: f64,
}

/// Tokenizer, window and pricing descriptor for a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model name sent to the API
    pub title: String,

    /// Context window in tokens; `0` means unknown
    #[serde(default)]
    pub context_window: u64,

    /// Response token budget
    #[serde(default)]
    pub max_tokens: u64,

    #[serde(default)]
    pub pricing: Pricing,

    #[serde(default)]
    pub cache_pricing: CachePricing,
}

impl ModelSpec {
    /// Create a spec with no pricing information
    pub fn new(title: impl Into<String>, context_window: u64, max_tokens: u64) -> Self {
        Self {
            title: title.into(),
            context_window,
            max_tokens,
            pricing: Pricing::default(),
            cache_pricing: CachePricing::default(),
        }
    }

    pub fn with_pricing(mut self, pricing: Pricing, cache_pricing: CachePricing) -> Self {
        self.pricing = pricing;
        self.cache_pricing = cache_pricing;
        self
    }

    /// Whether the context window is known
    pub fn has_context_window(&self) -> bool {
        self.context_window > 0
    }

    /// Look up a built-in model by short name (`sonnet`) or full title
    pub fn builtin(name: &str) -> Option<Self> {
        builtin_models()
            .into_iter()
            .find(|(short, spec)| *short == name || spec.title == name)
            .map(|(_, spec)| spec)
    }
}

fn builtin_models() -> Vec<(&'static str, ModelSpec)> {
    vec![
        (
            "opus",
            ModelSpec::new("claude-opus-4-20250514", 200_000, 32_000).with_pricing(
                Pricing {
                    input: 15.0,
                    output: 75.0,
                },
                CachePricing {
                    read: 1.5,
                    write: 18.75,
                },
            ),
        ),
        (
            "sonnet",
            ModelSpec::new("claude-sonnet-4-20250514", 200_000, 64_000).with_pricing(
                Pricing {
                    input: 3.0,
                    output: 15.0,
                },
                CachePricing {
                    read: 0.3,
                    write: 3.75,
                },
            ),
        ),
        (
            "haiku",
            ModelSpec::new("claude-3-5-haiku-20241022", 200_000, 8_192).with_pricing(
                Pricing {
                    input: 0.8,
                    output: 4.0,
                },
                CachePricing {
                    read: 0.08,
                    write: 1.0,
                },
            ),
        ),
    ]
}
