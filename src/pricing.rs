//! Model pricing table
//!
//! Claude API pricing by model, declared as data so new models can be added
//! without touching aggregation logic. Rates are USD per million tokens.
//! The Sonnet entry is the designated default: it is the fallback for
//! unrecognized model identifiers and the reference rate for cache-savings
//! estimates.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Per-million-token rates for one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// Cost per million input tokens in USD
    pub input_per_mtok: f64,
    /// Cost per million output tokens in USD
    pub output_per_mtok: f64,
    /// Cost per million cache-write tokens in USD
    pub cache_write_per_mtok: f64,
    /// Cost per million cache-read tokens in USD
    pub cache_read_per_mtok: f64,
}

/// Model whose rates are used for unknown models and savings estimates
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

// Rates as of 2025, https://www.anthropic.com/pricing
const PRICING_TABLE: &[(&str, ModelPricing)] = &[
    (
        "claude-sonnet-4-5-20250929",
        ModelPricing {
            input_per_mtok: 3.00,
            output_per_mtok: 15.00,
            cache_write_per_mtok: 3.75,
            cache_read_per_mtok: 0.30,
        },
    ),
    (
        "claude-haiku-4-5-20251001",
        ModelPricing {
            input_per_mtok: 1.00,
            output_per_mtok: 5.00,
            cache_write_per_mtok: 1.25,
            cache_read_per_mtok: 0.10,
        },
    ),
    (
        "claude-opus-4-20250514",
        ModelPricing {
            input_per_mtok: 15.00,
            output_per_mtok: 75.00,
            cache_write_per_mtok: 18.75,
            cache_read_per_mtok: 1.50,
        },
    ),
];

static PRICING_MAP: Lazy<HashMap<&'static str, &'static ModelPricing>> =
    Lazy::new(|| PRICING_TABLE.iter().map(|(name, p)| (*name, p)).collect());

/// Pricing for the default model
pub fn default_pricing() -> &'static ModelPricing {
    PRICING_MAP
        .get(DEFAULT_MODEL)
        .expect("default model must be present in the pricing table")
}

/// Look up pricing for a model, falling back to the default entry
///
/// An unknown or absent model identifier is never an error; it is priced at
/// the default model's rates.
pub fn pricing_for(model: Option<&str>) -> &'static ModelPricing {
    model
        .and_then(|name| PRICING_MAP.get(name).copied())
        .unwrap_or_else(default_pricing)
}
