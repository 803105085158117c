//! Token cost analysis over session aggregates
//!
//! The [`TokenAnalyzer`] is a stateless pricing layer on top of
//! [`SessionParser`]: it converts token counts into cost breakdowns per
//! model, merges per-model costs into global and per-project summaries,
//! and computes cache-derived savings. It holds a parser and a time filter
//! but computes nothing until queried; every query re-derives its result
//! from the log store.
//!
//! Costs are exact products of token counts and per-million-token rates.
//! No currency rounding happens here; rounding to display precision is the
//! presentation layer's concern.

use crate::error::Result;
use crate::pricing;
use crate::session_parser::{SessionParser, SessionStats};
use crate::time_filter::TimeFilter;
use crate::types::{ModelName, TokenUsage};
use serde::Serialize;
use std::cmp::Ordering;
use std::ops::AddAssign;
use std::sync::Arc;
use tracing::debug;

/// Costs split by token category, in USD
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CostBreakdown {
    /// Cost of regular input tokens
    pub input_cost: f64,
    /// Cost of output tokens
    pub output_cost: f64,
    /// Cost of cache-write tokens
    pub cache_write_cost: f64,
    /// Cost of cache-read tokens
    pub cache_read_cost: f64,
}

impl CostBreakdown {
    /// Total cost across all token categories
    pub fn total_cost(&self) -> f64 {
        self.input_cost + self.output_cost + self.cache_write_cost + self.cache_read_cost
    }

    /// Savings from cache hits, estimated at the default model's rates
    pub fn cache_savings(&self) -> f64 {
        estimate_cache_savings_at_default_rate(self.cache_read_cost)
    }
}

impl AddAssign for CostBreakdown {
    fn add_assign(&mut self, other: Self) {
        self.input_cost += other.input_cost;
        self.output_cost += other.output_cost;
        self.cache_write_cost += other.cache_write_cost;
        self.cache_read_cost += other.cache_read_cost;
    }
}

/// Estimate what cache reads saved versus paying regular input rates
///
/// Always computed from the DEFAULT pricing entry, regardless of which
/// model actually produced `cache_read_cost`. That couples the estimate to
/// the default model's rates even for differently-priced models; it is the
/// established behavior of this tool, kept here behind one function so a
/// per-model correction stays a localized change.
///
/// Non-negative whenever `cache_read_cost >= 0`, since the default entry's
/// input rate is at least its cache-read rate.
pub fn estimate_cache_savings_at_default_rate(cache_read_cost: f64) -> f64 {
    let default = pricing::default_pricing();
    (cache_read_cost / default.cache_read_per_mtok) * default.input_per_mtok - cache_read_cost
}

/// Summary of token usage and costs for one scope
#[derive(Debug, Clone, Serialize)]
pub struct TokenSummary {
    /// Aggregated token usage
    pub total_tokens: TokenUsage,
    /// Cost breakdown for that usage
    pub cost_breakdown: CostBreakdown,
    /// Share of input-side tokens served from cache
    pub cache_efficiency_pct: f64,
}

impl TokenSummary {
    /// Total estimated cost
    pub fn total_cost(&self) -> f64 {
        self.cost_breakdown.total_cost()
    }

    /// Savings from cache efficiency
    pub fn cache_savings(&self) -> f64 {
        self.cost_breakdown.cache_savings()
    }
}

/// Per-model usage row in a breakdown
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelUsage {
    /// Token usage attributed to the model
    pub tokens: TokenUsage,
    /// Total cost at the model's rates
    pub cost: f64,
}

/// Analyzer for token usage and cost calculations
pub struct TokenAnalyzer {
    parser: Arc<SessionParser>,
    time_filter: TimeFilter,
}

impl TokenAnalyzer {
    /// Create a new analyzer over a parser and time filter
    pub fn new(parser: Arc<SessionParser>, time_filter: TimeFilter) -> Self {
        Self {
            parser,
            time_filter,
        }
    }

    /// Calculate the cost breakdown for token usage under a model's rates
    ///
    /// Unknown or absent model identifiers are priced at the default
    /// entry; this is never an error.
    pub fn calculate_cost(tokens: &TokenUsage, model: Option<&str>) -> CostBreakdown {
        let rates = pricing::pricing_for(model);

        let breakdown = CostBreakdown {
            input_cost: tokens.input_tokens as f64 / 1_000_000.0 * rates.input_per_mtok,
            output_cost: tokens.output_tokens as f64 / 1_000_000.0 * rates.output_per_mtok,
            cache_write_cost: tokens.cache_creation_input_tokens as f64 / 1_000_000.0
                * rates.cache_write_per_mtok,
            cache_read_cost: tokens.cache_read_input_tokens as f64 / 1_000_000.0
                * rates.cache_read_per_mtok,
        };

        debug!(
            "Calculated cost ${:.6} for {} tokens ({})",
            breakdown.total_cost(),
            tokens.total(),
            model.unwrap_or("default pricing"),
        );

        breakdown
    }

    /// Global usage summary with costs calculated per model
    pub async fn get_summary(&self) -> Result<TokenSummary> {
        let stats = self.parser.get_stats(&self.time_filter).await?;
        Ok(Self::summarize(&stats))
    }

    /// Per-model usage and cost, sorted by cost descending
    ///
    /// Equal-cost entries are ordered by model name ascending, so repeated
    /// calls over the same snapshot return the same sequence.
    pub async fn get_model_breakdown(&self) -> Result<Vec<(ModelName, ModelUsage)>> {
        let stats = self.parser.get_stats(&self.time_filter).await?;
        Ok(Self::model_breakdown(&stats))
    }

    /// Per-project summaries, sorted by cost descending
    ///
    /// Each project's cost is computed from its already-merged token total
    /// at the default pricing entry only. Callers needing per-model
    /// accuracy within a project must use
    /// [`get_model_by_project_breakdown`](Self::get_model_by_project_breakdown).
    /// Equal-cost projects are ordered by path ascending.
    pub async fn get_project_breakdown(&self) -> Result<Vec<(String, TokenSummary)>> {
        let project_stats = self.parser.get_project_stats(&self.time_filter).await?;

        let mut rows: Vec<(String, TokenSummary)> = project_stats
            .into_iter()
            .map(|(project, stats)| {
                let cost = Self::calculate_cost(&stats.total_tokens, None);
                let summary = TokenSummary {
                    cache_efficiency_pct: stats.total_tokens.cache_efficiency_percentage(),
                    total_tokens: stats.total_tokens,
                    cost_breakdown: cost,
                };
                (project, summary)
            })
            .collect();

        rows.sort_by(|a, b| {
            cost_descending(a.1.total_cost(), b.1.total_cost()).then_with(|| a.0.cmp(&b.0))
        });
        Ok(rows)
    }

    /// Per-model breakdown nested under each project
    ///
    /// Within a project, models are priced at their own rates and sorted
    /// by cost descending (ties by name ascending); projects are sorted by
    /// their summed model cost descending (ties by path ascending).
    /// Projects with no model-attributed usage are omitted.
    pub async fn get_model_by_project_breakdown(
        &self,
    ) -> Result<Vec<(String, Vec<(ModelName, ModelUsage)>)>> {
        let project_stats = self.parser.get_project_stats(&self.time_filter).await?;

        let mut rows: Vec<(String, Vec<(ModelName, ModelUsage)>)> = project_stats
            .into_iter()
            .filter_map(|(project, stats)| {
                let models = Self::model_breakdown(&stats);
                if models.is_empty() {
                    None
                } else {
                    Some((project, models))
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            let cost_a: f64 = a.1.iter().map(|(_, usage)| usage.cost).sum();
            let cost_b: f64 = b.1.iter().map(|(_, usage)| usage.cost).sum();
            cost_descending(cost_a, cost_b).then_with(|| a.0.cmp(&b.0))
        });
        Ok(rows)
    }

    /// Build a summary pricing each model's usage at its own rates
    fn summarize(stats: &SessionStats) -> TokenSummary {
        let mut cost = CostBreakdown::default();
        for (model, tokens) in &stats.model_usage {
            cost += Self::calculate_cost(tokens, Some(model.as_str()));
        }

        // Tokens recorded without a model identifier are priced at the
        // default entry.
        let unattributed = unattributed_tokens(stats);
        if unattributed.total() > 0 {
            cost += Self::calculate_cost(&unattributed, None);
        }

        TokenSummary {
            total_tokens: stats.total_tokens,
            cost_breakdown: cost,
            cache_efficiency_pct: stats.total_tokens.cache_efficiency_percentage(),
        }
    }

    fn model_breakdown(stats: &SessionStats) -> Vec<(ModelName, ModelUsage)> {
        let mut rows: Vec<(ModelName, ModelUsage)> = stats
            .model_usage
            .iter()
            .map(|(model, tokens)| {
                let cost = Self::calculate_cost(tokens, Some(model.as_str())).total_cost();
                (
                    model.clone(),
                    ModelUsage {
                        tokens: *tokens,
                        cost,
                    },
                )
            })
            .collect();

        rows.sort_by(|a, b| cost_descending(a.1.cost, b.1.cost).then_with(|| a.0.cmp(&b.0)));
        rows
    }
}

/// Tokens counted in the total but not attributed to any model
fn unattributed_tokens(stats: &SessionStats) -> TokenUsage {
    let attributed = stats
        .model_usage
        .values()
        .fold(TokenUsage::default(), |acc, t| acc + *t);
    TokenUsage {
        input_tokens: stats
            .total_tokens
            .input_tokens
            .saturating_sub(attributed.input_tokens),
        output_tokens: stats
            .total_tokens
            .output_tokens
            .saturating_sub(attributed.output_tokens),
        cache_creation_input_tokens: stats
            .total_tokens
            .cache_creation_input_tokens
            .saturating_sub(attributed.cache_creation_input_tokens),
        cache_read_input_tokens: stats
            .total_tokens
            .cache_read_input_tokens
            .saturating_sub(attributed.cache_read_input_tokens),
    }
}

/// NaN-safe descending comparison for cost sorting
fn cost_descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Format a token count in human-readable form
///
/// `1_234_567` renders as `"1.2M"`, `45_600` as `"46K"`, `999` as `"999"`.
pub fn format_token_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.0}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}
