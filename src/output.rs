//! Output formatting for reports
//!
//! Two interchangeable formatters behind the [`OutputFormatter`] trait:
//! human-readable tables via `prettytable` with `colored` accents, and
//! machine-readable JSON via `serde_json`. All currency values are rounded
//! to display precision here and nowhere earlier.

use crate::analyzer::{ModelUsage, TokenSummary, format_token_count};
use crate::session_parser::SessionStats;
use crate::types::{ModelName, SessionId};
use colored::Colorize;
use prettytable::{Table, format, row};
use serde_json::json;
use std::collections::BTreeMap;

/// Trait for formatting report output
pub trait OutputFormatter {
    /// Format the global usage and cost summary
    fn format_summary(&self, summary: &TokenSummary) -> String;

    /// Format a per-model breakdown
    fn format_models(&self, rows: &[(ModelName, ModelUsage)]) -> String;

    /// Format a per-model breakdown nested under each project
    fn format_models_by_project(&self, rows: &[(String, Vec<(ModelName, ModelUsage)>)]) -> String;

    /// Format a per-project breakdown
    fn format_projects(&self, rows: &[(String, TokenSummary)]) -> String;

    /// Format per-session statistics
    fn format_sessions(&self, sessions: &BTreeMap<SessionId, SessionStats>) -> String;
}

/// Table formatter for terminal display
pub struct TableFormatter;

/// JSON formatter for machine consumption
pub struct JsonFormatter;

/// Get the appropriate formatter for the requested output mode
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}

/// Format a count with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Format a USD amount to cent precision
fn format_currency(amount: f64) -> String {
    format!("${amount:.2}")
}

impl OutputFormatter for TableFormatter {
    fn format_summary(&self, summary: &TokenSummary) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\n", "Usage Summary".bold().underline()));

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        let tokens = &summary.total_tokens;
        table.add_row(row![b -> "Input tokens", r -> format_number(tokens.input_tokens)]);
        table.add_row(row![b -> "Output tokens", r -> format_number(tokens.output_tokens)]);
        table.add_row(
            row![b -> "Cache write tokens", r -> format_number(tokens.cache_creation_input_tokens)],
        );
        table.add_row(
            row![b -> "Cache read tokens", r -> format_number(tokens.cache_read_input_tokens)],
        );
        table.add_row(row![b -> "Total tokens", r -> format_number(tokens.total())]);
        output.push_str(&table.to_string());

        output.push_str(&format!(
            "\n{} {}\n",
            "Estimated cost:".bold(),
            format_currency(summary.total_cost()).green()
        ));
        output.push_str(&format!(
            "{} {:.1}% (saved {})\n",
            "Cache efficiency:".bold(),
            summary.cache_efficiency_pct,
            format_currency(summary.cache_savings()).cyan()
        ));

        output
    }

    fn format_models(&self, rows: &[(ModelName, ModelUsage)]) -> String {
        if rows.is_empty() {
            return "No model usage found for the selected range.\n".to_string();
        }

        let mut output = String::new();
        output.push_str(&format!("\n{}\n", "Usage by Model".bold().underline()));
        output.push_str(&model_table(rows).to_string());
        output
    }

    fn format_models_by_project(&self, rows: &[(String, Vec<(ModelName, ModelUsage)>)]) -> String {
        if rows.is_empty() {
            return "No model usage found for the selected range.\n".to_string();
        }

        let mut output = String::new();
        for (project, models) in rows {
            output.push_str(&format!("\n{}\n", project.bold().underline()));
            output.push_str(&model_table(models).to_string());
        }
        output
    }

    fn format_projects(&self, rows: &[(String, TokenSummary)]) -> String {
        if rows.is_empty() {
            return "No project usage found for the selected range.\n".to_string();
        }

        let mut output = String::new();
        output.push_str(&format!("\n{}\n", "Usage by Project".bold().underline()));

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> "Project", b -> "Tokens", b -> "Cache Eff.", b -> "Cost"]);

        for (project, summary) in rows {
            table.add_row(row![
                project,
                r -> format_token_count(summary.total_tokens.total()),
                r -> format!("{:.1}%", summary.cache_efficiency_pct),
                r -> format_currency(summary.total_cost()),
            ]);
        }

        output.push_str(&table.to_string());
        output
    }

    fn format_sessions(&self, sessions: &BTreeMap<SessionId, SessionStats>) -> String {
        if sessions.is_empty() {
            return "No sessions found for the selected range.\n".to_string();
        }

        let mut output = String::new();
        output.push_str(&format!("\n{}\n", "Sessions".bold().underline()));

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(
            row![b -> "Session", b -> "Messages", b -> "Commands", b -> "Tokens"],
        );

        for (session_id, stats) in sorted_by_tokens(sessions) {
            table.add_row(row![
                session_id.as_str(),
                r -> format_number(stats.message_count),
                r -> format_number(stats.command_count),
                r -> format_token_count(stats.total_tokens.total()),
            ]);
        }

        output.push_str(&table.to_string());
        output.push_str(&format!("\nTotal sessions: {}\n", sessions.len()));
        output
    }
}

/// Shared per-model table used by both model reports
fn model_table(rows: &[(ModelName, ModelUsage)]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(
        row![b -> "Model", b -> "Input", b -> "Output", b -> "Cache Write", b -> "Cache Read", b -> "Cost"],
    );

    for (model, usage) in rows {
        table.add_row(row![
            model.as_str(),
            r -> format_token_count(usage.tokens.input_tokens),
            r -> format_token_count(usage.tokens.output_tokens),
            r -> format_token_count(usage.tokens.cache_creation_input_tokens),
            r -> format_token_count(usage.tokens.cache_read_input_tokens),
            r -> format_currency(usage.cost),
        ]);
    }

    table
}

/// Order sessions by token volume descending, session ID ascending on ties
fn sorted_by_tokens(
    sessions: &BTreeMap<SessionId, SessionStats>,
) -> Vec<(&SessionId, &SessionStats)> {
    let mut rows: Vec<_> = sessions.iter().collect();
    rows.sort_by(|a, b| {
        b.1.total_tokens
            .total()
            .cmp(&a.1.total_tokens.total())
            .then_with(|| a.0.cmp(b.0))
    });
    rows
}

impl OutputFormatter for JsonFormatter {
    fn format_summary(&self, summary: &TokenSummary) -> String {
        let value = json!({
            "tokens": summary.total_tokens,
            "cost": {
                "input": summary.cost_breakdown.input_cost,
                "output": summary.cost_breakdown.output_cost,
                "cache_write": summary.cost_breakdown.cache_write_cost,
                "cache_read": summary.cost_breakdown.cache_read_cost,
                "total": summary.total_cost(),
            },
            "cache_efficiency_pct": summary.cache_efficiency_pct,
            "cache_savings": summary.cache_savings(),
        });
        to_pretty(&value)
    }

    fn format_models(&self, rows: &[(ModelName, ModelUsage)]) -> String {
        let models: Vec<_> = rows.iter().map(|(m, u)| model_json(m, u)).collect();
        to_pretty(&json!({ "models": models }))
    }

    fn format_models_by_project(&self, rows: &[(String, Vec<(ModelName, ModelUsage)>)]) -> String {
        let projects: Vec<_> = rows
            .iter()
            .map(|(project, models)| {
                let models: Vec<_> = models.iter().map(|(m, u)| model_json(m, u)).collect();
                json!({ "project": project, "models": models })
            })
            .collect();
        to_pretty(&json!({ "projects": projects }))
    }

    fn format_projects(&self, rows: &[(String, TokenSummary)]) -> String {
        let projects: Vec<_> = rows
            .iter()
            .map(|(project, summary)| {
                json!({
                    "project": project,
                    "tokens": summary.total_tokens,
                    "total_cost": summary.total_cost(),
                    "cache_efficiency_pct": summary.cache_efficiency_pct,
                })
            })
            .collect();
        to_pretty(&json!({ "projects": projects }))
    }

    fn format_sessions(&self, sessions: &BTreeMap<SessionId, SessionStats>) -> String {
        let rows: Vec<_> = sorted_by_tokens(sessions)
            .into_iter()
            .map(|(session_id, stats)| {
                json!({
                    "session_id": session_id.as_str(),
                    "messages": stats.message_count,
                    "commands": stats.command_count,
                    "tokens": stats.total_tokens,
                })
            })
            .collect();
        to_pretty(&json!({ "sessions": rows, "count": sessions.len() }))
    }
}

fn model_json(model: &ModelName, usage: &ModelUsage) -> serde_json::Value {
    json!({
        "model": model.as_str(),
        "tokens": usage.tokens,
        "cost": usage.cost,
    })
}

fn to_pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).expect("JSON values serialize")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::CostBreakdown;
    use crate::types::TokenUsage;

    fn sample_summary() -> TokenSummary {
        TokenSummary {
            total_tokens: TokenUsage::new(1_234_567, 89_000, 10_000, 40_000),
            cost_breakdown: CostBreakdown {
                input_cost: 3.70,
                output_cost: 1.34,
                cache_write_cost: 0.04,
                cache_read_cost: 0.01,
            },
            cache_efficiency_pct: 3.1,
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(5.089), "$5.09");
        assert_eq!(format_currency(1234.5), "$1234.50");
    }

    #[test]
    fn test_table_summary_contains_totals() {
        let output = TableFormatter.format_summary(&sample_summary());
        assert!(output.contains("1,234,567"));
        assert!(output.contains("$5.09"));
    }

    #[test]
    fn test_json_summary_round_trips() {
        let output = JsonFormatter.format_summary(&sample_summary());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["tokens"]["input_tokens"], 1_234_567);
        assert!((value["cost"]["total"].as_f64().unwrap() - 5.09).abs() < 0.001);
    }

    #[test]
    fn test_empty_model_rows_message() {
        let output = TableFormatter.format_models(&[]);
        assert!(output.contains("No model usage"));
    }

    #[test]
    fn test_json_sessions_sorted_by_volume() {
        let mut sessions = BTreeMap::new();
        let mut small = SessionStats::default();
        small.total_tokens = TokenUsage::new(10, 0, 0, 0);
        let mut large = SessionStats::default();
        large.total_tokens = TokenUsage::new(1000, 0, 0, 0);
        sessions.insert(SessionId::new("a-small"), small);
        sessions.insert(SessionId::new("b-large"), large);

        let output = JsonFormatter.format_sessions(&sessions);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["sessions"][0]["session_id"], "b-large");
        assert_eq!(value["count"], 2);
    }
}
