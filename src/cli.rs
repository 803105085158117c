//! CLI interface for ccmon
//!
//! Defines the command-line interface using clap: one report subcommand
//! (`summary` when omitted) plus global flags for the time range and
//! output format.
//!
//! # Example
//!
//! ```bash
//! # Usage and cost summary for the current week
//! ccmon summary --range week
//!
//! # Per-model breakdown, machine readable
//! ccmon models --json
//!
//! # Per-project breakdown with per-model rows
//! ccmon models --by-project
//! ```

use clap::{Parser, Subcommand};

/// Analyze Claude Code usage, cost, and activity from local session logs
#[derive(Parser, Debug, Clone)]
#[command(name = "ccmon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only show warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Time range: today, week, month, quarter, year, or all
    ///
    /// Unrecognized values fall back to `all`.
    #[arg(long, short = 'r', default_value = "all", global = true)]
    pub range: String,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Report to run (defaults to `summary`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available reports
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Usage and cost summary across all sessions
    Summary,

    /// Per-model usage and cost breakdown
    Models {
        /// Nest the breakdown under each project
        #[arg(long)]
        by_project: bool,
    },

    /// Per-project usage and cost breakdown
    Projects,

    /// Per-session activity and token usage
    Sessions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["ccmon"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.range, "all");
        assert!(!cli.json);
    }

    #[test]
    fn test_range_flag() {
        let cli = Cli::parse_from(["ccmon", "summary", "--range", "week"]);
        assert_eq!(cli.range, "week");
        assert!(matches!(cli.command, Some(Command::Summary)));
    }

    #[test]
    fn test_models_by_project() {
        let cli = Cli::parse_from(["ccmon", "models", "--by-project", "--json"]);
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Some(Command::Models { by_project: true })
        ));
    }
}
