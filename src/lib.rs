//! # ccmon - Claude Code Usage Monitor
//!
//! Analyzes token usage, cost, and activity from Claude Code's local
//! session logs (JSONL files under `~/.claude/projects/`).
//!
//! ## Architecture
//!
//! - [`data_loader`]: discovers session files and streams raw records
//! - [`session_parser`]: deduplicates and aggregates records by session,
//!   project, and model
//! - [`analyzer`]: prices aggregates using the static rate table
//! - [`time_filter`]: half-open calendar windows applied per record
//! - [`output`]: table and JSON rendering of the reports
//!
//! ## Quick Start
//!
//! ```no_run
//! use ccmon::{
//!     analyzer::TokenAnalyzer, data_loader::DataLoader, session_parser::SessionParser,
//!     time_filter::TimeFilter,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> ccmon::Result<()> {
//! let parser = Arc::new(SessionParser::new(DataLoader::new().await?));
//! let analyzer = TokenAnalyzer::new(parser, TimeFilter::all());
//! let summary = analyzer.get_summary().await?;
//! println!("Total cost: ${:.2}", summary.total_cost());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod data_loader;
pub mod error;
pub mod output;
pub mod pricing;
pub mod session_parser;
pub mod time_filter;
pub mod types;

pub use analyzer::{CostBreakdown, TokenAnalyzer, TokenSummary};
pub use data_loader::DataLoader;
pub use error::{MonitorError, Result};
pub use session_parser::{SessionParser, SessionStats};
pub use time_filter::{RangePreset, TimeFilter};
pub use types::{ModelName, SessionId, TokenUsage, UsageRecord};

/// Version of the ccmon crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
