//! Session aggregation over raw usage records
//!
//! The [`SessionParser`] is the sole translator from raw, possibly
//! redundant log records into clean aggregate statistics. It deduplicates
//! records by their stable identity, applies an optional [`TimeFilter`]
//! per record, and groups token usage by session, project, and model.
//!
//! Every query performs a full re-scan of the log store; for a fixed
//! snapshot and filter the results are identical across calls, including
//! over inputs that contain the same logical event more than once.
//!
//! # Examples
//!
//! ```no_run
//! use ccmon::{data_loader::DataLoader, session_parser::SessionParser, time_filter::TimeFilter};
//!
//! # async fn example() -> ccmon::Result<()> {
//! let parser = SessionParser::new(DataLoader::new().await?);
//! let stats = parser.get_stats(&TimeFilter::all()).await?;
//! println!("{} tokens total", stats.total_tokens.total());
//! # Ok(())
//! # }
//! ```

use crate::data_loader::DataLoader;
use crate::error::Result;
use crate::time_filter::TimeFilter;
use crate::types::{EventKind, ModelName, SessionId, TokenUsage, UsageRecord};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Aggregate statistics for one grouping unit
///
/// Used for the grand total, for a single session, and for a project; the
/// shape is identical. `total_tokens` carries every counted record's
/// tokens; `model_usage` splits the same tokens by model for the records
/// that carried a model identifier.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SessionStats {
    /// Token usage per model observed in this group
    pub model_usage: BTreeMap<ModelName, TokenUsage>,
    /// Total token usage for the group
    pub total_tokens: TokenUsage,
    /// Number of message events
    pub message_count: u64,
    /// Number of slash-command events
    pub command_count: u64,
}

impl SessionStats {
    fn add_record(&mut self, record: &UsageRecord) {
        self.total_tokens += record.tokens;
        if let Some(model) = &record.model {
            *self.model_usage.entry(model.clone()).or_default() += record.tokens;
        }
        match record.kind {
            EventKind::Message => self.message_count += 1,
            EventKind::Command => self.command_count += 1,
            EventKind::Other => {}
        }
    }
}

/// Result of one full aggregation pass
#[derive(Debug, Default)]
struct ParseOutcome {
    totals: SessionStats,
    sessions: BTreeMap<SessionId, SessionStats>,
    projects: BTreeMap<String, SessionStats>,
    /// First project path observed per session; a session never re-homes
    session_project: HashMap<SessionId, String>,
}

impl ParseOutcome {
    /// Feed one record through dedup, filter, and grouping
    fn observe(&mut self, record: &UsageRecord, seen: &mut HashSet<String>, filter: &TimeFilter) {
        if let Some(id) = &record.record_id
            && !seen.insert(id.clone())
        {
            return;
        }

        if !filter.includes(record.timestamp.inner()) {
            return;
        }

        let project = self
            .session_project
            .entry(record.session_id.clone())
            .or_insert_with(|| record.project_path.clone())
            .clone();

        self.totals.add_record(record);
        self.sessions
            .entry(record.session_id.clone())
            .or_default()
            .add_record(record);
        self.projects.entry(project).or_default().add_record(record);
    }
}

/// Translates raw log records into aggregate statistics
pub struct SessionParser {
    loader: DataLoader,
    show_progress: bool,
}

impl SessionParser {
    /// Create a new SessionParser over a data loader
    pub fn new(loader: DataLoader) -> Self {
        Self {
            loader,
            show_progress: false,
        }
    }

    /// Enable or disable the scan progress spinner
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Aggregate statistics across all sessions
    pub async fn get_stats(&self, filter: &TimeFilter) -> Result<SessionStats> {
        Ok(self.collect(filter).await?.totals)
    }

    /// Aggregate statistics per session
    pub async fn get_session_stats(
        &self,
        filter: &TimeFilter,
    ) -> Result<BTreeMap<SessionId, SessionStats>> {
        Ok(self.collect(filter).await?.sessions)
    }

    /// Aggregate statistics per project
    ///
    /// A session belongs to exactly one project: the first project path
    /// observed for it during the scan.
    pub async fn get_project_stats(
        &self,
        filter: &TimeFilter,
    ) -> Result<BTreeMap<String, SessionStats>> {
        Ok(self.collect(filter).await?.projects)
    }

    /// Run one full scan-and-aggregate pass over the log store
    async fn collect(&self, filter: &TimeFilter) -> Result<ParseOutcome> {
        let mut outcome = ParseOutcome::default();
        let mut seen = HashSet::new();

        let progress = if self.show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} [{elapsed_precise}] {pos} records")
                    .expect("valid progress template"),
            );
            pb.set_message("Scanning session logs");
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };

        let records = self.loader.load_usage_records();
        tokio::pin!(records);

        while let Some(result) = records.next().await {
            let record = result?;
            if let Some(pb) = &progress {
                pb.inc(1);
            }
            outcome.observe(&record, &mut seen, filter);
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        tracing::debug!(
            "Aggregated {} sessions across {} projects",
            outcome.sessions.len(),
            outcome.projects.len()
        );
        Ok(outcome)
    }
}
