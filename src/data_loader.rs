//! Data loader for discovering and parsing Claude Code session logs
//!
//! Claude Code writes one JSONL file per session under
//! `~/.claude/projects/<project-dir>/<session-id>.jsonl`. The loader
//! discovers those roots and streams parsed [`UsageRecord`]s out of them.
//! The search path can be overridden with the `CLAUDE_DATA_PATH`
//! environment variable.
//!
//! Unparsable lines are logged and skipped; only file access failures
//! propagate as errors.
//!
//! # Examples
//!
//! ```no_run
//! use ccmon::data_loader::DataLoader;
//! use futures::StreamExt;
//!
//! # async fn example() -> ccmon::Result<()> {
//! let loader = DataLoader::new().await?;
//! let records = loader.load_usage_records();
//! tokio::pin!(records);
//! while let Some(record) = records.next().await {
//!     let record = record?;
//!     println!("{}: {} tokens", record.session_id, record.tokens.total());
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{MonitorError, Result};
use crate::types::{RawJsonlEntry, UsageRecord};
use futures::StreamExt;
use futures::stream::Stream;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

/// Discovers Claude Code log roots and streams usage records from them
pub struct DataLoader {
    /// Discovered `projects` roots
    roots: Vec<PathBuf>,
}

impl DataLoader {
    /// Create a new DataLoader by discovering Claude Code data paths
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NoDataDirectory`] if no log root exists.
    pub async fn new() -> Result<Self> {
        let roots = Self::discover_roots();
        if roots.is_empty() {
            return Err(MonitorError::NoDataDirectory);
        }

        debug!("Discovered {} Claude data directories", roots.len());
        Ok(Self { roots })
    }

    /// Create a loader over explicit roots, bypassing discovery
    ///
    /// Used by tests and by callers that manage their own log location.
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Locate Claude Code `projects` directories on this system
    fn discover_roots() -> Vec<PathBuf> {
        let mut roots = Vec::new();

        if let Some(home) = dirs::home_dir() {
            let projects = home.join(".claude").join("projects");
            if projects.is_dir() {
                roots.push(projects);
            }
        }

        // Environment override, useful for archives and tests
        if let Ok(custom) = std::env::var("CLAUDE_DATA_PATH") {
            let path = PathBuf::from(custom);
            if path.is_dir() {
                roots.push(path);
            }
        }

        roots
    }

    /// Find all session JSONL files under the discovered roots
    ///
    /// Returns `(file, project_dir_name)` pairs; the directory name serves
    /// as the fallback project path for records that carry no `cwd`. The
    /// result is sorted so repeated scans visit files in the same order.
    pub async fn find_session_files(&self) -> Result<Vec<(PathBuf, Option<String>)>> {
        let mut files = Vec::new();

        for root in &self.roots {
            let mut project_dirs = tokio::fs::read_dir(root).await?;
            while let Some(entry) = project_dirs.next_entry().await? {
                let path = entry.path();
                if path.is_dir() {
                    let project = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(str::to_string);
                    let mut sessions = tokio::fs::read_dir(&path).await?;
                    while let Some(session) = sessions.next_entry().await? {
                        let session_path = session.path();
                        if session_path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                            files.push((session_path, project.clone()));
                        }
                    }
                } else if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                    files.push((path, None));
                }
            }
        }

        files.sort();
        debug!("Found {} session files", files.len());
        Ok(files)
    }

    /// Stream usage records parsed from all discovered session files
    pub fn load_usage_records(&self) -> impl Stream<Item = Result<UsageRecord>> + '_ {
        async_stream::stream! {
            let files = match self.find_session_files().await {
                Ok(files) => files,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for (path, project) in files {
                let records = Self::parse_jsonl_stream(path, project);
                tokio::pin!(records);
                while let Some(result) = records.next().await {
                    yield result;
                }
            }
        }
    }

    /// Parse a single session file as a stream of records
    fn parse_jsonl_stream(
        path: PathBuf,
        fallback_project: Option<String>,
    ) -> impl Stream<Item = Result<UsageRecord>> {
        async_stream::stream! {
            let file = match tokio::fs::File::open(&path).await {
                Ok(f) => f,
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            };

            let reader = BufReader::new(file);
            let mut lines = reader.lines();
            let mut line_number = 0usize;

            loop {
                // A read failure (e.g. invalid UTF-8) truncates the file;
                // propagate it rather than report partial totals as complete.
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(MonitorError::Parse {
                            file: path.clone(),
                            error: e.to_string(),
                        });
                        return;
                    }
                };
                line_number += 1;

                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<RawJsonlEntry>(&line) {
                    Ok(raw) => {
                        if let Some(record) =
                            UsageRecord::from_raw(raw, fallback_project.as_deref())
                        {
                            yield Ok(record);
                        } else {
                            debug!(
                                "Skipping invalid record at line {} in {}",
                                line_number,
                                path.display()
                            );
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Failed to parse line {} in {}: {}",
                            line_number,
                            path.display(),
                            e
                        );
                        // Continue processing other lines
                    }
                }
            }
        }
    }

    /// The discovered log roots
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}
