//! Error types for ccmon
//!
//! All errors derive from `thiserror` for convenient handling and automatic
//! `From` implementations. Data-quality problems in individual log lines
//! are not errors; they are skipped during parsing. Only store access
//! failures and file-level read failures surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ccmon operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No Claude data directories found
    #[error("No Claude data directories found")]
    NoDataDirectory,

    /// A session file could not be read to the end
    #[error("Failed to read {}: {error}", file.display())]
    Parse {
        /// The file that caused the error
        file: PathBuf,
        /// The error message
        error: String,
    },
}

/// Convenience type alias for Results in ccmon
pub type Result<T> = std::result::Result<T, MonitorError>;
