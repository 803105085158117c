//! Core domain types for ccmon
//!
//! This module contains the fundamental types used throughout the ccmon
//! library: strongly-typed identifiers, the `TokenUsage` accumulator, and
//! the raw JSONL schema for Claude Code session logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use uuid::Uuid;

/// Strongly-typed model name wrapper
///
/// Ensures model identifiers are consistently handled throughout the
/// application and usable as ordered map keys.
///
/// # Examples
/// ```
/// use ccmon::types::ModelName;
///
/// let model = ModelName::new("claude-sonnet-4-5-20250929");
/// assert_eq!(model.as_str(), "claude-sonnet-4-5-20250929");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelName(String);

impl ModelName {
    /// Create a new ModelName from any string-like type
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly-typed session ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// ISO timestamp wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ISOTimestamp(DateTime<Utc>);

impl ISOTimestamp {
    /// Create a new ISOTimestamp
    pub fn new(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the inner DateTime
    pub fn inner(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl AsRef<DateTime<Utc>> for ISOTimestamp {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.0
    }
}

/// Token counts for usage tracking
///
/// Tracks all four token categories of a Claude API interaction. Field-wise
/// addition with the all-zero default forms a commutative monoid, which is
/// what makes partitioned aggregation (by session, project, or model) sum
/// back to the grand total.
///
/// # Examples
/// ```
/// use ccmon::types::TokenUsage;
///
/// let a = TokenUsage::new(100, 50, 10, 40);
/// let b = TokenUsage::new(50, 25, 5, 2);
/// let sum = a + b;
/// assert_eq!(sum.input_tokens, 150);
/// assert_eq!(sum.total(), 282);
/// ```
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    /// Input tokens used
    #[serde(default)]
    pub input_tokens: u64,
    /// Output tokens generated
    #[serde(default)]
    pub output_tokens: u64,
    /// Cache creation input tokens
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    /// Cache read input tokens
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

impl TokenUsage {
    /// Create new TokenUsage
    pub fn new(
        input_tokens: u64,
        output_tokens: u64,
        cache_creation_input_tokens: u64,
        cache_read_input_tokens: u64,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cache_creation_input_tokens,
            cache_read_input_tokens,
        }
    }

    /// Total tokens across all four categories
    pub fn total(&self) -> u64 {
        self.input_tokens
            + self.output_tokens
            + self.cache_creation_input_tokens
            + self.cache_read_input_tokens
    }

    /// Total input-side tokens: regular input plus both cache categories
    pub fn total_input_tokens(&self) -> u64 {
        self.input_tokens + self.cache_creation_input_tokens + self.cache_read_input_tokens
    }

    /// Share of input-side tokens served from cache, as a percentage
    ///
    /// Returns 0.0 when there are no input-side tokens; the result is
    /// clamped to `[0, 100]`.
    pub fn cache_efficiency_percentage(&self) -> f64 {
        let total_input = self.total_input_tokens();
        if total_input == 0 {
            return 0.0;
        }
        (100.0 * self.cache_read_input_tokens as f64 / total_input as f64).clamp(0.0, 100.0)
    }
}

impl Add for TokenUsage {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
            cache_creation_input_tokens: self.cache_creation_input_tokens
                + other.cache_creation_input_tokens,
            cache_read_input_tokens: self.cache_read_input_tokens + other.cache_read_input_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_creation_input_tokens += other.cache_creation_input_tokens;
        self.cache_read_input_tokens += other.cache_read_input_tokens;
    }
}

/// Kind of interaction event a record represents
///
/// Used for activity counters; token accounting is independent of the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A slash-command invocation by the user
    Command,
    /// A regular user or assistant message
    Message,
    /// Anything else (summaries, system events)
    Other,
}

/// Raw usage block inside a log message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageUsage {
    /// Input tokens used
    #[serde(default)]
    pub input_tokens: u64,
    /// Output tokens generated
    #[serde(default)]
    pub output_tokens: u64,
    /// Cache creation tokens
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    /// Cache read tokens
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

/// Raw message data from a log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Model that produced the message, if any
    #[serde(default)]
    pub model: Option<String>,
    /// Token usage block
    #[serde(default)]
    pub usage: Option<MessageUsage>,
    /// Message ID (used for deduplication)
    #[serde(default)]
    pub id: Option<String>,
    /// Message content; string or array of content blocks
    #[serde(default)]
    pub content: Option<serde_json::Value>,
}

/// Raw JSONL entry from a Claude Code session file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawJsonlEntry {
    /// Session ID
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    /// RFC3339 timestamp
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Entry type (`user`, `assistant`, `summary`, ...)
    #[serde(rename = "type", default)]
    pub entry_type: Option<String>,
    /// Message containing model, usage, and content
    #[serde(default)]
    pub message: Option<RawMessage>,
    /// Working directory when the event occurred
    #[serde(default)]
    pub cwd: Option<String>,
    /// Unique identifier for the event
    #[serde(default)]
    pub uuid: Option<String>,
    /// Request ID (used for deduplication)
    #[serde(rename = "requestId", default)]
    pub request_id: Option<String>,
}

/// One parsed interaction record
///
/// The clean shape the aggregation layer consumes. Produced from
/// [`RawJsonlEntry`] by [`UsageRecord::from_raw`]; entries that cannot be
/// turned into a valid record (missing session ID, unparsable timestamp)
/// yield `None` and are skipped upstream.
#[derive(Debug, Clone)]
pub struct UsageRecord {
    /// Session this record belongs to
    pub session_id: SessionId,
    /// Project path the session runs under
    pub project_path: String,
    /// When the event occurred
    pub timestamp: ISOTimestamp,
    /// Model that produced the tokens, when known
    pub model: Option<ModelName>,
    /// Token counts for the event
    pub tokens: TokenUsage,
    /// Activity classification
    pub kind: EventKind,
    /// Stable identity for deduplication, when derivable
    pub record_id: Option<String>,
}

impl UsageRecord {
    /// Convert a raw JSONL entry into a usage record
    ///
    /// `fallback_project` is used when the entry carries no `cwd`; the
    /// data loader passes the project directory name here.
    pub fn from_raw(raw: RawJsonlEntry, fallback_project: Option<&str>) -> Option<Self> {
        let record_id = Self::record_identity(&raw);
        let kind = classify_event(raw.entry_type.as_deref(), raw.message.as_ref());

        let session_id = raw.session_id?;
        if Uuid::parse_str(&session_id).is_err() {
            tracing::debug!("Session ID is not a valid UUID: {}", session_id);
            // Continue anyway; older logs use non-UUID session IDs
        }

        let timestamp = match raw.timestamp.as_deref().map(DateTime::parse_from_rfc3339) {
            Some(Ok(dt)) => ISOTimestamp::new(dt.with_timezone(&Utc)),
            _ => {
                tracing::debug!("Skipping entry with missing or unparsable timestamp");
                return None;
            }
        };

        let message = raw.message;
        let model = message
            .as_ref()
            .and_then(|m| m.model.as_deref())
            .filter(|m| *m != "<synthetic>")
            .map(ModelName::new);

        let tokens = message
            .as_ref()
            .and_then(|m| m.usage.as_ref())
            .map(|u| {
                TokenUsage::new(
                    u.input_tokens,
                    u.output_tokens,
                    u.cache_creation_input_tokens,
                    u.cache_read_input_tokens,
                )
            })
            .unwrap_or_default();

        let project_path = raw
            .cwd
            .or_else(|| fallback_project.map(str::to_string))
            .unwrap_or_else(|| "(unknown)".to_string());

        Some(Self {
            session_id: SessionId::new(session_id),
            project_path,
            timestamp,
            model,
            tokens,
            kind,
            record_id,
        })
    }

    /// Derive a stable deduplication identity for a raw entry
    ///
    /// Prefers message ID and request ID (either alone suffices), falling
    /// back to session ID + event UUID. Returns `None` when no identity can
    /// be derived; such records cannot be deduplicated and count as-is.
    pub fn record_identity(raw: &RawJsonlEntry) -> Option<String> {
        let msg_id = raw.message.as_ref().and_then(|m| m.id.as_deref());
        match (msg_id, raw.request_id.as_deref()) {
            (Some(msg), Some(req)) => Some(format!("{msg}-{req}")),
            (Some(msg), None) => Some(msg.to_string()),
            (None, Some(req)) => Some(req.to_string()),
            (None, None) => match (raw.session_id.as_deref(), raw.uuid.as_deref()) {
                (Some(session), Some(uuid)) => Some(format!("{session}:{uuid}")),
                _ => None,
            },
        }
    }
}

/// Classify an entry for activity counting
fn classify_event(entry_type: Option<&str>, message: Option<&RawMessage>) -> EventKind {
    match entry_type {
        Some("user") => {
            let is_command = message
                .and_then(|m| m.content.as_ref())
                .is_some_and(contains_command_marker);
            if is_command {
                EventKind::Command
            } else {
                EventKind::Message
            }
        }
        Some("assistant") => EventKind::Message,
        _ => EventKind::Other,
    }
}

/// Claude Code wraps slash-command invocations in `<command-name>` tags
fn contains_command_marker(content: &serde_json::Value) -> bool {
    match content {
        serde_json::Value::String(text) => text.contains("<command-name>"),
        serde_json::Value::Array(blocks) => blocks.iter().any(|block| {
            block
                .get("text")
                .and_then(|t| t.as_str())
                .is_some_and(|t| t.contains("<command-name>"))
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_entry(json: &str) -> RawJsonlEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_token_usage_arithmetic() {
        let a = TokenUsage::new(100, 50, 10, 5);
        let b = TokenUsage::new(200, 100, 20, 10);

        let sum = a + b;
        assert_eq!(sum.input_tokens, 300);
        assert_eq!(sum.output_tokens, 150);
        assert_eq!(sum.cache_creation_input_tokens, 30);
        assert_eq!(sum.cache_read_input_tokens, 15);
        assert_eq!(sum.total(), 495);

        let mut acc = TokenUsage::default();
        acc += a;
        acc += b;
        assert_eq!(acc, sum);
    }

    #[test]
    fn test_total_input_tokens() {
        let tokens = TokenUsage::new(100, 999, 30, 70);
        assert_eq!(tokens.total_input_tokens(), 200);
    }

    #[test]
    fn test_cache_efficiency() {
        let tokens = TokenUsage::new(100, 0, 50, 50);
        assert!((tokens.cache_efficiency_percentage() - 25.0).abs() < 1e-9);

        let empty = TokenUsage::default();
        assert_eq!(empty.cache_efficiency_percentage(), 0.0);

        let output_only = TokenUsage::new(0, 5000, 0, 0);
        assert_eq!(output_only.cache_efficiency_percentage(), 0.0);

        let all_cached = TokenUsage::new(0, 0, 0, 1000);
        assert_eq!(all_cached.cache_efficiency_percentage(), 100.0);
    }

    #[test]
    fn test_from_raw_assistant_entry() {
        let raw = raw_entry(
            r#"{
                "sessionId": "550e8400-e29b-41d4-a716-446655440000",
                "timestamp": "2025-06-01T12:00:00Z",
                "type": "assistant",
                "cwd": "/home/user/projects/demo",
                "requestId": "req_1",
                "message": {
                    "id": "msg_1",
                    "model": "claude-sonnet-4-5-20250929",
                    "usage": {
                        "input_tokens": 100,
                        "output_tokens": 50,
                        "cache_creation_input_tokens": 10,
                        "cache_read_input_tokens": 5
                    }
                }
            }"#,
        );

        let record = UsageRecord::from_raw(raw, None).unwrap();
        assert_eq!(
            record.session_id.as_str(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(record.project_path, "/home/user/projects/demo");
        assert_eq!(
            record.model.as_ref().map(|m| m.as_str()),
            Some("claude-sonnet-4-5-20250929")
        );
        assert_eq!(record.tokens.input_tokens, 100);
        assert_eq!(record.kind, EventKind::Message);
        assert_eq!(record.record_id.as_deref(), Some("msg_1-req_1"));
    }

    #[test]
    fn test_from_raw_missing_session_id() {
        let raw = raw_entry(r#"{"timestamp": "2025-06-01T12:00:00Z", "type": "user"}"#);
        assert!(UsageRecord::from_raw(raw, None).is_none());
    }

    #[test]
    fn test_from_raw_bad_timestamp() {
        let raw =
            raw_entry(r#"{"sessionId": "s1", "timestamp": "not-a-timestamp", "type": "user"}"#);
        assert!(UsageRecord::from_raw(raw, None).is_none());

        let raw = raw_entry(r#"{"sessionId": "s1", "type": "user"}"#);
        assert!(UsageRecord::from_raw(raw, None).is_none());
    }

    #[test]
    fn test_from_raw_synthetic_model() {
        let raw = raw_entry(
            r#"{
                "sessionId": "s1",
                "timestamp": "2025-06-01T12:00:00Z",
                "type": "assistant",
                "message": {"model": "<synthetic>"}
            }"#,
        );
        let record = UsageRecord::from_raw(raw, None).unwrap();
        assert!(record.model.is_none());
        assert_eq!(record.tokens, TokenUsage::default());
    }

    #[test]
    fn test_from_raw_fallback_project() {
        let raw =
            raw_entry(r#"{"sessionId": "s1", "timestamp": "2025-06-01T12:00:00Z", "type": "user"}"#);
        let record = UsageRecord::from_raw(raw, Some("demo-project")).unwrap();
        assert_eq!(record.project_path, "demo-project");
    }

    #[test]
    fn test_record_identity_variants() {
        let full = raw_entry(
            r#"{"sessionId": "s1", "uuid": "u1", "requestId": "req_1",
                "message": {"id": "msg_1"}}"#,
        );
        assert_eq!(
            UsageRecord::record_identity(&full).as_deref(),
            Some("msg_1-req_1")
        );

        let msg_only = raw_entry(r#"{"message": {"id": "msg_1"}}"#);
        assert_eq!(
            UsageRecord::record_identity(&msg_only).as_deref(),
            Some("msg_1")
        );

        let req_only = raw_entry(r#"{"requestId": "req_1"}"#);
        assert_eq!(
            UsageRecord::record_identity(&req_only).as_deref(),
            Some("req_1")
        );

        let uuid_fallback = raw_entry(r#"{"sessionId": "s1", "uuid": "u1"}"#);
        assert_eq!(
            UsageRecord::record_identity(&uuid_fallback).as_deref(),
            Some("s1:u1")
        );

        let nothing = raw_entry(r#"{"sessionId": "s1"}"#);
        assert!(UsageRecord::record_identity(&nothing).is_none());
    }

    #[test]
    fn test_event_classification() {
        let command = raw_entry(
            r#"{
                "sessionId": "s1",
                "timestamp": "2025-06-01T12:00:00Z",
                "type": "user",
                "message": {"content": "<command-name>/compact</command-name>"}
            }"#,
        );
        assert_eq!(
            UsageRecord::from_raw(command, None).unwrap().kind,
            EventKind::Command
        );

        let command_blocks = raw_entry(
            r#"{
                "sessionId": "s1",
                "timestamp": "2025-06-01T12:00:00Z",
                "type": "user",
                "message": {"content": [{"type": "text", "text": "<command-name>/init</command-name>"}]}
            }"#,
        );
        assert_eq!(
            UsageRecord::from_raw(command_blocks, None).unwrap().kind,
            EventKind::Command
        );

        let message = raw_entry(
            r#"{
                "sessionId": "s1",
                "timestamp": "2025-06-01T12:00:00Z",
                "type": "user",
                "message": {"content": "hello"}
            }"#,
        );
        assert_eq!(
            UsageRecord::from_raw(message, None).unwrap().kind,
            EventKind::Message
        );

        let summary = raw_entry(
            r#"{"sessionId": "s1", "timestamp": "2025-06-01T12:00:00Z", "type": "summary"}"#,
        );
        assert_eq!(
            UsageRecord::from_raw(summary, None).unwrap().kind,
            EventKind::Other
        );
    }
}
