//! Interpretation of single line-delimited chat-log records.
//!
//! Each input line is a JSON object exported by a chat client. Only a handful of
//! fields matter here; everything else in the record is ignored.

use std::path::Path;

use bstr::ByteSlice;
use log::{debug, warn};
use serde::Deserialize;

use crate::error::{ChatprepError, Result};

/// Raw records shorter than this many bytes are skipped without parsing.
pub const MIN_RECORD_LEN: usize = 4;
/// Event kind carried by ordinary text messages.
pub const MESSAGE_EVENT: &str = "message";

/// Projection of a chat-log record onto the fields the decoder inspects.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LogRecord {
    /// Event kind, e.g. `message`, `service`, `online-status`.
    #[serde(default)]
    pub event: Option<String>,
    /// Message body; absent or empty for media-only posts.
    #[serde(default)]
    pub text: Option<String>,
    /// Set for membership changes and other service notices.
    #[serde(default)]
    pub service: bool,
}

impl LogRecord {
    /// Parses one raw JSON line.
    pub fn from_slice(raw: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(raw)
    }

    /// Returns the event kind or an empty string.
    #[must_use]
    pub fn event_kind(&self) -> &str {
        self.event.as_deref().unwrap_or_default()
    }

    /// Returns the message body or an empty string.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// True for service notices and for records without any text body.
    #[must_use]
    pub fn is_service_or_empty(&self) -> bool {
        self.service || self.text().is_empty()
    }
}

/// Replaces embedded newlines with the two-character sequence `\n`.
#[must_use]
pub fn escape_newlines(text: &str) -> String {
    text.replace('\n', "\\n")
}

/// Extracts the normalised message line from a parsed record.
///
/// Returns `None` for anything other than a non-empty text message.
#[must_use]
pub fn decode_record(record: &LogRecord) -> Option<String> {
    if record.event_kind() != MESSAGE_EVENT || record.is_service_or_empty() {
        return None;
    }
    Some(escape_newlines(record.text()))
}

/// Parses a raw record, attaching the source location to any failure.
pub fn parse_record(raw: &[u8], source: &Path, line: usize) -> Result<LogRecord> {
    LogRecord::from_slice(raw).map_err(|err| ChatprepError::Record {
        path: source.to_path_buf(),
        line,
        message: err.to_string(),
    })
}

/// Decodes one raw line from `source`.
///
/// Never fails: short or malformed lines are logged and yield `None`.
#[must_use]
pub fn decode_line(raw: &[u8], source: &Path, line: usize) -> Option<String> {
    if raw.len() < MIN_RECORD_LEN {
        debug!(
            "skipping short record in {} line {line} ({} bytes)",
            source.display(),
            raw.len()
        );
        return None;
    }
    match parse_record(raw, source, line) {
        Ok(record) => decode_record(&record),
        Err(err) => {
            warn!("{err}; record: {}", raw.as_bstr());
            None
        }
    }
}
