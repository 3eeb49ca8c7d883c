//! Per-file log decoding.
//!
//! Every line of a file is decoded on the Rayon pool into its own pre-sized
//! slot, so positional order survives regardless of scheduling. Slots are only
//! read after the parallel pass has returned.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use crate::decoder::decode_line;
use crate::error::ChatprepError;

/// Outcome of decoding one input file.
#[derive(Debug)]
pub enum FileOutcome {
    /// At least one message was extracted.
    Decoded {
        /// Messages in chronological order joined by `\n`.
        text: String,
        /// Number of messages in `text`.
        messages: usize,
    },
    /// The file was readable but contained no applicable messages.
    Empty,
    /// The file could not be read.
    Failed(ChatprepError),
}

/// Result of running the decoder over a single source file.
#[derive(Debug)]
pub struct FileReport {
    /// Source file the report describes.
    pub path: PathBuf,
    /// What the decoder produced.
    pub outcome: FileOutcome,
}

impl FileReport {
    /// True when the file was read and produced non-empty text.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, FileOutcome::Decoded { .. })
    }

    /// Returns the decoded text for successful reports.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            FileOutcome::Decoded { text, .. } => Some(text),
            FileOutcome::Empty | FileOutcome::Failed(_) => None,
        }
    }
}

/// Decodes every line of `raw` in parallel, returning one slot per line.
///
/// The returned vector always has exactly as many entries as `raw` has
/// `\n`-separated lines (a trailing newline yields a final empty line).
#[must_use]
pub fn decode_slots(raw: &[u8], source: &Path) -> Vec<Option<String>> {
    let lines: Vec<&[u8]> = raw.split(|&byte| byte == b'\n').collect();
    let mut slots: Vec<Option<String>> = vec![None; lines.len()];
    slots
        .par_iter_mut()
        .zip(lines.par_iter())
        .enumerate()
        .for_each(|(idx, (slot, line))| {
            *slot = decode_line(line, source, idx);
        });
    slots
}

/// Decodes `raw` into chronological messages.
///
/// Exports list the newest message first, so the surviving messages are
/// reversed after empty slots are dropped.
#[must_use]
pub fn decode_messages(raw: &[u8], source: &Path) -> Vec<String> {
    let mut messages: Vec<String> = decode_slots(raw, source)
        .into_iter()
        .flatten()
        .filter(|text| !text.is_empty())
        .collect();
    messages.reverse();
    messages
}

/// Reads and decodes a whole log file.
///
/// A read failure is the only way this yields [`FileOutcome::Failed`];
/// malformed records are skipped individually.
pub fn decode_file<P: AsRef<Path>>(path: P) -> FileReport {
    let path = path.as_ref();
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) => {
            let err = ChatprepError::io(err, Some(path.to_path_buf()));
            warn!("could not read {}: {err}", path.display());
            return FileReport {
                path: path.to_path_buf(),
                outcome: FileOutcome::Failed(err),
            };
        }
    };

    let messages = decode_messages(&raw, path);
    let count = messages.len();
    let text = messages.join("\n");
    info!(
        "finished {} with {count} messages and {} bytes of text",
        path.display(),
        text.len()
    );

    let outcome = if text.is_empty() {
        FileOutcome::Empty
    } else {
        FileOutcome::Decoded {
            text,
            messages: count,
        }
    };
    FileReport {
        path: path.to_path_buf(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;
    use tempfile::tempdir;

    fn message(text: &str) -> String {
        format!(r#"{{"event":"message","text":"{text}"}}"#)
    }

    #[test]
    fn newest_first_input_is_emitted_chronologically() {
        let raw = [
            message("third"),
            r#"{"event":"service","service":true}"#.to_string(),
            message("second"),
            String::new(),
            message("first"),
        ]
        .join("\n");
        let messages = decode_messages(raw.as_bytes(), Path::new("log.jsonl"));
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn every_slot_is_populated_after_the_parallel_pass() {
        let mut raw = String::new();
        for idx in 0..2_000 {
            writeln!(raw, "{}", message(&format!("m{idx}"))).unwrap();
        }
        let slots = decode_slots(raw.as_bytes(), Path::new("big.jsonl"));
        // 2000 records plus the empty line after the final newline.
        assert_eq!(slots.len(), 2_001);
        for (idx, slot) in slots.iter().take(2_000).enumerate() {
            assert_eq!(slot.as_deref(), Some(format!("m{idx}").as_str()));
        }
        assert!(slots[2_000].is_none());
    }

    #[test]
    fn file_without_messages_is_not_a_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("service.jsonl");
        fs::write(
            &path,
            "{\"event\":\"service\",\"service\":true}\n{\"event\":\"message\",\"text\":\"\"}\n",
        )
        .unwrap();
        let report = decode_file(&path);
        assert!(!report.succeeded());
        assert!(matches!(report.outcome, FileOutcome::Empty));
        assert_eq!(report.text(), None);
    }

    #[test]
    fn unreadable_file_reports_failure() {
        let dir = tempdir().unwrap();
        let report = decode_file(dir.path().join("missing.jsonl"));
        assert!(!report.succeeded());
        assert!(matches!(
            report.outcome,
            FileOutcome::Failed(ChatprepError::Io { .. })
        ));
    }

    #[test]
    fn decoded_file_joins_with_newlines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chat.jsonl");
        let raw = format!(
            "{}\n{}\nnot json at all\n",
            message(r"line one\nline two"),
            message("older")
        );
        fs::write(&path, raw).unwrap();
        let report = decode_file(&path);
        assert!(report.succeeded());
        assert_eq!(report.text(), Some("older\nline one\\nline two"));
        assert!(matches!(
            report.outcome,
            FileOutcome::Decoded { messages: 2, .. }
        ));
    }
}
