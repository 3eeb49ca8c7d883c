//! Metrics summarising corpus extraction and vocabulary runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Summary of one corpus extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusMetrics {
    /// Number of input files handed to the aggregator.
    pub files_total: usize,
    /// Files whose text reached the corpus.
    pub files_written: usize,
    /// Files that were readable but held no applicable messages.
    pub files_empty: usize,
    /// Files that could not be read.
    pub files_failed: usize,
    /// Writes to the corpus sink that failed. Any non-zero value invalidates the output.
    pub write_failures: usize,
    /// Messages written across all files.
    pub messages: usize,
    /// Bytes written to the corpus, separators included.
    pub bytes_written: usize,
    /// Wall-clock time of the run.
    pub total_duration: Duration,
}

impl CorpusMetrics {
    /// Creates an empty metrics container for `files_total` inputs.
    #[must_use]
    pub fn new(files_total: usize) -> Self {
        Self {
            files_total,
            ..Self::default()
        }
    }

    /// True when every attempted write reached the sink.
    #[must_use]
    pub fn output_complete(&self) -> bool {
        self.write_failures == 0
    }
}

/// Summary of one vocabulary build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VocabularyMetrics {
    /// Corpus lines scanned.
    pub lines: usize,
    /// Token occurrences counted, punctuation included.
    pub total_tokens: usize,
    /// Distinct tokens in the frequency table, reserved punctuation included.
    pub distinct_tokens: usize,
    /// Ranked tokens kept after truncation (the unknown token is not counted).
    pub retained: usize,
    /// Wall-clock time of the build.
    pub total_duration: Duration,
}
