//! Frequency counting, ranking, and dictionary construction over a corpus.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Instant;

use log::info;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::{VocabBuilder, VocabConfig};
use crate::error::{ChatprepError, Result};
use crate::metrics::VocabularyMetrics;
use crate::model::Dictionary;
use crate::tokenizer::{for_each_token, unescape_newlines};

/// Token occurrence counts.
pub type FrequencyTable = FxHashMap<String, usize>;

/// Punctuation tokens present in every frequency table, even when unseen.
pub const RESERVED_TOKENS: [&str; 2] = [".", ","];

/// A token and its corpus count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedToken {
    /// Token text.
    pub token: String,
    /// Number of occurrences in the corpus.
    pub count: usize,
}

impl RankedToken {
    /// Rank order: higher counts first, then tokens in ascending byte order.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .count
            .cmp(&self.count)
            .then_with(|| self.token.cmp(&other.token))
    }
}

/// Returns a table holding only the reserved punctuation tokens at zero.
#[must_use]
pub fn seeded_table() -> FrequencyTable {
    RESERVED_TOKENS
        .iter()
        .map(|token| ((*token).to_string(), 0))
        .collect()
}

fn count_line(table: &mut FrequencyTable, line: &str) {
    let text = unescape_newlines(line);
    for_each_token(&text, |token| match table.get_mut(token) {
        Some(count) => *count += 1,
        None => {
            table.insert(token.to_owned(), 1);
        }
    });
}

/// Counts tokens across `lines` in parallel.
///
/// The result always contains [`RESERVED_TOKENS`].
#[must_use]
pub fn count_tokens(lines: &[&str]) -> FrequencyTable {
    let table = lines
        .par_iter()
        .fold(FrequencyTable::default, |mut local, line| {
            count_line(&mut local, line);
            local
        })
        .reduce(FrequencyTable::default, |acc, local| {
            if acc.len() < local.len() {
                return merge_tables(local, acc);
            }
            merge_tables(acc, local)
        });
    merge_tables(table, seeded_table())
}

fn merge_tables(mut into: FrequencyTable, from: FrequencyTable) -> FrequencyTable {
    for (token, count) in from {
        *into.entry(token).or_insert(0) += count;
    }
    into
}

/// Orders `table` by descending count and keeps at most `limit` entries.
///
/// Equal counts are ordered by token bytes so repeated runs agree exactly.
#[must_use]
pub fn rank(table: FrequencyTable, limit: usize) -> Vec<RankedToken> {
    if limit == 0 {
        return Vec::new();
    }
    let mut ranked: Vec<RankedToken> = table
        .into_iter()
        .map(|(token, count)| RankedToken { token, count })
        .collect();
    if ranked.len() > limit {
        ranked.select_nth_unstable_by(limit - 1, RankedToken::rank_cmp);
        ranked.truncate(limit);
    }
    ranked.par_sort_unstable_by(RankedToken::rank_cmp);
    ranked
}

/// Builds a dictionary from corpus text with the default unknown token.
pub fn build_dictionary(corpus: &str, limit: usize) -> Result<Dictionary> {
    let cfg = VocabConfig::builder().max_vocab_size(limit).build()?;
    Ok(VocabularyBuilder::new(cfg).build_from_corpus(corpus)?.dictionary)
}

/// Façade configuring and executing vocabulary builds.
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    cfg: VocabConfig,
}

/// Artifacts returned after a vocabulary build completes.
#[must_use]
#[derive(Debug, Clone)]
pub struct VocabularyArtifacts {
    /// Indexed dictionary, unknown token first.
    pub dictionary: Dictionary,
    /// Ranked tokens with their counts, in index order starting at index one.
    pub ranked: Vec<RankedToken>,
    /// Counters captured during the build.
    pub metrics: VocabularyMetrics,
}

impl VocabularyBuilder {
    /// Creates a builder for the supplied configuration.
    #[must_use]
    pub fn new(cfg: VocabConfig) -> Self {
        Self { cfg }
    }

    /// Returns a [`VocabBuilder`] with default settings.
    #[must_use]
    pub fn builder() -> VocabBuilder {
        VocabConfig::builder()
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &VocabConfig {
        &self.cfg
    }

    /// Reads a corpus file and builds its dictionary.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn build_from_path<P: AsRef<Path>>(&self, path: P) -> Result<VocabularyArtifacts> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|err| ChatprepError::io(err, Some(path.to_path_buf())))?;
        self.build_from_corpus(&String::from_utf8_lossy(&raw))
    }

    /// Builds a dictionary from in-memory corpus text.
    pub fn build_from_corpus(&self, corpus: &str) -> Result<VocabularyArtifacts> {
        self.cfg.validate()?;
        let start = Instant::now();

        let text = if self.cfg.lowercase {
            Cow::Owned(corpus.to_lowercase())
        } else {
            Cow::Borrowed(corpus)
        };
        let body = text.strip_suffix('\n').unwrap_or(&text);
        let lines: Vec<&str> = body.split('\n').collect();
        let mut table = count_tokens(&lines);
        let distinct_tokens = table.len();
        let total_tokens: usize = table.values().sum();
        // Index zero already holds the unknown token; it must not take a ranked slot.
        table.remove(self.cfg.unknown_token.as_str());

        let ranked = rank(table, self.cfg.max_vocab_size);
        let dictionary = Dictionary::from_ranked(self.cfg.unknown_token.clone(), &ranked)?;

        let metrics = VocabularyMetrics {
            lines: lines.len(),
            total_tokens,
            distinct_tokens,
            retained: ranked.len(),
            total_duration: start.elapsed(),
        };
        info!(
            "ranked {} distinct tokens from {} lines; kept {} in {:.2?}",
            metrics.distinct_tokens, metrics.lines, metrics.retained, metrics.total_duration
        );
        Ok(VocabularyArtifacts {
            dictionary,
            ranked,
            metrics,
        })
    }
}

impl fmt::Display for VocabularyArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dictionary with {} entries", self.dictionary.len())?;
        writeln!(f, "Distinct tokens: {}", self.metrics.distinct_tokens)?;
        writeln!(f, "Total duration: {:?}", self.metrics.total_duration)?;
        Ok(())
    }
}
