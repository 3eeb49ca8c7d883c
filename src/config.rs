//! Configuration builders controlling corpus extraction and vocabulary building.

use serde::{Deserialize, Serialize};

use crate::error::{ChatprepError, Result};

/// Default upper bound on ranked vocabulary entries (excluding the unknown token).
pub const DEFAULT_MAX_VOCAB_SIZE: usize = 10_000;
/// Reserved token occupying dictionary index zero.
pub const DEFAULT_UNKNOWN_TOKEN: &str = "<UNK>";

/// Order in which per-file results are appended to the corpus.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CorpusOrder {
    /// Files are written as soon as their decode finishes.
    #[default]
    Arrival,
    /// Results are buffered and written in the order the inputs were declared.
    Declared,
}

/// Configuration for turning raw log files into a corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusConfig {
    /// Order in which successful files are written.
    pub order: CorpusOrder,
    /// Enables recursive traversal when an input is a directory.
    pub recursive: bool,
    /// Follows symlinks encountered during traversal.
    pub follow_symlinks: bool,
    /// Restricts directory expansion to files with this extension (without the dot).
    pub extension: Option<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            order: CorpusOrder::Arrival,
            recursive: true,
            follow_symlinks: false,
            extension: None,
        }
    }
}

impl CorpusConfig {
    /// Returns a builder initialised with [`CorpusConfig::default`].
    #[must_use]
    pub fn builder() -> CorpusBuilder {
        CorpusBuilder::default()
    }

    /// Validates the invariants required for corpus extraction.
    pub fn validate(&self) -> Result<()> {
        if let Some(ext) = &self.extension {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(ChatprepError::InvalidConfig(format!(
                    "extension {ext:?} must be non-empty and given without a leading dot"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`CorpusConfig`].
#[derive(Debug, Default, Clone)]
pub struct CorpusBuilder {
    cfg: CorpusConfig,
}

impl CorpusBuilder {
    /// Creates a builder with [`CorpusConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the write order for per-file results.
    #[must_use]
    pub fn order(mut self, order: CorpusOrder) -> Self {
        self.cfg.order = order;
        self
    }

    /// Enables or disables recursive directory traversal.
    #[must_use]
    pub fn recursive(mut self, enabled: bool) -> Self {
        self.cfg.recursive = enabled;
        self
    }

    /// Enables or disables following of symlinks when traversing directories.
    #[must_use]
    pub fn follow_symlinks(mut self, enabled: bool) -> Self {
        self.cfg.follow_symlinks = enabled;
        self
    }

    /// Restricts directory expansion to a file extension.
    #[must_use]
    pub fn extension<S: Into<String>>(mut self, ext: Option<S>) -> Self {
        self.cfg.extension = ext.map(Into::into);
        self
    }

    /// Finalises the builder, returning a validated [`CorpusConfig`].
    pub fn build(self) -> Result<CorpusConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Configuration for building the indexed dictionary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VocabConfig {
    /// Maximum number of ranked tokens kept after the unknown token.
    pub max_vocab_size: usize,
    /// Token written at index zero.
    pub unknown_token: String,
    /// Lower-cases the corpus before tokenization.
    pub lowercase: bool,
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            max_vocab_size: DEFAULT_MAX_VOCAB_SIZE,
            unknown_token: DEFAULT_UNKNOWN_TOKEN.into(),
            lowercase: true,
        }
    }
}

impl VocabConfig {
    /// Returns a builder initialised with [`VocabConfig::default`].
    #[must_use]
    pub fn builder() -> VocabBuilder {
        VocabBuilder::default()
    }

    /// Validates the invariants required for building a dictionary.
    pub fn validate(&self) -> Result<()> {
        if self.max_vocab_size == 0 {
            return Err(ChatprepError::InvalidConfig(
                "max_vocab_size must be greater than zero".into(),
            ));
        }
        if self.unknown_token.is_empty() {
            return Err(ChatprepError::InvalidConfig(
                "unknown_token must not be empty".into(),
            ));
        }
        if self.unknown_token.chars().any(char::is_whitespace) {
            return Err(ChatprepError::InvalidConfig(format!(
                "unknown_token {:?} must not contain whitespace",
                self.unknown_token
            )));
        }
        Ok(())
    }
}

/// Builder for [`VocabConfig`].
#[derive(Debug, Default, Clone)]
pub struct VocabBuilder {
    cfg: VocabConfig,
}

impl VocabBuilder {
    /// Creates a builder with [`VocabConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ranked vocabulary limit.
    #[must_use]
    pub fn max_vocab_size(mut self, value: usize) -> Self {
        self.cfg.max_vocab_size = value;
        self
    }

    /// Overrides the reserved unknown token.
    #[must_use]
    pub fn unknown_token<S: Into<String>>(mut self, token: S) -> Self {
        self.cfg.unknown_token = token.into();
        self
    }

    /// Enables or disables corpus lower-casing.
    #[must_use]
    pub fn lowercase(mut self, enabled: bool) -> Self {
        self.cfg.lowercase = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`VocabConfig`].
    pub fn build(self) -> Result<VocabConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
