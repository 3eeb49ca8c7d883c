//! The indexed dictionary produced by vocabulary building.

use std::borrow::Cow;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::{ChatprepError, Result};
use crate::serialization::{load_dictionary, save_dictionary};
use crate::tokenizer::{for_each_token, unescape_newlines};
use crate::vocab::RankedToken;

/// Dictionary index type.
pub type TokenIndex = u32;
/// Index reserved for the unknown token.
pub const UNKNOWN_INDEX: TokenIndex = 0;

/// Index-to-token mapping with the unknown token at index zero.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    tokens: Vec<String>,
    index: FxHashMap<String, TokenIndex>,
}

impl Dictionary {
    /// Builds a dictionary from tokens already in index order.
    ///
    /// The first entry becomes the unknown token. When a token repeats, lookups
    /// resolve to its first index.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(ChatprepError::Dictionary(
                "a dictionary needs at least the unknown token".into(),
            ));
        }
        let mut index = FxHashMap::default();
        index.reserve(tokens.len());
        for (idx, token) in tokens.iter().enumerate() {
            let idx = TokenIndex::try_from(idx).map_err(|_| {
                ChatprepError::Internal("dictionary size exceeded u32::MAX".into())
            })?;
            index.entry(token.clone()).or_insert(idx);
        }
        Ok(Self { tokens, index })
    }

    /// Prepends `unknown` to the ranked tokens and assigns indices in rank order.
    ///
    /// A ranked entry equal to `unknown` is dropped rather than given a second index.
    pub fn from_ranked(unknown: impl Into<String>, ranked: &[RankedToken]) -> Result<Self> {
        let unknown = unknown.into();
        let mut tokens = Vec::with_capacity(ranked.len() + 1);
        tokens.extend(
            ranked
                .iter()
                .filter(|entry| entry.token != unknown)
                .map(|entry| entry.token.clone()),
        );
        tokens.insert(0, unknown);
        Self::from_tokens(tokens)
    }

    /// Loads a dictionary written by [`Dictionary::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_dictionary(path)
    }

    /// Writes the dictionary as `<index> <token>` lines.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_dictionary(self, path)
    }

    /// Number of entries, the unknown token included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false; a dictionary holds at least the unknown token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The reserved token at index zero.
    #[must_use]
    pub fn unknown_token(&self) -> &str {
        &self.tokens[UNKNOWN_INDEX as usize]
    }

    /// Token stored at `index`.
    #[must_use]
    pub fn token(&self, index: TokenIndex) -> Option<&str> {
        self.tokens.get(index as usize).map(String::as_str)
    }

    /// Index of `token`, if present.
    #[must_use]
    pub fn index_of(&self, token: &str) -> Option<TokenIndex> {
        self.index.get(token).copied()
    }

    /// Index of `token`, falling back to [`UNKNOWN_INDEX`].
    #[must_use]
    pub fn lookup(&self, token: &str) -> TokenIndex {
        self.index_of(token).unwrap_or(UNKNOWN_INDEX)
    }

    /// Iterates `(index, token)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenIndex, &str)> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| (idx as TokenIndex, token.as_str()))
    }

    /// Maps one corpus line to dictionary indices.
    pub fn encode_line(&self, line: &str, lowercase: bool) -> Vec<TokenIndex> {
        let line = if lowercase {
            Cow::Owned(line.to_lowercase())
        } else {
            Cow::Borrowed(line)
        };
        let text = unescape_newlines(&line);
        let mut ids = Vec::new();
        for_each_token(&text, |token| ids.push(self.lookup(token)));
        ids
    }
}
