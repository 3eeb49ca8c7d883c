//! Chat-log corpus extraction and vocabulary building.
//!
//! The crate exposes both a library API and a `chatprep` command line interface.
//! Line-delimited JSON chat exports are decoded into a plain-text corpus (one
//! message per line, oldest first), and the corpus is then tokenized and ranked
//! into a fixed-size `<index> <token>` dictionary with `<UNK>` at index zero.
//!
//! ```no_run
//! use chatprep::{CorpusConfig, VocabConfig, VocabularyBuilder};
//! use std::path::Path;
//!
//! # fn main() -> chatprep::Result<()> {
//! let inputs = chatprep::corpus::parse_input_list("a.jsonl,b.jsonl");
//! let corpus_cfg = CorpusConfig::default();
//! chatprep::corpus::write_corpus_file(&inputs, &corpus_cfg, Path::new("dataset.txt"))?;
//!
//! let vocab_cfg = VocabConfig::builder().max_vocab_size(10_000).build()?;
//! let artifacts = VocabularyBuilder::new(vocab_cfg).build_from_path("dataset.txt")?;
//! artifacts.dictionary.save("dictionary.txt")?;
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature. Library-only users
//! can disable default features to drop the CLI dependencies.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

pub mod config;
pub mod corpus;
pub mod decoder;
pub mod error;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod serialization;
pub mod tokenizer;
pub mod vocab;

pub use config::{CorpusConfig, CorpusOrder, VocabConfig};
pub use corpus::{build_corpus, collect_inputs, write_corpus_file};
pub use error::{ChatprepError, Result};
pub use metrics::{CorpusMetrics, VocabularyMetrics};
pub use model::{Dictionary, TokenIndex, UNKNOWN_INDEX};
pub use pipeline::{decode_file, FileOutcome, FileReport};
pub use tokenizer::tokenize;
pub use vocab::{
    build_dictionary, rank, FrequencyTable, RankedToken, VocabularyArtifacts, VocabularyBuilder,
};
