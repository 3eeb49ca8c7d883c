//! Helpers for (de)serialising dictionaries in the plain `<index> <token>` format.

pub mod plaintext;

pub use plaintext::{load_dictionary, read_dictionary, save_dictionary, write_dictionary};
