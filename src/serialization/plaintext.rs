//! Plain-text dictionary format: one `<decimal index><space><token>` record per line.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::{ChatprepError, Result};
use crate::model::{Dictionary, TokenIndex};

/// Writes every dictionary entry in index order.
pub fn write_dictionary<W: Write>(dictionary: &Dictionary, mut writer: W) -> Result<()> {
    for (idx, token) in dictionary.iter() {
        writeln!(writer, "{idx} {token}").map_err(|err| ChatprepError::io(err, None))?;
    }
    writer.flush().map_err(|err| ChatprepError::io(err, None))
}

/// Creates `path`, replacing any previous dictionary, and writes `dictionary` to it.
pub fn save_dictionary<P: AsRef<Path>>(dictionary: &Dictionary, path: P) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).map_err(|err| ChatprepError::io(err, Some(path.to_path_buf())))?;
    write_dictionary(dictionary, BufWriter::new(file)).map_err(|err| match err {
        ChatprepError::Io { source, .. } => ChatprepError::io(source, Some(path.to_path_buf())),
        other => other,
    })
}

/// Parses a dictionary, requiring indices to start at zero and increase by one.
///
/// Lines are split on `\n` only so that tokens keep any other trailing characters.
pub fn read_dictionary<R: Read>(mut reader: R) -> Result<Dictionary> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .map_err(|err| ChatprepError::io(err, None))?;

    let body = contents.strip_suffix('\n').unwrap_or(&contents);
    if body.is_empty() {
        return Err(ChatprepError::Dictionary("dictionary is empty".into()));
    }

    let mut tokens = Vec::new();
    for (line_no, line) in body.split('\n').enumerate() {
        let (index, token) = line.split_once(' ').ok_or_else(|| {
            ChatprepError::Dictionary(format!("line {}: expected `<index> <token>`", line_no + 1))
        })?;
        let index: TokenIndex = index.parse().map_err(|_| {
            ChatprepError::Dictionary(format!("line {}: invalid index {index:?}", line_no + 1))
        })?;
        if index as usize != tokens.len() {
            return Err(ChatprepError::Dictionary(format!(
                "line {}: expected index {}, found {index}",
                line_no + 1,
                tokens.len()
            )));
        }
        if token.is_empty() {
            return Err(ChatprepError::Dictionary(format!(
                "line {}: empty token",
                line_no + 1
            )));
        }
        tokens.push(token.to_owned());
    }
    Dictionary::from_tokens(tokens)
}

/// Loads a dictionary from disk.
pub fn load_dictionary<P: AsRef<Path>>(path: P) -> Result<Dictionary> {
    let path = path.as_ref();
    let contents =
        fs::read(path).map_err(|err| ChatprepError::io(err, Some(path.to_path_buf())))?;
    read_dictionary(contents.as_slice())
}
