//! Delimiter-based word tokenizer.
//!
//! Spaces and newlines separate tokens and are never emitted. Commas and
//! periods also close the current run but are emitted as tokens of their own.

use std::borrow::Cow;

/// Escaped newline sequence written into corpus lines.
pub const ESCAPED_NEWLINE: &str = "\\n";
/// Punctuation characters emitted as standalone tokens.
pub const PUNCTUATION: [char; 2] = [',', '.'];

/// True for characters that only separate tokens.
#[must_use]
pub fn is_separator(ch: char) -> bool {
    ch == ' ' || ch == '\n'
}

/// True for characters that close a run and form a token themselves.
#[must_use]
pub fn is_punctuation(ch: char) -> bool {
    PUNCTUATION.contains(&ch)
}

/// Restores literal newlines from the `\n` escape used in corpus lines.
#[must_use]
pub fn unescape_newlines(line: &str) -> Cow<'_, str> {
    if line.contains(ESCAPED_NEWLINE) {
        Cow::Owned(line.replace(ESCAPED_NEWLINE, "\n"))
    } else {
        Cow::Borrowed(line)
    }
}

/// Calls `f` for each token of `text`, left to right.
///
/// `text` is scanned as-is; escaped newlines must already be restored.
pub fn for_each_token<'a, F>(text: &'a str, mut f: F)
where
    F: FnMut(&'a str),
{
    let mut start = 0usize;
    for (idx, ch) in text.char_indices() {
        let punctuation = is_punctuation(ch);
        if !punctuation && !is_separator(ch) {
            continue;
        }
        if idx > start {
            f(&text[start..idx]);
        }
        let end = idx + ch.len_utf8();
        if punctuation {
            f(&text[idx..end]);
        }
        start = end;
    }
    if start < text.len() {
        f(&text[start..]);
    }
}

/// Tokenizes one corpus line, restoring escaped newlines first.
///
/// Callers wanting case-insensitive tokens lower-case the line beforehand.
#[must_use]
pub fn tokenize(line: &str) -> Vec<String> {
    let text = unescape_newlines(line);
    let mut tokens = Vec::new();
    for_each_token(&text, |token| tokens.push(token.to_owned()));
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_is_split_into_tokens() {
        assert_eq!(tokenize("hi, there. bob"), ["hi", ",", "there", ".", "bob"]);
    }

    #[test]
    fn escaped_newline_separates_tokens() {
        assert_eq!(tokenize(r"a\nb"), ["a", "b"]);
        assert_eq!(tokenize("a\nb"), ["a", "b"]);
    }

    #[test]
    fn repeated_delimiters_emit_no_empty_tokens() {
        assert_eq!(tokenize("  well,,  ok..  "), ["well", ",", ",", "ok", ".", "."]);
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn multibyte_text_is_kept_intact() {
        assert_eq!(tokenize("привет, мир"), ["привет", ",", "мир"]);
        assert_eq!(tokenize("👍.ok"), ["👍", ".", "ok"]);
    }

    #[test]
    fn other_punctuation_stays_inside_words() {
        assert_eq!(tokenize("what?! don't"), ["what?!", "don't"]);
    }
}
