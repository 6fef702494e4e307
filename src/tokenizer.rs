//! Whitespace tokenizer for command lines.
//!
//! There is no shell grammar here: a token is a maximal run of characters that
//! are not delimiters, and runs of delimiters collapse into one separator.

use crate::command::ArgumentVector;
use crate::error::Result;
use crate::reader::InputLine;
use regex::Regex;
use std::sync::LazyLock;

/// Characters that separate tokens: space, tab, carriage return, newline, bell.
pub const DELIMITERS: &[char] = &[' ', '\t', '\r', '\n', '\x07'];

/// A maximal run of anything but [`DELIMITERS`].
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    let delimiters: String = DELIMITERS.iter().collect();
    Regex::new(&format!("[^{}]+", regex::escape(&delimiters))).expect("token pattern is valid")
});

/// Split `line` into owned tokens.
///
/// Token storage starts at `increment` slots and grows by `increment` whenever
/// it fills up.
pub fn split_line(line: &InputLine, increment: usize) -> Result<ArgumentVector> {
    split_str(line.as_str(), increment)
}

pub(crate) fn split_str(line: &str, increment: usize) -> Result<ArgumentVector> {
    let mut args = ArgumentVector::with_capacity(increment)?;
    for token in TOKEN.find_iter(line) {
        args.push_with_increment(token.as_str().to_owned(), increment)?;
    }
    Ok(args)
}
