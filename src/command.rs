use crate::env::Environment;
use crate::error::{Result, ShellError};
use std::io::Write;

/// What the REPL should do after a command has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Show the next prompt.
    Continue,
    /// Leave the REPL.
    Terminate,
}

/// Owned tokens of one command line. Token 0, when present, is the command name.
///
/// Tokens are copies of the input, so the vector outlives the line it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentVector {
    tokens: Vec<String>,
}

impl ArgumentVector {
    /// An empty vector: a blank line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty vector with room for `capacity` tokens.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self> {
        let mut tokens = Vec::new();
        tokens
            .try_reserve_exact(capacity)
            .map_err(|_| ShellError::OutOfMemory)?;
        Ok(Self { tokens })
    }

    /// Append a token, growing storage by exactly `increment` slots when full.
    pub(crate) fn push_with_increment(&mut self, token: String, increment: usize) -> Result<()> {
        if self.tokens.len() == self.tokens.capacity() {
            self.tokens
                .try_reserve_exact(increment.max(1))
                .map_err(|_| ShellError::OutOfMemory)?;
        }
        self.tokens.push(token);
        Ok(())
    }

    /// The command name, if the line had any token.
    pub fn command(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Tokens after the command name.
    pub fn arguments(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    /// Token at `index`, where 0 is the command name.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Number of tokens including the command name.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when the line had no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token slots allocated so far.
    pub fn capacity(&self) -> usize {
        self.tokens.capacity()
    }

    /// All tokens, command name first.
    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    /// Iterate over all tokens as string slices.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ArgumentVector {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Everything a builtin may touch while it runs.
pub struct Context<'a> {
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
    pub env: &'a mut Environment,
    /// Names of the builtins registered next to the running one, in table order.
    pub builtins: &'a [&'static str],
}
