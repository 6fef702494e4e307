/// Prompt text printed before every line.
pub const DEFAULT_PROMPT: &str = "> ";

/// Bytes added to the line buffer each time it fills up.
pub const LINE_INCREMENT: usize = 1024;

/// Slots added to the token vector each time it fills up.
pub const TOKEN_INCREMENT: usize = 64;

/// Interpreter settings.
///
/// Nothing is read from disk or from flags; the binary always starts from
/// [`Config::default`]. Tests shrink the increments to exercise buffer growth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Printed before each line is read.
    pub prompt: String,
    /// Initial size and growth step of the line buffer, in bytes.
    pub line_increment: usize,
    /// Initial size and growth step of the token vector, in tokens.
    pub token_increment: usize,
    /// Keep an in-memory history when reading from a terminal.
    pub history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            line_increment: LINE_INCREMENT,
            token_increment: TOKEN_INCREMENT,
            history: true,
        }
    }
}

impl Config {
    /// Replace the prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Override both growth increments. Zero is bumped to one so buffers always grow.
    pub fn with_increments(mut self, line: usize, token: usize) -> Self {
        self.line_increment = line.max(1);
        self.token_increment = token.max(1);
        self
    }
}
