use crate::config::Config;
use crate::error::{Result, ShellError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fmt;
use std::io::{BufRead, ErrorKind, Write};

/// One line of input without its trailing newline. Never contains NUL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine(String);

impl InputLine {
    /// The line's text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for a blank line read as a bare newline.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bytes allocated for the line, which is the read buffer's final size.
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }
}

impl From<&str> for InputLine {
    fn from(s: &str) -> Self {
        Self(s.chars().filter(|&c| c != '\0').collect())
    }
}

impl From<String> for InputLine {
    fn from(s: String) -> Self {
        if s.contains('\0') {
            Self::from(s.as_str())
        } else {
            Self(s)
        }
    }
}

impl fmt::Display for InputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete line, possibly empty.
    Line(InputLine),
    /// The input stream closed before any byte of a new line arrived.
    EndOfInput,
}

/// Anything the REPL can pull lines from.
pub trait LineSource {
    /// Show `prompt` and read one line.
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;
}

/// Byte-at-a-time reader over any buffered stream.
///
/// The line buffer starts at `increment` bytes and grows by exactly `increment`
/// when it is full, so long lines cost more reallocations than doubling would.
pub struct LineReader<R, W> {
    input: R,
    output: W,
    increment: usize,
}

impl<R: BufRead, W: Write> LineReader<R, W> {
    /// Read from `input`, writing prompts to `output`. Only `config.line_increment` is used.
    pub fn new(input: R, output: W, config: &Config) -> Self {
        Self {
            input,
            output,
            increment: config.line_increment.max(1),
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        loop {
            let buf = match self.input.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            let Some(&byte) = buf.first() else {
                return Ok(None);
            };
            self.input.consume(1);
            return Ok(Some(byte));
        }
    }

    /// Read up to and excluding the next newline.
    pub fn read_raw(&mut self) -> Result<ReadOutcome> {
        let mut buffer: Vec<u8> = Vec::new();
        buffer
            .try_reserve_exact(self.increment)
            .map_err(|_| ShellError::OutOfMemory)?;
        let mut seen_any = false;

        loop {
            let Some(byte) = self.next_byte()? else {
                if !seen_any {
                    return Ok(ReadOutcome::EndOfInput);
                }
                break;
            };
            seen_any = true;
            match byte {
                b'\n' => break,
                b'\0' => continue,
                _ => {}
            }
            if buffer.len() == buffer.capacity() {
                buffer
                    .try_reserve_exact(self.increment)
                    .map_err(|_| ShellError::OutOfMemory)?;
            }
            buffer.push(byte);
        }

        let line = match String::from_utf8(buffer) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(ReadOutcome::Line(InputLine(line)))
    }
}

impl<R: BufRead, W: Write> LineSource for LineReader<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;
        self.read_raw()
    }
}

/// Interactive line editor used when stdin is a terminal.
pub struct Editor {
    editor: DefaultEditor,
    history: bool,
}

impl Editor {
    /// Open the terminal editor. Fails when the terminal cannot be set up.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            history: config.history,
        })
    }
}

impl LineSource for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if self.history && !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(ReadOutcome::Line(InputLine::from(line)))
            }
            // Ctrl-C drops the current line and shows a fresh prompt.
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Line(InputLine::default())),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::EndOfInput),
            Err(err) => Err(err.into()),
        }
    }
}
