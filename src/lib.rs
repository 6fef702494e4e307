//! yash, a tiny interactive command interpreter.
//!
//! Each input line is split on whitespace into an [`ArgumentVector`]. The
//! first token either names a builtin from the [`BuiltinRegistry`] (`cd`,
//! `pwd`, `ls`, `help`, `clear`, `exit`) or an external program, which is
//! forked, exec'd and waited for before the next prompt. There is no quoting,
//! no pipelines and no redirection.
//!
//! The main entry point is [`Interpreter`]; [`Interpreter::repl`] drives it
//! from any [`LineSource`].

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod reader;
pub mod tokenizer;

/// Builtin table and handler interface. See [`BuiltinRegistry`].
pub use builtin::{BUILTINS, Builtin, BuiltinRegistry, CLEAR_SCREEN};
/// Per-command data passed between the tokenizer, dispatcher and handlers.
pub use command::{ArgumentVector, CommandResult, Context};
pub use config::Config;
pub use error::ShellError;
/// Fork/exec launching of external programs.
pub use external::{ChildProcess, ChildStatus, EXEC_FAILURE, ForkExec, ProcessLauncher};
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
/// Line sources for the REPL.
pub use reader::{Editor, InputLine, LineReader, LineSource, ReadOutcome};

#[cfg(test)]
pub(crate) mod test_support {
    use std::env as stdenv;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Serializes tests that read or change the process working directory.
    pub fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn make_unique_temp_dir(tag: &str) -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("yash_{}_{}_{}", tag, std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }
}
