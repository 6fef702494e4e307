use crate::builtin::{BUILTINS, BuiltinRegistry};
use crate::command::{ArgumentVector, CommandResult, Context};
use crate::config::Config;
use crate::env::Environment;
use crate::error::Result;
use crate::external::{ForkExec, ProcessLauncher};
use crate::reader::{LineSource, ReadOutcome};
use crate::tokenizer;
use log::{debug, info, warn};
use std::io::Write;

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// Every line is dispatched on its own: the first token picks a builtin from
/// the registry, anything else goes to the [`ProcessLauncher`].
///
/// Example
/// ```
/// use yash::{CommandResult, Interpreter};
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.run_line("   ").unwrap(), CommandResult::Continue);
/// assert_eq!(sh.run_line("exit").unwrap(), CommandResult::Terminate);
/// ```
pub struct Interpreter {
    config: Config,
    env: Environment,
    builtins: &'static BuiltinRegistry,
    launcher: Box<dyn ProcessLauncher>,
}

impl Interpreter {
    /// Create an interpreter with a custom builtin table and launcher.
    pub fn new(
        config: Config,
        builtins: &'static BuiltinRegistry,
        launcher: Box<dyn ProcessLauncher>,
    ) -> Self {
        Self {
            config,
            env: Environment::new(),
            builtins,
            launcher,
        }
    }

    /// Standard builtins and fork/exec for everything else.
    pub fn with_config(config: Config) -> Self {
        Self::new(config, &BUILTINS, Box::new(ForkExec))
    }

    /// Settings this interpreter was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dispatch one tokenized command using the process stdout and stderr.
    pub fn execute(&mut self, args: &ArgumentVector) -> CommandResult {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        self.execute_with_output(args, &mut stdout.lock(), &mut stderr.lock())
    }

    /// Dispatch one tokenized command, writing builtin output to the given streams.
    ///
    /// External programs always write to the inherited file descriptors.
    pub fn execute_with_output(
        &mut self,
        args: &ArgumentVector,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> CommandResult {
        let Some(name) = args.command() else {
            return CommandResult::Continue;
        };

        if self.builtins.is_builtin(name) {
            debug!("dispatching builtin {name}");
            let mut ctx = Context {
                stdout: &mut *stdout,
                stderr: &mut *stderr,
                env: &mut self.env,
                builtins: self.builtins.names(),
            };
            let result = self
                .builtins
                .invoke(args, &mut ctx)
                .unwrap_or(CommandResult::Continue);
            flush(stdout);
            return result;
        }

        debug!("launching external {name}");
        flush(stdout);
        self.launcher.launch(args, stderr)
    }

    /// Tokenize and dispatch a single line.
    pub fn run_line(&mut self, line: &str) -> Result<CommandResult> {
        let args = tokenizer::split_str(line, self.config.token_increment)?;
        Ok(self.execute(&args))
    }

    /// Read, tokenize and dispatch lines until `exit` or end of input.
    ///
    /// Only fatal errors (allocation failure, a broken input stream) are returned.
    pub fn repl(&mut self, source: &mut dyn LineSource) -> Result<()> {
        loop {
            let line = match source.read_line(&self.config.prompt)? {
                ReadOutcome::Line(line) => line,
                ReadOutcome::EndOfInput => {
                    info!("end of input, leaving");
                    return Ok(());
                }
            };
            let args = tokenizer::split_line(&line, self.config.token_increment)?;
            drop(line);
            if self.execute(&args) == CommandResult::Terminate {
                info!("exit requested");
                return Ok(());
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

fn flush(out: &mut dyn Write) {
    if let Err(e) = out.flush() {
        warn!("could not flush output: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::LineReader;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    /// Records what would have been spawned.
    #[derive(Clone, Default)]
    struct RecordingLauncher {
        launched: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl ProcessLauncher for RecordingLauncher {
        fn launch(&mut self, args: &ArgumentVector, _stderr: &mut dyn Write) -> CommandResult {
            self.launched.lock().unwrap().push(args.as_slice().to_vec());
            CommandResult::Continue
        }
    }

    fn recording() -> (Interpreter, RecordingLauncher) {
        let launcher = RecordingLauncher::default();
        let sh = Interpreter::new(Config::default(), &BUILTINS, Box::new(launcher.clone()));
        (sh, launcher)
    }

    fn dispatch(sh: &mut Interpreter, line: &str) -> (CommandResult, String, String) {
        let args = tokenizer::split_str(line, sh.config().token_increment).unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = sh.execute_with_output(&args, &mut out, &mut err);
        (
            result,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_blank_lines_are_noops() {
        let (mut sh, launcher) = recording();
        for line in ["", " ", "\t\t", " \r\n\x07 "] {
            let (result, out, err) = dispatch(&mut sh, line);
            assert_eq!(result, CommandResult::Continue);
            assert!(out.is_empty() && err.is_empty());
        }
        assert!(launcher.launched.lock().unwrap().is_empty());
    }

    #[test]
    fn test_exit_terminates() {
        let (mut sh, _) = recording();
        dispatch(&mut sh, "help");
        assert_eq!(dispatch(&mut sh, "exit").0, CommandResult::Terminate);
        assert_eq!(dispatch(&mut sh, "  exit  ").0, CommandResult::Terminate);
    }

    #[test]
    fn test_non_builtin_goes_to_launcher() {
        let (mut sh, launcher) = recording();
        let (result, out, err) = dispatch(&mut sh, "echo hello world");
        assert_eq!(result, CommandResult::Continue);
        assert!(out.is_empty() && err.is_empty());
        assert_eq!(
            *launcher.launched.lock().unwrap(),
            vec![vec!["echo".to_string(), "hello".to_string(), "world".to_string()]]
        );
    }

    #[test]
    fn test_builtins_do_not_reach_launcher() {
        let (mut sh, launcher) = recording();
        dispatch(&mut sh, "clear");
        dispatch(&mut sh, "help");
        assert!(launcher.launched.lock().unwrap().is_empty());
    }

    #[test]
    fn test_pwd_extra_reports_and_continues() {
        let (mut sh, _) = recording();
        let (result, out, err) = dispatch(&mut sh, "pwd extra");
        assert_eq!(result, CommandResult::Continue);
        assert!(out.is_empty());
        assert!(err.contains("too many arguments"), "{err}");
    }

    #[test]
    fn test_unknown_command_continues_with_fork_exec() {
        let mut sh = Interpreter::default();
        let name = format!("yash_unknown_command_{}", std::process::id());
        let (result, _, _) = dispatch(&mut sh, &name);
        assert_eq!(result, CommandResult::Continue);
    }

    #[test]
    fn test_external_command_runs_to_completion() {
        let mut sh = Interpreter::default();
        assert_eq!(
            sh.run_line("sh -c true").unwrap(),
            CommandResult::Continue
        );
    }

    #[test]
    fn test_repl_stops_on_exit() {
        let (mut sh, launcher) = recording();
        let mut prompts = Vec::new();
        let mut source = LineReader::new(
            Cursor::new(b"\nfoo bar\nexit\nnever\n".to_vec()),
            &mut prompts,
            sh.config(),
        );
        sh.repl(&mut source).unwrap();
        assert_eq!(String::from_utf8(prompts).unwrap(), "> > > ");
        assert_eq!(
            *launcher.launched.lock().unwrap(),
            vec![vec!["foo".to_string(), "bar".to_string()]]
        );
    }

    #[test]
    fn test_repl_stops_at_end_of_input() {
        let (mut sh, launcher) = recording();
        let mut prompts = Vec::new();
        let mut source = LineReader::new(
            Cursor::new(b"one\ntwo".to_vec()),
            &mut prompts,
            sh.config(),
        );
        sh.repl(&mut source).unwrap();
        assert_eq!(String::from_utf8(prompts).unwrap(), "> > > ");
        assert_eq!(launcher.launched.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_custom_prompt() {
        let launcher = RecordingLauncher::default();
        let mut sh = Interpreter::new(
            Config::default().with_prompt("$ "),
            &BUILTINS,
            Box::new(launcher),
        );
        let mut prompts = Vec::new();
        let mut source = LineReader::new(Cursor::new(b"exit\n".to_vec()), &mut prompts, sh.config());
        sh.repl(&mut source).unwrap();
        assert_eq!(prompts, b"$ ");
    }
}
