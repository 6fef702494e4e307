use crate::command::{ArgumentVector, CommandResult, Context};
use crate::error::{Result, ShellError};
use argh::{EarlyExit, FromArgs};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::LazyLock;

/// Terminal sequence that homes the cursor and clears the screen.
pub const CLEAR_SCREEN: &str = "\x1b[1;1H\x1b[2J";

/// The process-wide builtin table, built on first use and never changed.
pub static BUILTINS: LazyLock<BuiltinRegistry> = LazyLock::new(BuiltinRegistry::standard);

/// An in-process command handler.
pub trait Builtin: Send + Sync {
    /// Run the command. `args` includes the command name at index 0.
    fn invoke(&self, args: &ArgumentVector, ctx: &mut Context<'_>) -> CommandResult;
}

impl<F> Builtin for F
where
    F: Fn(&ArgumentVector, &mut Context<'_>) -> CommandResult + Send + Sync,
{
    fn invoke(&self, args: &ArgumentVector, ctx: &mut Context<'_>) -> CommandResult {
        self(args, ctx)
    }
}

/// Built-in commands whose arguments are parsed with [`argh`].
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "ls" or "cd".
    fn name() -> &'static str;

    /// Run with parsed arguments. Errors are reported by the caller on stderr.
    fn execute(self, ctx: &mut Context<'_>) -> Result<CommandResult>;
}

/// Adapts a [`BuiltinCommand`] type to the [`Builtin`] handler interface.
pub(crate) struct Factory<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: BuiltinCommand> Builtin for Factory<T> {
    fn invoke(&self, args: &ArgumentVector, ctx: &mut Context<'_>) -> CommandResult {
        // Everything after the name is positional: words like `help`, `--help`
        // or `-1` belong to the builtin, not to argh.
        let rest: Vec<&str> = std::iter::once("--")
            .chain(args.arguments().iter().map(String::as_str))
            .collect();
        let outcome = match T::from_args(&[T::name()], &rest) {
            Ok(cmd) => cmd.execute(ctx),
            Err(EarlyExit { output, status }) => {
                let stream = if status.is_err() {
                    &mut *ctx.stderr
                } else {
                    &mut *ctx.stdout
                };
                if let Err(e) = writeln!(stream, "{}", output.trim_end()) {
                    warn!("{}: could not write usage: {}", T::name(), e);
                }
                Ok(CommandResult::Continue)
            }
        };
        match outcome {
            Ok(result) => result,
            Err(e) => {
                debug!("builtin {} failed: {:?}", T::name(), e);
                if let Err(write_err) = writeln!(ctx.stderr, "yash: {e}") {
                    warn!("{}: could not report error: {}", T::name(), write_err);
                }
                CommandResult::Continue
            }
        }
    }
}

/// Ordered mapping from command name to handler.
pub struct BuiltinRegistry {
    handlers: BTreeMap<&'static str, Box<dyn Builtin>>,
    names: Vec<&'static str>,
}

impl BuiltinRegistry {
    /// An empty table; see [`BuiltinRegistry::standard`] for the usual one.
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
            names: Vec::new(),
        }
    }

    /// The table every interactive session starts with.
    pub fn standard() -> Self {
        Self::new()
            .with::<Ls>()
            .with::<Cd>()
            .with::<Pwd>()
            .with::<Help>()
            .with::<Clear>()
            .with::<Exit>()
    }

    /// Register a typed builtin under its own name.
    pub(crate) fn with<T: BuiltinCommand + 'static>(mut self) -> Self {
        self.register(T::name(), Factory::<T>::default());
        self
    }

    /// Add or replace the handler for `name`.
    pub fn register(&mut self, name: &'static str, handler: impl Builtin + 'static) {
        if self.handlers.insert(name, Box::new(handler)).is_none() {
            self.names.push(name);
        }
    }

    /// Whether `name` has a handler in this table.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Names in registration order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Run the builtin named by `args`. `None` when it is not registered.
    pub fn invoke(
        &self,
        args: &ArgumentVector,
        ctx: &mut Context<'_>,
    ) -> Option<CommandResult> {
        let handler = self.handlers.get(args.command()?)?;
        Some(handler.invoke(args, ctx))
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to, absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<CommandResult> {
        let Some(target) = self.target else {
            return Err(ShellError::invalid_argument("expected argument to \"cd\""));
        };
        ctx.env
            .set_current_dir(&target)
            .map_err(|source| ShellError::ResourceUnavailable {
                path: target.into(),
                source,
            })?;
        debug!("cd: now in {}", ctx.env.current_dir().display());
        Ok(CommandResult::Continue)
    }
}

#[derive(FromArgs)]
/// Print the current working directory.
pub struct Pwd {
    #[argh(positional, greedy)]
    /// not accepted.
    pub extra: Vec<String>,
}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<CommandResult> {
        if !self.extra.is_empty() {
            return Err(ShellError::invalid_argument("too many arguments for \"pwd\""));
        }
        writeln!(ctx.stdout, "{}", ctx.env.current_dir().display())?;
        Ok(CommandResult::Continue)
    }
}

#[derive(FromArgs)]
/// List directory entries, one per line. Directories end with '/'.
pub struct Ls {
    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub directory: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<CommandResult> {
        let dir = match &self.directory {
            Some(d) => ctx.env.current_dir().join(d),
            None => ctx.env.current_dir().to_path_buf(),
        };
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                // Unreadable directories print nothing.
                debug!("ls: cannot open {}: {}", dir.display(), e);
                return Ok(CommandResult::Continue);
            }
        };
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("ls: skipping entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let name = entry.file_name();
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            write_entry(ctx.stdout, Path::new(&name), is_dir)?;
        }
        Ok(CommandResult::Continue)
    }
}

fn write_entry(out: &mut dyn Write, name: &Path, is_dir: bool) -> Result<()> {
    if is_dir {
        writeln!(out, "{}/", name.display())?;
    } else {
        writeln!(out, "{}", name.display())?;
    }
    Ok(())
}

#[derive(FromArgs)]
/// Show the builtin commands.
pub struct Help {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<CommandResult> {
        writeln!(ctx.stdout, "yash, yet another shell")?;
        writeln!(ctx.stdout, "Type program names and arguments, and hit enter.")?;
        writeln!(ctx.stdout, "The following are built in:")?;
        for name in ctx.builtins {
            writeln!(ctx.stdout, "  {name}")?;
        }
        writeln!(ctx.stdout, "Use the man command for information on other programs.")?;
        Ok(CommandResult::Continue)
    }
}

#[derive(FromArgs)]
/// Clear the terminal screen.
pub struct Clear {
    #[argh(positional, greedy)]
    /// not accepted.
    pub extra: Vec<String>,
}

impl BuiltinCommand for Clear {
    fn name() -> &'static str {
        "clear"
    }

    fn execute(self, ctx: &mut Context<'_>) -> Result<CommandResult> {
        if !self.extra.is_empty() {
            return Err(ShellError::invalid_argument("too many arguments for \"clear\""));
        }
        write!(ctx.stdout, "{CLEAR_SCREEN}")?;
        ctx.stdout.flush()?;
        Ok(CommandResult::Continue)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _ctx: &mut Context<'_>) -> Result<CommandResult> {
        Ok(CommandResult::Terminate)
    }
}
