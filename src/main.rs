use anyhow::Context;
use log::error;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use yash::{Config, Editor, Interpreter, LineReader, LineSource, ShellError};

fn run() -> anyhow::Result<()> {
    let config = Config::default();
    let mut source: Box<dyn LineSource> = if io::stdin().is_terminal() {
        Box::new(Editor::new(&config).context("could not start line editor")?)
    } else {
        Box::new(LineReader::new(io::stdin().lock(), io::stdout(), &config))
    };

    let mut shell = Interpreter::with_config(config);
    shell.repl(source.as_mut())?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<ShellError>().is_some_and(ShellError::is_fatal) {
                error!("fatal: {e}");
            }
            eprintln!("yash: {e:#}");
            ExitCode::FAILURE
        }
    }
}
