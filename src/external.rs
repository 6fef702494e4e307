use crate::command::{ArgumentVector, CommandResult};
use crate::error::{Result, ShellError};
use log::{debug, warn};
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid};
use std::ffi::CString;
use std::io::Write;
use std::ptr;

/// Status a child reported when the interpreter stopped waiting for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    /// Normal exit with this status code.
    Exited(i32),
    /// Killed by this signal.
    Signaled(Signal),
}

/// Exit status of a child whose exec failed.
pub const EXEC_FAILURE: i32 = 1;

/// A running external program. Dropping it without [`ChildProcess::wait`] leaves a zombie.
#[derive(Debug)]
pub struct ChildProcess {
    pid: Pid,
}

impl ChildProcess {
    /// Fork and exec `args[0]` with `args` as its argument vector.
    ///
    /// The program is looked up in `PATH` and inherits the environment and the
    /// working directory. A failed exec is reported by the child itself on
    /// stderr, which then exits with [`EXEC_FAILURE`].
    pub fn spawn(args: &ArgumentVector) -> Result<Self> {
        let command = args.command().unwrap_or_default();
        let argv = args
            .iter()
            .map(CString::new)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ShellError::ProcessSpawnFailure {
                command: command.to_string(),
                reason: e.to_string(),
            })?;
        let Some(program) = argv.first() else {
            return Err(ShellError::ProcessSpawnFailure {
                command: String::new(),
                reason: "empty command".to_string(),
            });
        };
        // Everything the child needs is prepared here; after fork it must not allocate.
        let argv_ptrs: Vec<*const libc::c_char> = argv
            .iter()
            .map(|arg| arg.as_ptr())
            .chain(std::iter::once(ptr::null()))
            .collect();
        let prefix = format!("yash: {command}: ");

        // SAFETY: the child branch only calls execvp, write and _exit, all
        // async-signal-safe, on buffers built before the fork.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                // SAFETY: `argv_ptrs` is NUL-terminated and points into `argv`, which outlives the call.
                unsafe { libc::execvp(program.as_ptr(), argv_ptrs.as_ptr()) };
                let errno = Errno::last();
                let stderr = std::io::stderr();
                let _ = unistd::write(&stderr, prefix.as_bytes());
                let _ = unistd::write(&stderr, errno.desc().as_bytes());
                let _ = unistd::write(&stderr, b"\n");
                // SAFETY: leaves the forked child without running any parent cleanup.
                unsafe { libc::_exit(EXEC_FAILURE) }
            }
            Ok(ForkResult::Parent { child }) => {
                debug!("spawned {command} as pid {child}");
                Ok(Self { pid: child })
            }
            Err(errno) => Err(ShellError::ProcessSpawnFailure {
                command: command.to_string(),
                reason: errno.desc().to_string(),
            }),
        }
    }

    /// Block until the child exits or is killed. Stops and continues are ignored.
    pub fn wait(self) -> Result<ChildStatus> {
        loop {
            match waitpid(self.pid, Some(WaitPidFlag::WUNTRACED)) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(ChildStatus::Exited(code)),
                Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(ChildStatus::Signaled(signal)),
                Ok(status) => debug!("pid {} still running: {:?}", self.pid, status),
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(std::io::Error::from(errno).into()),
            }
        }
    }
}

/// Runs commands that are not builtins.
pub trait ProcessLauncher {
    /// Run `args` to completion. Failures are reported on `stderr`, never returned.
    fn launch(&mut self, args: &ArgumentVector, stderr: &mut dyn Write) -> CommandResult;
}

/// Launcher backed by fork, exec and waitpid.
#[derive(Debug, Default)]
pub struct ForkExec;

impl ProcessLauncher for ForkExec {
    fn launch(&mut self, args: &ArgumentVector, stderr: &mut dyn Write) -> CommandResult {
        let status = ChildProcess::spawn(args).and_then(ChildProcess::wait);
        match status {
            Ok(ChildStatus::Exited(code)) => debug!("{:?} exited with {code}", args.command()),
            Ok(ChildStatus::Signaled(signal)) => {
                debug!("{:?} killed by {signal}", args.command())
            }
            Err(e) => {
                warn!("launch of {:?} failed: {e}", args.command());
                if let Err(write_err) = writeln!(stderr, "yash: {e}") {
                    warn!("could not report launch failure: {write_err}");
                }
            }
        }
        CommandResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(tokens: &[&str]) -> ArgumentVector {
        tokens.iter().copied().collect()
    }

    fn run(tokens: &[&str]) -> ChildStatus {
        ChildProcess::spawn(&argv(tokens))
            .expect("spawn")
            .wait()
            .expect("wait")
    }

    #[test]
    fn test_true_exits_zero() {
        assert_eq!(run(&["true"]), ChildStatus::Exited(0));
    }

    #[test]
    fn test_exit_code_is_reported() {
        assert_eq!(run(&["sh", "-c", "exit 3"]), ChildStatus::Exited(3));
    }

    #[test]
    fn test_arguments_are_passed_verbatim() {
        assert_eq!(
            run(&["sh", "-c", "test \"$1$2\" = helloworld", "sh", "hello", "world"]),
            ChildStatus::Exited(0)
        );
    }

    #[test]
    fn test_signal_is_reported() {
        assert_eq!(
            run(&["sh", "-c", "kill -9 $$"]),
            ChildStatus::Signaled(Signal::SIGKILL)
        );
    }

    #[test]
    fn test_missing_program_fails_in_child() {
        let name = format!("yash_no_such_program_{}", std::process::id());
        assert_eq!(run(&[&name]), ChildStatus::Exited(EXEC_FAILURE));
    }

    #[test]
    fn test_empty_command_is_spawn_failure() {
        let err = ChildProcess::spawn(&ArgumentVector::new()).unwrap_err();
        assert!(matches!(err, ShellError::ProcessSpawnFailure { .. }));
    }

    #[test]
    fn test_launcher_always_continues() {
        let mut stderr = Vec::new();
        let name = format!("yash_no_such_program_{}", std::process::id());
        assert_eq!(
            ForkExec.launch(&argv(&[&name]), &mut stderr),
            CommandResult::Continue
        );
        assert_eq!(
            ForkExec.launch(&argv(&["sh", "-c", "exit 7"]), &mut stderr),
            CommandResult::Continue
        );
        assert!(stderr.is_empty());
    }
}
