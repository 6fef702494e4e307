use std::env as stdenv;
use std::io;
use std::path::{Path, PathBuf};

/// The interpreter's view of process-wide state.
///
/// The working directory is the only state shared between commands: `cd`
/// writes it, while `pwd`, `ls` and every launched child read it. All writes go
/// through [`Environment::set_current_dir`], which changes the real process
/// directory as well so that forked children inherit it.
#[derive(Debug, Clone)]
pub struct Environment {
    current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process working directory.
    ///
    /// Falls back to `.` if the directory has been removed underneath us.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { current_dir }
    }

    /// The working directory as of the last successful change.
    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Change the process working directory and remember the canonical result.
    ///
    /// Relative targets are resolved against the current directory. On error
    /// nothing changes.
    pub fn set_current_dir(&mut self, target: impl AsRef<Path>) -> io::Result<()> {
        let target = target.as_ref();
        let new_dir = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.current_dir.join(target)
        };
        let canonical = new_dir.canonicalize()?;
        stdenv::set_current_dir(&canonical)?;
        self.current_dir = canonical;
        Ok(())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{lock_current_dir, make_unique_temp_dir};
    use std::fs;

    #[test]
    fn test_env_reads_process_cwd() {
        let _lock = lock_current_dir();
        let env = Environment::new();
        assert_eq!(env.current_dir(), stdenv::current_dir().unwrap());
    }

    #[test]
    fn test_set_current_dir_updates_process_and_view() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = make_unique_temp_dir("env_cd").expect("temp dir");
        let canonical = fs::canonicalize(&temp).unwrap();

        let mut env = Environment::new();
        env.set_current_dir(&temp).expect("chdir");

        assert_eq!(env.current_dir(), canonical);
        assert_eq!(fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(), canonical);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_set_current_dir_missing_leaves_state_alone() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = Environment::new();

        let missing = format!("missing_dir_for_env_test_{}", std::process::id());
        assert!(env.set_current_dir(&missing).is_err());

        assert_eq!(env.current_dir(), orig);
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }
}
