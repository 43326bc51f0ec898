use std::path::Path;
use std::process::{Command, Output};

/// Captured result of one shell invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process never started or was killed by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl CommandOutput {
    fn spawn_failure(error: std::io::Error) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("Failed to start shell: {}", error),
            exit_code: None,
            success: false,
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
        }
    }
}

/// Runs a command line through the host's command interpreter
pub trait CommandRunner: Send + Sync {
    /// Run `command` in `working_dir`. Never fails: a process that could not
    /// be started is reported as an unsuccessful output.
    fn run(&self, command: &str, working_dir: &Path) -> CommandOutput;
}

/// Runs commands with `sh -c` (or `cmd /C` on Windows). No timeout: the call
/// blocks until the child exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    #[cfg(windows)]
    const SHELL: (&'static str, &'static str) = ("cmd", "/C");
    #[cfg(not(windows))]
    const SHELL: (&'static str, &'static str) = ("sh", "-c");
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, working_dir: &Path) -> CommandOutput {
        let (shell, flag) = Self::SHELL;

        match Command::new(shell)
            .arg(flag)
            .arg(command)
            .current_dir(working_dir)
            .output()
        {
            Ok(output) => output.into(),
            Err(e) => CommandOutput::spawn_failure(e),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_captures_streams_separately() {
        let temp = TempDir::new().unwrap();
        let output = ShellRunner.run("echo out; echo err 1>&2", temp.path());

        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[test]
    fn test_nonzero_exit() {
        let temp = TempDir::new().unwrap();
        let output = ShellRunner.run("exit 3", temp.path());

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
    }

    #[test]
    fn test_runs_in_working_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "x").unwrap();

        let output = ShellRunner.run("ls", temp.path());
        assert!(output.stdout.contains("marker.txt"));
    }

    #[test]
    fn test_missing_directory_is_failure_not_panic() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");

        let output = ShellRunner.run("echo hi", &missing);
        assert!(!output.success);
        assert_eq!(output.exit_code, None);
        assert!(output.stderr.contains("Failed to start shell"));
    }
}
