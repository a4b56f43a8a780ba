//! Sandboxed script execution.
//!
//! Sandboxing here means process isolation plus a bounded timeout, nothing
//! stronger: each call spawns exactly one child process with a discrete
//! argument vector (never a shell), waits up to the clamped timeout, and
//! kills the child on expiry. A non-zero exit code is data for the caller
//! to interpret, not an error.

use skillbox_core::{SkillError, SkillResult};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// Lower bound on a single script execution, in seconds.
pub const MIN_TIMEOUT_SECS: u64 = 5;
/// Upper bound on a single script execution, in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 120;

/// Captured output of a completed script run.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    /// Complete standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Complete standard error, lossily decoded as UTF-8.
    pub stderr: String,
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

/// Executes bundle scripts as isolated child processes.
pub struct ScriptRunner {
    interpreter: String,
    default_timeout_secs: u64,
}

impl ScriptRunner {
    /// Create a runner using `interpreter` and a default timeout applied
    /// when a call does not request one.
    pub fn new(interpreter: impl Into<String>, default_timeout_secs: u64) -> Self {
        Self {
            interpreter: interpreter.into(),
            default_timeout_secs,
        }
    }

    /// Effective timeout for a request: the caller's value (or the
    /// configured default) clamped silently into the safe range.
    pub fn effective_timeout(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_timeout_secs)
            .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)
    }

    /// Run `script` with whitespace-split `args` as a discrete argv.
    ///
    /// The working directory defaults to the script's own containing
    /// folder unless an override is supplied. On timeout the child is
    /// killed and [`SkillError::TimedOut`] returned.
    pub async fn run(
        &self,
        script: &Path,
        args: &str,
        working_dir: Option<&Path>,
        timeout_secs: Option<u64>,
    ) -> SkillResult<ScriptOutput> {
        let timeout_secs = self.effective_timeout(timeout_secs);
        let workdir = working_dir.or_else(|| script.parent());

        let mut command = Command::new(&self.interpreter);
        command
            .arg(script)
            .args(args.split_whitespace())
            .kill_on_drop(true);
        if let Some(dir) = workdir {
            command.current_dir(dir);
        }

        info!(
            script = %script.display(),
            interpreter = %self.interpreter,
            timeout = timeout_secs,
            "Running script"
        );

        let output =
            match tokio::time::timeout(Duration::from_secs(timeout_secs), command.output()).await {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    return Err(SkillError::Launch(format!("{}: {e}", script.display())));
                }
                Err(_) => {
                    warn!(script = %script.display(), timeout = timeout_secs, "Script timed out, child killed");
                    return Err(SkillError::TimedOut(timeout_secs));
                }
            };

        Ok(ScriptOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    // Unit tests use `sh` as the interpreter so they stay hermetic on any
    // POSIX host; the interpreter is configuration, not behavior.
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_timeout_clamping() {
        let runner = ScriptRunner::new("sh", 60);
        assert_eq!(runner.effective_timeout(None), 60);
        assert_eq!(runner.effective_timeout(Some(1)), MIN_TIMEOUT_SECS);
        assert_eq!(runner.effective_timeout(Some(9999)), MAX_TIMEOUT_SECS);
        assert_eq!(runner.effective_timeout(Some(30)), 30);

        let extreme_default = ScriptRunner::new("sh", 100_000);
        assert_eq!(extreme_default.effective_timeout(None), MAX_TIMEOUT_SECS);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo.sh", "echo \"$@\"\n");

        let runner = ScriptRunner::new("sh", 60);
        let output = runner.run(&script, "hello world", None, None).await.unwrap();
        assert_eq!(output.stdout.trim(), "hello world");
        assert_eq!(output.exit_code, 0);
        assert!(output.stderr.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_data_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "fail.sh", "echo oops >&2\nexit 3\n");

        let runner = ScriptRunner::new("sh", 60);
        let output = runner.run(&script, "", None, None).await.unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_working_dir_defaults_to_script_folder() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "pwd.sh", "pwd\n");

        let runner = ScriptRunner::new("sh", 60);
        let output = runner.run(&script, "", None, None).await.unwrap();
        assert_eq!(
            PathBuf::from(output.stdout.trim()),
            dir.path().canonicalize().unwrap()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_args_are_a_discrete_argv() {
        let dir = tempfile::tempdir().unwrap();
        // Prints the argument count; shell metacharacters must arrive as
        // plain text, not be interpreted.
        let script = write_script(dir.path(), "argc.sh", "echo $#\necho \"$1\"\n");

        let runner = ScriptRunner::new("sh", 60);
        let output = runner.run(&script, "$(whoami);rm", None, None).await.unwrap();
        let mut lines = output.stdout.lines();
        assert_eq!(lines.next(), Some("1"));
        assert_eq!(lines.next(), Some("$(whoami);rm"));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "noop.sh", "true\n");

        let runner = ScriptRunner::new("definitely-not-an-interpreter", 60);
        let result = runner.run(&script, "", None, None).await;
        assert!(matches!(result, Err(SkillError::Launch(_))));
    }
}
