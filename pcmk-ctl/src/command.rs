//! External command execution.
//!
//! All cluster interaction goes through [`CommandRunner`] so that the
//! reconciler and the control operations can be driven by scripted fakes in
//! tests instead of real `pcs`/`crm_*` binaries.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Captured result of a finished external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, `-1` when the process was killed by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::new(0, stdout, "")
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs an external program and captures its output.
///
/// Implementations only fail when the program cannot be spawned; a non-zero
/// exit status is returned as a normal [`CommandOutput`] for the caller to
/// interpret.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Runs commands on the local host with `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        debug!(command = %command_line(program, args), "Running");

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a command and turn a non-zero exit into [`Error::CommandFailed`].
pub async fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[&str],
) -> Result<CommandOutput> {
    let output = runner.run(program, args).await?;
    if !output.success() {
        return Err(Error::CommandFailed {
            command: command_line(program, args),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}

/// Render a command for log and error messages.
pub fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
