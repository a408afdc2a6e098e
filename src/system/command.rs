//! External process helpers
//!
//! Every invocation is blocking and its exit status is always checked. Spawn
//! errors and non-zero exits are mapped to `ToolError`, never propagated as
//! panics.

use crate::error::ToolError;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::{Command, Output};
use std::time::Duration;

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    fn from_output(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into `ToolError::Failed`
    pub fn into_result(self, tool: &str) -> Result<CommandOutput, ToolError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ToolError::Failed {
                tool: tool.to_string(),
                code: self.code,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

/// Run `program` to completion and capture its output
pub fn run_command<S: AsRef<str>>(program: &str, args: &[S]) -> Result<CommandOutput, ToolError> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    tracing::debug!(program, args = ?args, "running external command");

    let output = Command::new(program).args(&args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::unavailable(program)
        } else {
            ToolError::io(format!("Failed to execute {program}"), e)
        }
    })?;

    let output = CommandOutput::from_output(output);
    if !output.success() {
        tracing::warn!(program, code = ?output.code, stderr = %output.stderr.trim(), "external command failed");
    }
    Ok(output)
}

/// Same as `run_command`, with a spinner while the process runs
pub fn run_with_spinner<S: AsRef<str>>(
    message: &str,
    program: &str,
    args: &[S],
) -> Result<CommandOutput, ToolError> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = run_command(program, args);
    spinner.finish_and_clear();
    result
}

/// Check whether a command is on PATH
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
