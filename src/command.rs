//! External command execution for step runners.
//!
//! This module provides the ONLY sanctioned way for step runners to invoke
//! external programs (`parted`, `mkfs.*`, `mount`, shell commands). Going
//! through [`run_command`] ensures every invocation is logged with its exact
//! arguments and that output is captured rather than interleaved with the
//! build's own progress reporting.
//!
//! Execution is synchronous: the engine invokes one step at a time and each
//! command runs to completion before control returns (no timeouts, no
//! cancellation — the step boundary is the only interruption point).

use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::error::{ImgForgeError, Result};

/// Captured output from one external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
}

impl CommandOutput {
    /// Check that the command succeeded and return a handler error if not.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            let code = self.exit_code.unwrap_or(-1);
            let mut msg = format!("{context} failed with exit code {code}");
            let stderr = self.stderr.trim();
            if !stderr.is_empty() {
                msg.push_str(": ");
                msg.push_str(stderr);
            }
            Err(ImgForgeError::handler(msg))
        }
    }
}

/// Run an external program with arguments, capturing its output.
///
/// Spawn failures (program not found, permission denied) become handler
/// errors; a non-zero exit does not — callers decide via
/// [`CommandOutput::ensure_success`].
pub fn run_command(program: &str, args: &[&str]) -> Result<CommandOutput> {
    info!("run_command: {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ImgForgeError::handler(format!("failed to run {program}: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    debug!(
        "{} exited with {:?}; stdout: {:?}, stderr: {:?}",
        program,
        output.status.code(),
        stdout,
        stderr
    );

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_code: output.status.code(),
        success: output.status.success(),
    })
}

/// Run an external program and fail unless it exits zero.
pub fn run_checked(program: &str, args: &[&str]) -> Result<CommandOutput> {
    let output = run_command(program, args)?;
    let rendered = if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    };
    output.ensure_success(&rendered)?;
    Ok(output)
}
