//! External command execution
//!
//! The cloud and cluster adapters drive the `az` and `kubectl` CLIs. Every
//! invocation goes through a [`CommandRunner`] so adapters can be exercised
//! against canned output, and so the real runner can enforce a per-query
//! timeout.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use wait_timeout::ChildExt;

use crate::core::error::QueryError;

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited with status 0
    pub success: bool,
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run printing `stdout`
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run printing `stderr`
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs a program to completion
pub trait CommandRunner {
    /// Run `program` with `args`, capturing its output
    ///
    /// Only failures to run the program at all (spawn error, timeout) are
    /// errors. A non-zero exit is reported through [`CommandOutput`].
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, QueryError>;
}

/// Runs real processes, killing them after a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    /// Create a runner with the given per-command timeout
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, QueryError> {
        let what = format!("{program} {}", args.join(" "));
        log::debug!("exec: {what}");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| QueryError::Unavailable(format!("cannot run {program}: {e}")))?;

        // Pipes are drained concurrently so a chatty child cannot block on a full pipe
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(QueryError::Timeout {
                    what,
                    after: self.timeout,
                });
            },
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(QueryError::Unavailable(format!("{what}: {e}")));
            },
        };

        Ok(CommandOutput {
            success: status.success(),
            code: status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}

/// Whether a CLI error message reports a missing resource
///
/// Matches `az` (`ResourceNotFound`, `SecretNotFound`, `(NotFound)`) and
/// `kubectl` (`Error from server (NotFound)`).
#[must_use]
pub fn is_not_found(stderr: &str) -> bool {
    stderr.contains("NotFound") || stderr.contains("not found") || stderr.contains("could not be found")
}

/// Turn a finished command into its stdout, classifying failures
pub fn stdout_of(output: CommandOutput, what: &str) -> Result<String, QueryError> {
    if output.success {
        return Ok(output.stdout);
    }

    let stderr = output.stderr.trim();
    if is_not_found(stderr) {
        return Err(QueryError::NotFound(what.to_string()));
    }

    let reason = stderr
        .lines()
        .find(|l| !l.trim().is_empty())
        .map_or_else(|| format!("exit code {}", output.code.unwrap_or(-1)), str::to_string);
    Err(QueryError::Unavailable(format!("{what}: {reason}")))
}

/// Parse a JSON document printed by a CLI
pub fn parse_json<T: DeserializeOwned>(stdout: &str, what: &str) -> Result<T, QueryError> {
    serde_json::from_str(stdout).map_err(|e| QueryError::Malformed(format!("{what}: {e}")))
}
