//! External process execution
//!
//! Every external tool (package manager, transpiler, minifier, certificate
//! generator) goes through a [`ProcessRunner`]. Arguments travel as an
//! argument vector, never as a shell string, and the child inherits the
//! caller's standard streams so its output is visible live.

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tracing::debug;

/// A command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Outcome of one external invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code, if the process ran to an exit
    pub exit_code: Option<i32>,

    /// Why the invocation did not succeed, when known
    pub error_detail: Option<String>,
}

impl ProcessResult {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            error_detail: None,
        }
    }

    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            error_detail: None,
        }
    }

    /// A failure with no meaningful exit code (spawn error, missing output, ...)
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            exit_code: None,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Self::exited(code),
            None => Self::failed(format!("terminated without exit code ({})", status)),
        }
    }
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.exit_code, &self.error_detail) {
            (Some(code), Some(detail)) => write!(f, "exit code {}: {}", code, detail),
            (Some(code), None) => write!(f, "exit code {}", code),
            (None, Some(detail)) => write!(f, "{}", detail),
            (None, None) => write!(f, "no exit status"),
        }
    }
}

/// Executes external commands.
///
/// Implementations never panic or return errors: every failure is folded
/// into a non-success [`ProcessResult`].
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run and suspend until the child exits
    async fn run(&self, invocation: &Invocation) -> ProcessResult;

    /// Run and block the calling thread until the child exits
    fn run_blocking(&self, invocation: &Invocation) -> ProcessResult;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> ProcessResult {
        debug!("Running {}", invocation);

        let mut command = tokio::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        match command.status().await {
            Ok(status) => ProcessResult::from_status(status),
            Err(e) => spawn_error(invocation, e),
        }
    }

    fn run_blocking(&self, invocation: &Invocation) -> ProcessResult {
        debug!("Running {}", invocation);

        let mut command = std::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        match command.status() {
            Ok(status) => ProcessResult::from_status(status),
            Err(e) => spawn_error(invocation, e),
        }
    }
}

fn spawn_error(invocation: &Invocation, e: std::io::Error) -> ProcessResult {
    ProcessResult::failed(format!("failed to start {}: {}", invocation.program, e))
}
