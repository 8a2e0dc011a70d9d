//! Process execution for external command-line tools
//!
//! Commands are always spawned with a discrete argument list, never through
//! a shell. A non-zero exit is not an error here: callers get the status and
//! stderr back and decide what it means.

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;
use tracing::debug;

/// Default program name for the GitHub CLI
pub const GH_PROGRAM: &str = "gh";

/// Failures to run a program at all
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("{0} not found. Please install it first.")]
    ExecutableNotFound(String),

    #[error("Failed to invoke command: {0}")]
    Invocation(#[from] io::Error),
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` if the process was killed by a signal
    pub status: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Trimmed stderr, or "Unknown error" when the program printed nothing
    pub fn error_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            "Unknown error".to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Runs a program to completion and captures its output
pub trait Executor {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        input: Option<&str>,
    ) -> Result<ProcessOutput, ExecError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        input: Option<&str>,
    ) -> Result<ProcessOutput, ExecError> {
        (**self).run(program, args, input)
    }
}

/// Executor backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        input: Option<&str>,
    ) -> Result<ProcessOutput, ExecError> {
        debug!(program, ?args, with_input = input.is_some(), "spawning");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ExecError::ExecutableNotFound(program.to_string()),
            _ => ExecError::Invocation(e),
        })?;

        // Feed stdin from its own thread so a child that writes while it
        // reads cannot fill the stdout pipe and stall both sides
        let writer = match (input, child.stdin.take()) {
            (Some(data), Some(mut stdin)) => {
                let data = data.to_owned();
                Some(thread::spawn(move || stdin.write_all(data.as_bytes())))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;

        if let Some(writer) = writer {
            let written = writer
                .join()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "stdin writer panicked"))?;
            match written {
                Ok(()) => {}
                // The program may exit without draining stdin; its status tells the story
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(ExecError::Invocation(e)),
            }
        }

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        };
        debug!(program, status = ?result.status, "finished");

        Ok(result)
    }
}

/// Thin wrapper that sends argument lists to the GitHub CLI
#[derive(Debug, Clone)]
pub struct GhCli<E: Executor> {
    executor: E,
    program: String,
}

impl<E: Executor> GhCli<E> {
    pub fn new(executor: E) -> Self {
        Self::with_program(executor, GH_PROGRAM)
    }

    /// Use a different `gh` binary (e.g. an absolute path from config)
    pub fn with_program(executor: E, program: impl Into<String>) -> Self {
        Self {
            executor,
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn run(&self, args: &[&str]) -> Result<ProcessOutput, ExecError> {
        self.executor.run(&self.program, args, None)
    }

    pub fn run_with_input(&self, args: &[&str], input: &str) -> Result<ProcessOutput, ExecError> {
        self.executor.run(&self.program, args, Some(input))
    }
}
