//! Single-shot child process execution with captured output.

use crate::env::BaseEnv;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use thiserror::Error;

/// Errors that prevent a result from being produced at all.
///
/// A non-zero exit status is not an error here; it is reported in
/// [`InvocationResult::exit_code`].
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create output pipe: {0}")]
    Pipe(#[source] io::Error),
    #[error("failed to collect output of {}: {source}", program.display())]
    Wait {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How the child's output streams are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCapture {
    /// stderr is written into the same pipe as stdout.
    Combined,
    /// stdout and stderr are captured independently.
    Separated,
}

/// Captured output and exit status of one child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub stdout: String,
    /// Always empty under [`StreamCapture::Combined`].
    pub stderr: String,
    /// `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl InvocationResult {
    fn new(stdout: &[u8], stderr: &[u8], status: ExitStatus) -> Self {
        Self {
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
            exit_code: status.code(),
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Kills and reaps the child unless it was waited for normally.
struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    const fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    fn wait(mut self) -> io::Result<ExitStatus> {
        match self.child.take() {
            Some(mut child) => child.wait(),
            None => Err(io::Error::other("child already reaped")),
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Run `program` with `args` under exactly `env`, blocking until it exits.
///
/// # Errors
/// Returns [`ProcessError::Spawn`] if the program cannot be started, and
/// [`ProcessError::Wait`] if its output cannot be collected.
pub fn run(
    program: &Path,
    args: &[String],
    env: &BaseEnv,
    capture: StreamCapture,
) -> Result<InvocationResult, ProcessError> {
    tracing::debug!(program = %program.display(), ?args, ?capture, "running");

    let mut cmd = Command::new(program);
    cmd.args(args).env_clear().envs(env.iter()).stdin(Stdio::null());

    let result = match capture {
        StreamCapture::Combined => run_combined(cmd, program)?,
        StreamCapture::Separated => run_separated(cmd, program)?,
    };

    tracing::debug!(
        program = %program.display(),
        exit_code = ?result.exit_code,
        "finished"
    );
    tracing::trace!(
        stdout_len = result.stdout.len(),
        stderr_len = result.stderr.len(),
        "captured output"
    );
    Ok(result)
}

fn run_combined(mut cmd: Command, program: &Path) -> Result<InvocationResult, ProcessError> {
    let (mut reader, writer) = io::pipe().map_err(ProcessError::Pipe)?;
    let stderr_writer = writer.try_clone().map_err(ProcessError::Pipe)?;
    cmd.stdout(writer).stderr(stderr_writer);

    let child = spawn(&mut cmd, program)?;
    // The write ends live in `cmd`; drop it so the read side sees EOF.
    drop(cmd);
    let guard = ChildGuard::new(child);

    let mut output = Vec::new();
    reader
        .read_to_end(&mut output)
        .map_err(|source| ProcessError::Wait {
            program: program.to_path_buf(),
            source,
        })?;
    let status = guard.wait().map_err(|source| ProcessError::Wait {
        program: program.to_path_buf(),
        source,
    })?;

    Ok(InvocationResult::new(&output, &[], status))
}

fn run_separated(mut cmd: Command, program: &Path) -> Result<InvocationResult, ProcessError> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let child = spawn(&mut cmd, program)?;

    // Drains both pipes concurrently and reaps the child on every path.
    let output = child
        .wait_with_output()
        .map_err(|source| ProcessError::Wait {
            program: program.to_path_buf(),
            source,
        })?;

    Ok(InvocationResult::new(
        &output.stdout,
        &output.stderr,
        output.status,
    ))
}

fn spawn(cmd: &mut Command, program: &Path) -> Result<Child, ProcessError> {
    cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: program.to_path_buf(),
        source,
    })
}
