use crate::audit::AuditLogger;
use crate::error::{CommandError, GitError, GitResult};
use crate::git::command::{GIT_PROGRAM, GitCommand, Stdio};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{self, Child, Command, ExitStatus};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Result of executing a git command
///
/// A non-zero exit is still a `CommandOutput`; whether it is an error is
/// decided by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl CommandOutput {
    /// Whether git exited unsuccessfully without writing any diagnostic text
    pub fn is_silent_failure(&self) -> bool {
        !self.success && self.stderr.is_empty()
    }

    pub fn into_error(self) -> CommandError {
        CommandError {
            command: self.command,
            exit_code: self.exit_code,
            stdout: self.stdout,
            stderr: self.stderr,
        }
    }
}

/// Runs git invocations on behalf of a [`Repository`](crate::git::Repository)
///
/// Implementations return `Ok` whenever the process ran to completion,
/// regardless of exit status. `Err` is reserved for failures to run at all.
pub trait Executor: Send + Sync {
    fn run(&self, command: &GitCommand) -> GitResult<CommandOutput>;
}

/// Executes git commands within a repository
#[derive(Debug)]
pub struct GitExecutor {
    repo_path: PathBuf,
    timeout: Option<Duration>,
    audit: Option<AuditLogger>,
}

impl GitExecutor {
    /// Create a new GitExecutor for the given repository path
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            timeout: None,
            audit: None,
        }
    }

    /// Kill any invocation that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Record every invocation in the given audit log
    pub fn with_audit_log(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    /// Get the repository path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn spawn(&self, command: &GitCommand) -> GitResult<Child> {
        let mut cmd = Command::new(GIT_PROGRAM);
        cmd.args(command.args()).current_dir(&self.repo_path);

        match command.stdio() {
            Stdio::Captured => {
                cmd.stdin(process::Stdio::null())
                    .stdout(process::Stdio::piped())
                    .stderr(process::Stdio::piped());
            }
            Stdio::Inherit => {
                cmd.stdin(process::Stdio::inherit())
                    .stdout(process::Stdio::inherit())
                    .stderr(process::Stdio::inherit());
            }
        }

        cmd.spawn().map_err(|source| GitError::Spawn {
            command: command.to_string(),
            source,
        })
    }

    fn wait(&self, command: &GitCommand, mut child: Child) -> GitResult<CommandOutput> {
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match self.timeout {
            Some(timeout) => match wait_with_deadline(&mut child, timeout)? {
                Some(status) => status,
                None => {
                    // Reap the killed child before dropping the reader threads
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(GitError::Timeout {
                        command: command.to_string(),
                        timeout,
                    });
                }
            },
            None => child.wait()?,
        };

        Ok(CommandOutput {
            command: command.to_string(),
            stdout: join(stdout)?,
            stderr: join(stderr)?,
            exit_code: status.code(),
            success: status.success(),
        })
    }

    fn record(&self, command: &str, exit_code: Option<i32>) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_command(command, &self.repo_path, exit_code) {
                warn!(error = %e, path = %audit.log_path().display(), "Failed to write audit log");
            }
        }
    }
}

impl Executor for GitExecutor {
    fn run(&self, command: &GitCommand) -> GitResult<CommandOutput> {
        let started = Instant::now();
        let result = self
            .spawn(command)
            .and_then(|child| self.wait(command, child));
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(output) => {
                debug!(
                    command = %output.command,
                    exit_code = ?output.exit_code,
                    elapsed_ms,
                    "git command finished"
                );
                self.record(&output.command, output.exit_code);
            }
            Err(e) => {
                debug!(command = %command, error = %e, elapsed_ms, "git command did not complete");
                self.record(&command.to_string(), None);
            }
        }

        result
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> GitResult<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| GitError::IoError(std::io::Error::other("output reader panicked")))?
            .map_err(GitError::from),
        None => Ok(Vec::new()),
    }
}

/// Poll `child` until it exits or `timeout` elapses; `None` means the deadline passed
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> GitResult<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
