use crate::error::{GitError, GitResult};
use crate::git::command::GitCommand;
use crate::git::executor::{CommandOutput, Executor};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted executor for testing without spawning git
///
/// Responses are handed out in the order they were queued, and every
/// command received is recorded for later inspection.
#[derive(Debug, Default)]
pub struct MockExecutor {
    responses: Mutex<VecDeque<CommandOutput>>,
    calls: Mutex<Vec<GitCommand>>,
}

impl MockExecutor {
    /// Create a new mock with no queued responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful exit with the given stdout
    pub fn succeed(self, stdout: impl AsRef<[u8]>) -> Self {
        self.push(true, 0, stdout.as_ref(), b"")
    }

    /// Queue a failing exit that writes nothing to stderr
    pub fn fail_silently(self) -> Self {
        self.push(false, 1, b"", b"")
    }

    /// Queue a failing exit with a diagnostic on stderr
    pub fn fail_with(self, stderr: impl AsRef<[u8]>) -> Self {
        self.push(false, 128, b"", stderr.as_ref())
    }

    fn push(self, success: bool, code: i32, stdout: &[u8], stderr: &[u8]) -> Self {
        self.lock_responses().push_back(CommandOutput {
            command: String::new(),
            stdout: stdout.to_vec(),
            stderr: stderr.to_vec(),
            exit_code: Some(code),
            success,
        });
        self
    }

    /// Commands received so far, in order
    pub fn calls(&self) -> Vec<GitCommand> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Argument vectors received so far, in order
    pub fn call_args(&self) -> Vec<Vec<String>> {
        self.calls().iter().map(|c| c.args().to_vec()).collect()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<CommandOutput>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Executor for MockExecutor {
    fn run(&self, command: &GitCommand) -> GitResult<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command.clone());

        let mut output = self.lock_responses().pop_front().ok_or_else(|| GitError::Spawn {
            command: command.to_string(),
            source: std::io::Error::other("no scripted response left"),
        })?;
        output.command = command.to_string();
        Ok(output)
    }
}
