//! Turns a finished [`CommandOutput`] into a value or exactly one [`GitError`].
//!
//! git reports several expected negative results (detached HEAD, nothing to
//! commit, missing remote branch) as a non-zero exit with nothing on stderr.
//! Those map to the operation's own error; any failure that printed a
//! diagnostic is an unknown error carrying that text.

use crate::error::{GitError, GitResult};
use crate::git::executor::CommandOutput;

/// Operations whose silent failures carry a domain meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CurrentBranch,
    RemoteBranchExists,
    Stage,
    Commit,
    Tag,
    Push,
}

impl Operation {
    /// Error reported when git fails without writing to stderr
    pub fn silent_failure(self) -> GitError {
        match self {
            Operation::CurrentBranch => GitError::NotOnAnyBranch,
            Operation::RemoteBranchExists => GitError::NotOnAnyBranch,
            Operation::Stage => GitError::CommitFailed,
            Operation::Commit => GitError::CommitFailed,
            Operation::Tag => GitError::TagFailed,
            Operation::Push => GitError::PushFailed,
        }
    }
}

pub fn classify(operation: Operation, output: CommandOutput) -> GitResult<Vec<u8>> {
    if output.success {
        return Ok(output.stdout);
    }
    if output.is_silent_failure() {
        return Err(operation.silent_failure());
    }
    Err(GitError::CommandFailed(output.into_error()))
}

/// Any failure is unknown, whether or not git printed a diagnostic
pub fn require_success(output: CommandOutput) -> GitResult<Vec<u8>> {
    if output.success {
        Ok(output.stdout)
    } else {
        Err(GitError::CommandFailed(output.into_error()))
    }
}

/// git-config style read: a silent failure means the value is absent
pub fn read_optional(output: CommandOutput) -> GitResult<Option<Vec<u8>>> {
    if output.success {
        Ok(Some(output.stdout))
    } else if output.is_silent_failure() {
        Ok(None)
    } else {
        Err(GitError::CommandFailed(output.into_error()))
    }
}
