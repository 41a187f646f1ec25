use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::config::settings::ConfigError;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("you're not on any Git branch (a 'detached HEAD' state)")]
    NotOnAnyBranch,

    #[error("unable to commit files")]
    CommitFailed,

    #[error("unable to tag repository")]
    TagFailed,

    #[error("unable to push")]
    PushFailed,

    #[error("incorrect Git configuration key: {0}")]
    ConfigKeyInvalid(String),

    #[error(transparent)]
    CommandFailed(#[from] CommandError),

    #[error("Failed to execute '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Not a git repository")]
    NotARepository,

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("Git version {0} is too old. Minimum required: 2.20")]
    GitVersionTooOld(String),

    #[error("Failed to detect git version: {0}")]
    GitVersionDetectionFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// The closed set of classifications a failed operation can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotOnAnyBranch,
    CommitFailed,
    TagFailed,
    PushFailed,
    ConfigKeyInvalid,
    Unknown,
}

impl GitError {
    /// Classification of this error. Every error maps to exactly one kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GitError::NotOnAnyBranch => ErrorKind::NotOnAnyBranch,
            GitError::CommitFailed => ErrorKind::CommitFailed,
            GitError::TagFailed => ErrorKind::TagFailed,
            GitError::PushFailed => ErrorKind::PushFailed,
            GitError::ConfigKeyInvalid(_) => ErrorKind::ConfigKeyInvalid,
            GitError::CommandFailed(_)
            | GitError::Spawn { .. }
            | GitError::Timeout { .. }
            | GitError::NotARepository
            | GitError::ParseError(_)
            | GitError::GitVersionTooOld(_)
            | GitError::GitVersionDetectionFailed(_)
            | GitError::IoError(_) => ErrorKind::Unknown,
        }
    }

    /// Diagnostic text git wrote to stderr, if this error carries any
    pub fn stderr(&self) -> Option<String> {
        match self {
            GitError::CommandFailed(err) => Some(err.stderr_lossy()),
            _ => None,
        }
    }
}

/// A git invocation that exited unsuccessfully
///
/// Both streams are retained so callers can inspect partial stdout alongside
/// the diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandError {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self
            .exit_code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        write!(f, "Command '{}' failed with exit code {}", self.command, code)?;

        let stderr = self.stderr_lossy();
        if !stderr.is_empty() {
            write!(f, ": {}", stderr)?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandError {}

/// Top-level application error that wraps all module-specific errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
