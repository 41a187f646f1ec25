pub mod audit;
pub mod config;
pub mod error;
pub mod git;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult, CommandError, ErrorKind, GitError, GitResult};
pub use git::{
    BranchConfig, CommandOutput, Executor, GitCommand, GitExecutor, GitVersion, MockExecutor,
    Ref, Remote, Repository,
};
