pub mod classifier;
pub mod command;
pub mod executor;
pub mod mock;
pub mod parser;
pub mod repository;
pub mod version;

// Re-export commonly used types
pub use classifier::Operation;
pub use command::GitCommand;
pub use executor::{CommandOutput, Executor, GitExecutor};
pub use mock::MockExecutor;
pub use parser::{BranchConfig, Ref, Remote};
pub use repository::{DEFAULT_REMOTE, Repository};
pub use version::GitVersion;
