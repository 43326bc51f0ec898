pub mod branch;
pub mod coordinator;
pub mod runner;

// Re-export commonly used types
pub use branch::{BranchResolver, GitBranchResolver, WorkContext};
pub use coordinator::{ExecutionCoordinator, ExecutionOutcome};
pub use runner::{CommandOutput, CommandRunner, ShellRunner};
