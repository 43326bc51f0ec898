pub mod audit;
pub mod config;
pub mod error;
pub mod error_translation;
pub mod exec;
pub mod llm;
pub mod pipeline;
pub mod security;
pub mod shell;

// Re-export commonly used types for convenience
pub use error::{AppError, PipelineError};
pub use exec::{ExecutionCoordinator, ExecutionOutcome, WorkContext};
pub use pipeline::{Operator, Pipeline, RequestSummary};
pub use security::{CanonicalCommand, CommandClassifier, CommandNormalizer, Verdict};
