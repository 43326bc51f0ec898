use std::io;
use thiserror::Error;

// Import module-level errors for AppError
use crate::config::ConfigError;
use crate::llm::LLMError;
use crate::security::PolicyViolation;

/// Everything that can end one request early.
///
/// None of these are fatal: the shell reports them and prompts again. A
/// failed branch lookup is not listed; it silently falls back instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Inference service unavailable: {0}")]
    InferenceUnavailable(#[from] LLMError),

    #[error("Model returned no usable command (raw output: {raw:?})")]
    EmptyOrUnparseableOutput { raw: String },

    #[error("Command '{command}' rejected by safety policy: {violation}")]
    RejectedBySafetyPolicy {
        command: String,
        violation: PolicyViolation,
    },

    #[error("Command '{command}' failed{}: {}", exit_suffix(.exit_code), .stderr.trim())]
    ExecutionFailure {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

fn exit_suffix(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

/// Top-level application error that wraps all module-specific errors
///
/// Used by startup code in the binary. All module errors automatically
/// convert to AppError via the `From` trait.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LLMError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for one request
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
