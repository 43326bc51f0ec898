pub mod client;
pub mod ollama;
pub mod prompt;
pub mod translator;

pub use client::{InferenceClient, LLMError};
pub use ollama::{OllamaClient, StreamAssembler};
pub use prompt::PromptBuilder;
pub use translator::Translator;
