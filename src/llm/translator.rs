use crate::exec::WorkContext;
use crate::llm::client::{InferenceClient, LLMError};
use crate::llm::prompt::PromptBuilder;

/// Turns a natural-language request into raw, untrusted model output
pub struct Translator {
    client: Box<dyn InferenceClient>,
}

impl Translator {
    pub fn new(client: Box<dyn InferenceClient>) -> Self {
        Self { client }
    }

    pub async fn translate(&self, request: &str, ctx: &WorkContext) -> Result<String, LLMError> {
        let prompt = PromptBuilder::build(request, ctx);
        let raw = self.client.infer(&prompt).await?;
        tracing::debug!(raw = %raw, "model output");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct RecordingClient {
        response: String,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl InferenceClient for RecordingClient {
        async fn infer(&self, prompt: &str) -> Result<String, LLMError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    struct DownClient;

    #[async_trait]
    impl InferenceClient for DownClient {
        async fn infer(&self, _prompt: &str) -> Result<String, LLMError> {
            Err(LLMError::Timeout)
        }
    }

    #[tokio::test]
    async fn test_translator_returns_raw_output() {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let client = RecordingClient {
            response: "```bash\ngit status\n```".to_string(),
            prompts: Arc::clone(&prompts),
        };
        let translator = Translator::new(Box::new(client));
        let ctx = WorkContext::new("/tmp/repo");

        let raw = translator.translate("show me the status", &ctx).await.unwrap();
        assert_eq!(raw, "```bash\ngit status\n```");

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("User request: show me the status"));
    }

    #[tokio::test]
    async fn test_translator_propagates_failure() {
        let translator = Translator::new(Box::new(DownClient));
        let ctx = WorkContext::new("/tmp/repo");

        let result = translator.translate("status", &ctx).await;
        assert!(matches!(result, Err(LLMError::Timeout)));
    }
}
