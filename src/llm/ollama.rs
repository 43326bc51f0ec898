use crate::config::LLMConfig;
use crate::llm::client::{InferenceClient, LLMError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// One object from `/api/generate`: the whole answer, or one streamed fragment
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a local Ollama server
pub struct OllamaClient {
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    http_client: Client,
}

impl OllamaClient {
    pub fn new(config: &LLMConfig) -> Result<Self, LLMError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream: config.stream,
            http_client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the server answers `/api/tags`. Never errors.
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self.http_client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "health check failed");
                false
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, LLMError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: self.stream,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let mut response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LLMError::ApiError(format!(
                "Ollama returned status {}: {}",
                status, error_text
            )));
        }

        if !self.stream {
            let bytes = response.bytes().await.map_err(Self::transport_error)?;
            let chunk: GenerateChunk = serde_json::from_slice(&bytes)?;
            if let Some(error) = chunk.error {
                return Err(LLMError::ApiError(error));
            }
            return Ok(chunk.response);
        }

        let mut assembler = StreamAssembler::default();
        while let Some(bytes) = response.chunk().await.map_err(Self::transport_error)? {
            assembler.push(&bytes)?;
            if assembler.is_done() {
                break;
            }
        }
        assembler.finish()
    }

    fn transport_error(error: reqwest::Error) -> LLMError {
        if error.is_timeout() {
            LLMError::Timeout
        } else {
            LLMError::NetworkError(error)
        }
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    async fn infer(&self, prompt: &str) -> Result<String, LLMError> {
        tracing::debug!(model = %self.model, stream = self.stream, "sending prompt");
        self.generate(prompt).await
    }
}

/// Concatenates newline-delimited JSON fragments in arrival order.
///
/// Network chunks may split a line, or a multi-byte character, so bytes are
/// buffered until a full line is available. Lines that do not decode are
/// skipped; a line carrying `error` fails the whole response.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    pending: Vec<u8>,
    text: String,
    done: bool,
}

impl StreamAssembler {
    pub fn push(&mut self, bytes: &[u8]) -> Result<(), LLMError> {
        self.pending.extend_from_slice(bytes);

        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.consume_line(&line)?;
        }

        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Flush any unterminated last line and return the assembled text
    pub fn finish(mut self) -> Result<String, LLMError> {
        let rest = std::mem::take(&mut self.pending);
        self.consume_line(&rest)?;
        Ok(self.text)
    }

    fn consume_line(&mut self, line: &[u8]) -> Result<(), LLMError> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        match serde_json::from_str::<GenerateChunk>(line) {
            Ok(chunk) => {
                if let Some(error) = chunk.error {
                    return Err(LLMError::ApiError(error));
                }
                self.text.push_str(&chunk.response);
                self.done |= chunk.done;
            }
            Err(e) => tracing::debug!(error = %e, "skipping undecodable stream line"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new(&LLMConfig::default()).unwrap();
        assert_eq!(client.model(), "qwen3:4b");
        assert_eq!(client.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let config = LLMConfig {
            endpoint: "http://127.0.0.1:11434/".to_string(),
            ..LLMConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://127.0.0.1:11434");
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            model: "qwen3:4b",
            prompt: "hi",
            stream: true,
            options: GenerateOptions {
                temperature: 0.5,
                num_predict: 64,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "qwen3:4b");
        assert_eq!(json["stream"], true);
        assert_eq!(json["options"]["num_predict"], 64);
    }

    #[test]
    fn test_assembler_concatenates_in_order() {
        let mut assembler = StreamAssembler::default();
        assembler
            .push(b"{\"response\":\"git \",\"done\":false}\n{\"response\":\"status\",\"done\":false}\n")
            .unwrap();
        assembler.push(b"{\"response\":\"\",\"done\":true}\n").unwrap();

        assert!(assembler.is_done());
        assert_eq!(assembler.finish().unwrap(), "git status");
    }

    #[test]
    fn test_assembler_handles_split_lines() {
        let mut assembler = StreamAssembler::default();
        assembler.push(b"{\"response\":\"git lo").unwrap();
        assembler.push(b"g\"}\n{\"respo").unwrap();
        assembler.push(b"nse\":\" -3\"}").unwrap();

        assert_eq!(assembler.finish().unwrap(), "git log -3");
    }

    #[test]
    fn test_assembler_handles_split_utf8() {
        let line = "{\"response\":\"caf\u{e9}\"}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xc3).unwrap() + 1;

        let mut assembler = StreamAssembler::default();
        assembler.push(&line[..split]).unwrap();
        assembler.push(&line[split..]).unwrap();

        assert_eq!(assembler.finish().unwrap(), "caf\u{e9}");
    }

    #[test]
    fn test_assembler_skips_garbage() {
        let mut assembler = StreamAssembler::default();
        assembler
            .push(b"not json\n{\"response\":\"git diff\"}\n\n")
            .unwrap();
        assert_eq!(assembler.finish().unwrap(), "git diff");
    }

    #[test]
    fn test_assembler_error_line() {
        let mut assembler = StreamAssembler::default();
        let result = assembler.push(b"{\"error\":\"model 'nope' not found\"}\n");
        assert!(matches!(result, Err(LLMError::ApiError(msg)) if msg.contains("not found")));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_error() {
        let config = LLMConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            timeout_seconds: 5,
            ..LLMConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();

        assert!(client.infer("say hello").await.is_err());
        assert!(!client.check_health().await);
    }
}
