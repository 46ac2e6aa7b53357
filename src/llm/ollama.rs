//! Ollama client implementation
//!
//! Async HTTP client for the Ollama chat API (non-streaming).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{LlmConfig, Message, QuaeroError, Result};
use crate::llm::traits::{GenerateOptions, LLMProvider};

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

/// Ollama generation options
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn connect_error(&self, e: reqwest::Error) -> QuaeroError {
        if e.is_connect() {
            QuaeroError::llm(format!(
                "Cannot connect to Ollama at {}. Is it running?",
                self.base_url
            ))
        } else {
            QuaeroError::from(e)
        }
    }

    /// List models installed on the server
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;

        if !response.status().is_success() {
            return Err(QuaeroError::llm("Failed to list models"));
        }

        let models_response: ModelsResponse = response.json().await?;
        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn complete(&self, prompt: &str, options: GenerateOptions) -> Result<String> {
        let messages = [Message::user(prompt)];
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            options: Some(OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            }),
            stream: false,
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "ollama request");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 && error_text.contains("not found") {
                return Err(QuaeroError::llm(format!(
                    "Model '{}' not available in Ollama. Run: ollama pull {}",
                    self.model, self.model
                )));
            }

            return Err(QuaeroError::llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| QuaeroError::llm(format!("Failed to parse response: {}", e)))?;

        Ok(chat_response.message.content)
    }

    async fn check(&self) -> Result<()> {
        let models = self.list_models().await?;
        let wanted = self.model.split(':').next();
        if models
            .iter()
            .any(|m| m == &self.model || m.split(':').next() == wanted)
        {
            Ok(())
        } else {
            Err(QuaeroError::llm(format!(
                "Model '{}' not available in Ollama. Run: ollama pull {}",
                self.model, self.model
            )))
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProviderType;

    fn config() -> LlmConfig {
        LlmConfig {
            provider: ProviderType::Ollama,
            base_url: "http://localhost:11434/".to_string(),
            model: "llama3.1:8b".to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::from_config(&config()).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.name(), "ollama");
    }

    #[test]
    fn test_request_serialization() {
        let messages = [Message::user("Hello")];
        let request = ChatRequest {
            model: "llama3.1:8b",
            messages: &messages,
            options: Some(OllamaOptions {
                temperature: Some(0.2),
                num_predict: Some(300),
            }),
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["options"]["num_predict"], 300);
        assert_eq!(json["stream"], false);
    }
}
