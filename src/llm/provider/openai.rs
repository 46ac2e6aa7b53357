//! OpenAI-compatible Provider
//!
//! Implementation for any `/v1/chat/completions` endpoint. Defaults target
//! Cerebras inference.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{LlmConfig, Message, QuaeroError, Result};
use crate::llm::traits::{GenerateOptions, LLMProvider};

pub struct OpenAiCompatProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatProvider {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key(),
        })
    }

    fn endpoint(&self) -> String {
        if self.base_url.ends_with("/v1") {
            format!("{}/chat/completions", self.base_url)
        } else {
            format!("{}/v1/chat/completions", self.base_url)
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAiCompatProvider {
    async fn complete(&self, prompt: &str, options: GenerateOptions) -> Result<String> {
        let messages = [Message::user(prompt)];
        let request = CompletionRequest {
            model: &self.model,
            messages: &messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "chat completion request");

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(QuaeroError::llm(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| QuaeroError::llm("Response contained no choices"))
    }

    async fn check(&self) -> Result<()> {
        if self.api_key.is_none() {
            return Err(QuaeroError::config(
                "No API key found; set the variable named by llm.api_key_env",
            ));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "openai_compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> OpenAiCompatProvider {
        let config = LlmConfig {
            base_url: base_url.to_string(),
            api_key_env: "QUAERO_TEST_UNSET_KEY".to_string(),
            ..LlmConfig::default()
        };
        OpenAiCompatProvider::from_config(&config).unwrap()
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            provider("https://api.cerebras.ai").endpoint(),
            "https://api.cerebras.ai/v1/chat/completions"
        );
        assert_eq!(
            provider("http://localhost:8080/v1/").endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_check_requires_key() {
        assert!(provider("https://api.cerebras.ai").check().await.is_err());
    }
}
