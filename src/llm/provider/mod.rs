//! LLM Provider implementations and factory
//!
//! Submodules implement specific providers.

pub mod openai;

use std::sync::Arc;

use crate::core::config::{LlmConfig, ProviderType};
use crate::core::Result;
use crate::llm::traits::LLMProvider;
use crate::llm::OllamaClient;

use self::openai::OpenAiCompatProvider;

/// Create a new LLM provider based on configuration
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match config.provider {
        ProviderType::Ollama => Arc::new(OllamaClient::from_config(config)?),
        ProviderType::OpenAiCompatible => Arc::new(OpenAiCompatProvider::from_config(config)?),
    };
    Ok(provider)
}
