//! LLM Provider trait for abstracting different backends
//!
//! The agent only ever needs prompt-in, text-out completions.

use async_trait::async_trait;

use crate::core::Result;

/// Options for LLM generation
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl GenerateOptions {
    /// Options with a token budget and temperature
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        }
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str, options: GenerateOptions) -> Result<String>;

    /// Check that the backend is reachable and the model usable
    async fn check(&self) -> Result<()> {
        Ok(())
    }

    /// Get the provider name
    fn name(&self) -> &str;
}
