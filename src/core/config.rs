//! Configuration management for Quaero
//!
//! Supports environment variables, config files, and runtime overrides.
//! Agent limits come in three presets (demo, production, development).
//!
//! Config file location: ~/.config/quaero/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::error::{QuaeroError, Result};

/// Main configuration for Quaero
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Language model configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Page fetching configuration
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Supported language model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    /// Local Ollama server
    Ollama,
    /// Any OpenAI-compatible chat completions API (Cerebras by default)
    OpenAiCompatible,
}

impl FromStr for ProviderType {
    type Err = QuaeroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(ProviderType::Ollama),
            "openai" | "openai_compatible" | "openai-compatible" | "cerebras" => {
                Ok(ProviderType::OpenAiCompatible)
            }
            other => Err(QuaeroError::config(format!("Unknown provider: {}", other))),
        }
    }
}

impl ProviderType {
    /// Default base URL and model for this backend
    pub fn defaults(&self) -> (&'static str, &'static str) {
        match self {
            ProviderType::Ollama => ("http://localhost:11434", "llama3.1:8b"),
            ProviderType::OpenAiCompatible => ("https://api.cerebras.ai", "llama3.1-8b"),
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Ollama => write!(f, "ollama"),
            ProviderType::OpenAiCompatible => write!(f, "openai_compatible"),
        }
    }
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend to talk to
    pub provider: ProviderType,
    /// Base URL of the API (no trailing path)
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Token budget for the reasoning call
    pub planning_max_tokens: u32,
    /// Token budget for the synthesis call
    pub synthesis_max_tokens: u32,
    /// Sampling temperature for the reasoning call
    pub planning_temperature: f32,
    /// Sampling temperature for the synthesis call
    pub synthesis_temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let provider = ProviderType::OpenAiCompatible;
        let (default_url, default_model) = provider.defaults();

        Self {
            provider,
            base_url: default_url.to_string(),
            model: default_model.to_string(),
            api_key_env: "CEREBRAS_API_KEY".to_string(),
            timeout_secs: 60,
            planning_max_tokens: 300,
            synthesis_max_tokens: 800,
            planning_temperature: 0.2,
            synthesis_temperature: 0.7,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Switch backend, moving base URL and model to the new backend's
    /// defaults unless they were customized
    pub fn switch_provider(&mut self, provider: ProviderType) {
        let (old_url, old_model) = self.provider.defaults();
        let (new_url, new_model) = provider.defaults();
        if self.base_url == old_url {
            self.base_url = new_url.to_string();
        }
        if self.model == old_model {
            self.model = new_model.to_string();
        }
        self.provider = provider;
    }
}

/// Preset bundles of agent limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Fast and short, for live demos
    Demo,
    /// Balanced defaults
    Production,
    /// Generous limits and no caching
    Development,
}

impl FromStr for Profile {
    type Err = QuaeroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "demo" => Ok(Profile::Demo),
            "production" | "prod" => Ok(Profile::Production),
            "development" | "dev" => Ok(Profile::Development),
            other => Err(QuaeroError::config(format!("Unknown profile: {}", other))),
        }
    }
}

/// Agent loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum reason/act rounds per query (>= 1)
    pub max_iterations: usize,
    /// Hard ceiling for a single tool invocation, in seconds
    pub tool_timeout_secs: u64,
    /// Maximum characters in a final answer
    pub max_response_length: usize,
    /// Whether answers are cached by normalized query
    pub enable_caching: bool,
    /// Search results requested per search call
    pub max_search_results: usize,
    /// How many search hits `search_and_scrape` reads in full
    pub scrape_top_n: usize,
    /// Maximum characters kept from one tool output
    pub max_observation_chars: usize,
    /// Maximum characters of observations in the synthesis prompt
    pub max_prompt_chars: usize,
    /// Characters of gathered text considered enough to stop searching
    pub sufficiency_threshold: usize,
    /// Wall-clock ceiling for one query, in seconds
    pub wall_clock_secs: u64,
    /// Maximum cached answers
    pub cache_max_entries: usize,
    /// Whether to emit debug logs
    pub debug: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::for_profile(Profile::Production)
    }
}

impl AgentConfig {
    /// Limits for a preset, without environment overrides
    pub fn for_profile(profile: Profile) -> Self {
        let (max_iterations, max_response_length, tool_timeout_secs, max_search_results, max_observation_chars, enable_caching) =
            match profile {
                Profile::Demo => (2, 1500, 10, 2, 1000, true),
                Profile::Production => (3, 2000, 15, 3, 1500, true),
                Profile::Development => (5, 3000, 30, 5, 2000, false),
            };

        Self {
            max_iterations,
            tool_timeout_secs,
            max_response_length,
            enable_caching,
            max_search_results,
            scrape_top_n: 2,
            max_observation_chars,
            max_prompt_chars: 6000,
            sufficiency_threshold: 200,
            wall_clock_secs: 120,
            cache_max_entries: 50,
            debug: false,
        }
    }

    /// Apply a preset's limits, keeping the remaining settings
    pub fn apply_profile(&mut self, profile: Profile) {
        let preset = Self::for_profile(profile);
        self.max_iterations = preset.max_iterations;
        self.tool_timeout_secs = preset.tool_timeout_secs;
        self.max_response_length = preset.max_response_length;
        self.enable_caching = preset.enable_caching;
        self.max_search_results = preset.max_search_results;
        self.max_observation_chars = preset.max_observation_chars;
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn wall_clock(&self) -> Duration {
        Duration::from_secs(self.wall_clock_secs)
    }

    /// Reject settings the agent loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(QuaeroError::config("max_iterations must be at least 1"));
        }
        if self.tool_timeout_secs == 0 {
            return Err(QuaeroError::config("tool_timeout_secs must be positive"));
        }
        if self.wall_clock_secs == 0 {
            return Err(QuaeroError::config("wall_clock_secs must be positive"));
        }
        if self.cache_max_entries == 0 {
            return Err(QuaeroError::config("cache_max_entries must be positive"));
        }
        if self.max_response_length == 0
            || self.max_observation_chars == 0
            || self.max_prompt_chars == 0
        {
            return Err(QuaeroError::config("length limits must be positive"));
        }
        Ok(())
    }
}

/// Page fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// User-Agent header sent with search and fetch requests
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Lower bound of the politeness delay before each fetch
    pub min_delay_ms: u64,
    /// Upper bound of the politeness delay before each fetch
    pub max_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            request_timeout_secs: 10,
            min_delay_ms: 200,
            max_delay_ms: 600,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quaero")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        let path = Self::config_file();
        let mut config = if path.exists() {
            match Self::load_from_file() {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                    Self::default()
                }
            }
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| env::var(key).ok());
        config
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(QuaeroError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| QuaeroError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    ///
    /// Missing sections and keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| QuaeroError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the agent cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout_secs == 0 {
            return Err(QuaeroError::config("llm.timeout_secs must be positive"));
        }
        self.agent.validate()
    }

    /// Apply `QUAERO_*` overrides from `lookup` on top of the loaded values
    ///
    /// The profile goes first so explicit limits such as
    /// `QUAERO_MAX_ITERATIONS` win over the preset. Unparseable values are
    /// logged and skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("QUAERO_PROFILE") {
            match v.parse::<Profile>() {
                Ok(profile) => self.agent.apply_profile(profile),
                Err(e) => warn!(error = %e, "Ignoring QUAERO_PROFILE"),
            }
        }
        if let Some(v) = lookup("QUAERO_PROVIDER") {
            match v.parse::<ProviderType>() {
                Ok(provider) => self.llm.switch_provider(provider),
                Err(e) => warn!(error = %e, "Ignoring QUAERO_PROVIDER"),
            }
        }
        if let Some(url) = lookup("QUAERO_BASE_URL").filter(|v| !v.is_empty()) {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("QUAERO_MODEL").filter(|v| !v.is_empty()) {
            self.llm.model = model;
        }
        if let Some(v) = lookup("QUAERO_MAX_ITERATIONS") {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.agent.max_iterations = n,
                _ => warn!(value = %v, "Ignoring QUAERO_MAX_ITERATIONS"),
            }
        }
        if let Some(v) = lookup("QUAERO_ENABLE_CACHING") {
            self.agent.enable_caching = is_truthy(&v);
        }
        if let Some(v) = lookup("QUAERO_DEBUG") {
            self.agent.debug = is_truthy(&v);
        }
    }

    /// Render the configuration as TOML for display
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
