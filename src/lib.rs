//! Quaero - Web Research Agent
//!
//! Answers natural-language questions by iterating a bounded
//! reason → act → observe loop over web search and page extraction, then
//! synthesizing a final answer with a language model.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Completion provider abstraction with Ollama and OpenAI-compatible backends
//! - **Tools**: Search and fetch capabilities plus the tool dispatcher
//! - **Agent**: Decision parsing, the research loop, and the answer cache
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use quaero::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> quaero::Result<()> {
//!     let agent = Agent::from_config(Config::load())?;
//!     agent.initialize().await?;
//!
//!     let result = agent.process("What is the latest stable Rust release?").await;
//!     println!("{}", result.answer);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{Agent, AgentResult, Outcome, QueryCache};
pub use cli::{render_result, Repl};
pub use core::{Config, QuaeroError, Result};
