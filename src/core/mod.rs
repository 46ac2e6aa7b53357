//! Core module - shared infrastructure for Quaero
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the application.

pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use config::{AgentConfig, Config, FetchConfig, LlmConfig, Profile, ProviderType};
pub use error::{QuaeroError, Result};
pub use types::*;
