//! Tools module - information-gathering capabilities for the agent
//!
//! The agent sees tools only through the two capability traits below; the
//! dispatcher binds each [`ToolKind`](crate::core::ToolKind) to them.

pub mod dispatcher;
pub mod fetch;
pub mod search;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::Result;

pub use dispatcher::{DispatchSettings, ToolDispatcher};
pub use fetch::HttpFetcher;
pub use search::DuckDuckGoSearch;

/// One web search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search
#[async_trait]
pub trait SearchCapability: Send + Sync {
    /// Ordered results; an empty list is a valid answer
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// Page content extraction
#[async_trait]
pub trait FetchCapability: Send + Sync {
    /// Readable text of the page at `url`
    async fn fetch(&self, url: &str) -> Result<String>;
}
