//! Tool dispatcher - runs decisions against capabilities
//!
//! Every call is bounded by a time budget and every outcome, including
//! errors, timeouts and empty results, becomes exactly one [`Observation`].
//! The dispatcher reports; retry policy belongs to the agent loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{self, timeout};
use tracing::info;

use crate::core::text::{find_url, truncate_chars};
use crate::core::{ActionInput, AgentConfig, Config, Decision, Observation, QuaeroError, Result, ToolKind};
use crate::tools::{DuckDuckGoSearch, FetchCapability, HttpFetcher, SearchCapability, SearchHit};

/// Results with fewer meaningful characters than this count as empty
const MIN_USEFUL_CHARS: usize = 10;

const TRIM_MARKER: &str = "\n... [content trimmed]";

/// Limits applied while running tools
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Results requested from the search capability
    pub max_search_results: usize,
    /// Hits read in full by `search_and_scrape`
    pub scrape_top_n: usize,
    /// Maximum characters of one observation
    pub max_output_chars: usize,
}

impl From<&AgentConfig> for DispatchSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_search_results: config.max_search_results,
            scrape_top_n: config.scrape_top_n,
            max_output_chars: config.max_observation_chars,
        }
    }
}

/// Binds each tool kind to a capability and runs decisions
pub struct ToolDispatcher {
    search: Arc<dyn SearchCapability>,
    fetch: Arc<dyn FetchCapability>,
    settings: DispatchSettings,
}

impl ToolDispatcher {
    /// Create a dispatcher over the given capabilities
    pub fn new(
        search: Arc<dyn SearchCapability>,
        fetch: Arc<dyn FetchCapability>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            search,
            fetch,
            settings,
        }
    }

    /// Create a dispatcher backed by DuckDuckGo and plain HTTP fetching
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(DuckDuckGoSearch::from_config(&config.fetch)?),
            Arc::new(HttpFetcher::from_config(&config.fetch)?),
            DispatchSettings::from(&config.agent),
        ))
    }

    /// Execute a decision within `time_budget`
    pub async fn execute(&self, decision: &Decision, time_budget: Duration) -> Observation {
        let tool = decision.tool;
        if tool == ToolKind::None {
            return Observation::success(ToolKind::None, "");
        }

        let start = Instant::now();
        let deadline = time::Instant::now() + time_budget;
        let result = timeout(time_budget, self.run(tool, &decision.action_input, deadline)).await;

        let (observation, outcome) = match result {
            Ok(Ok(text)) => {
                if text.chars().filter(|c| !c.is_whitespace()).count() < MIN_USEFUL_CHARS {
                    (Observation::failure(tool, "empty result"), "empty")
                } else {
                    let text = truncate_chars(&text, self.settings.max_output_chars, TRIM_MARKER);
                    (Observation::success(tool, text), "ok")
                }
            }
            Ok(Err(e)) => (Observation::failure(tool, e.to_string()), "error"),
            Err(_) => (Observation::timeout(tool), "timeout"),
        };

        info!(
            tool = %tool,
            outcome,
            duration_ms = start.elapsed().as_millis() as u64,
            bytes = observation.byte_length(),
            "tool call"
        );

        observation
    }

    async fn run(
        &self,
        tool: ToolKind,
        input: &ActionInput,
        deadline: time::Instant,
    ) -> Result<String> {
        match tool {
            ToolKind::Search => self.run_search(&search_terms(input)?).await,
            ToolKind::Scrape => self.run_scrape(input).await,
            ToolKind::SearchAndScrape => {
                self.run_search_and_scrape(&search_terms(input)?, deadline)
                    .await
            }
            ToolKind::None => Ok(String::new()),
        }
    }

    async fn run_search(&self, query: &str) -> Result<String> {
        let hits = self
            .search
            .search(query, self.settings.max_search_results)
            .await?;
        Ok(format_hits(&hits))
    }

    async fn run_scrape(&self, input: &ActionInput) -> Result<String> {
        let url = input
            .get_string("url")
            .or_else(|| find_url(&input.as_text()))
            .ok_or_else(|| QuaeroError::fetch("invalid url"))?;
        self.fetch.fetch(&url).await
    }

    /// Search, then read the top hits one after another
    ///
    /// Each page fetch gets a share of the time left before `deadline`, so a
    /// slow page is reported as unavailable instead of losing the hits
    /// already gathered.
    async fn run_search_and_scrape(&self, query: &str, deadline: time::Instant) -> Result<String> {
        let hits = self
            .search
            .search(query, self.settings.max_search_results)
            .await?;
        if hits.is_empty() {
            return Ok(String::new());
        }

        let per_page = self.settings.max_output_chars / self.settings.scrape_top_n.max(1);
        let to_read = hits.len().min(self.settings.scrape_top_n);
        let mut sections = vec![format!("Search Query: {}", query), "=".repeat(60)];

        for (i, hit) in hits.iter().enumerate() {
            sections.push(format!(
                "\n{}. {}\nURL: {}\nSnippet: {}",
                i + 1,
                hit.title,
                hit.url,
                hit.snippet
            ));

            if i < to_read {
                // Split what is left between the pages still to read, keeping
                // one share back for formatting the result
                let pages_left = (to_read - i) as u32;
                let share =
                    deadline.saturating_duration_since(time::Instant::now()) / (pages_left + 1);
                let content = match timeout(share, self.fetch.fetch(&hit.url)).await {
                    Ok(Ok(text)) => truncate_chars(&text, per_page, "... [content truncated]"),
                    Ok(Err(e)) => format!("Content unavailable: {}", e),
                    Err(_) => "Content unavailable: timed out".to_string(),
                };
                sections.push(format!("Full Content: {}", content));
            }
            sections.push("-".repeat(50));
        }

        Ok(sections.join("\n"))
    }
}

fn search_terms(input: &ActionInput) -> Result<String> {
    let query = input.as_text();
    if query.trim().is_empty() {
        return Err(QuaeroError::search("empty search query"));
    }
    Ok(query.trim().to_string())
}

fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "Title: {}\nLink: {}\nSnippet: {}\n{}",
                hit.title,
                hit.url,
                hit.snippet,
                "=".repeat(50)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
