//! Shared types used across Quaero modules
//!
//! Contains chat messages, the closed set of tool kinds, decisions and
//! observations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A message in a chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The closed set of tools a decision can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Quick web search returning titles, links and snippets
    Search,
    /// Extract readable text from one URL
    Scrape,
    /// Search, then extract content from the top results
    SearchAndScrape,
    /// No tool needed
    None,
}

impl ToolKind {
    /// Every tool kind, in prompt order
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Search,
        ToolKind::Scrape,
        ToolKind::SearchAndScrape,
        ToolKind::None,
    ];

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Search => "search",
            ToolKind::Scrape => "scrape",
            ToolKind::SearchAndScrape => "search_and_scrape",
            ToolKind::None => "none",
        }
    }

    /// One-line description used in the reasoning prompt
    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::Search => "quick web search for simple questions (input: search terms)",
            ToolKind::Scrape => "extract the text of a specific page (input: the URL)",
            ToolKind::SearchAndScrape => {
                "comprehensive research: search, then read the top results (input: search terms)"
            }
            ToolKind::None => "no tool needed, answer from what is already known (input: empty)",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a tool name is not one of [`ToolKind`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTool(pub String);

impl fmt::Display for UnknownTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown tool '{}'", self.0)
    }
}

impl std::error::Error for UnknownTool {}

impl FromStr for ToolKind {
    type Err = UnknownTool;

    /// Accepts canonical names plus the identifiers models tend to echo back
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().trim_matches('`').to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "search" | "web_search" | "websearch" => Ok(ToolKind::Search),
            "scrape" | "scrape_url" | "scrapeurl" | "fetch" => Ok(ToolKind::Scrape),
            "search_and_scrape" | "searchandscrape" => Ok(ToolKind::SearchAndScrape),
            "none" | "no_tool" | "null" => Ok(ToolKind::None),
            _ => Err(UnknownTool(s.to_string())),
        }
    }
}

/// Input handed to a tool: free text or structured parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionInput {
    Text(String),
    Params(serde_json::Map<String, serde_json::Value>),
}

impl ActionInput {
    /// Get a string parameter by key (structured input only)
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self {
            ActionInput::Text(_) => None,
            ActionInput::Params(map) => map
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        }
    }

    /// Flatten the input to the text a capability receives
    ///
    /// Structured input is searched for the usual keys before falling back to
    /// its JSON rendering.
    pub fn as_text(&self) -> String {
        match self {
            ActionInput::Text(text) => text.clone(),
            ActionInput::Params(map) => ["query", "url", "input", "q"]
                .iter()
                .find_map(|key| self.get_string(key))
                .unwrap_or_else(|| serde_json::Value::Object(map.clone()).to_string()),
        }
    }

    /// Whether the input carries nothing usable
    pub fn is_empty(&self) -> bool {
        match self {
            ActionInput::Text(text) => text.trim().is_empty(),
            ActionInput::Params(map) => map.is_empty(),
        }
    }
}

impl Default for ActionInput {
    fn default() -> Self {
        ActionInput::Text(String::new())
    }
}

impl From<&str> for ActionInput {
    fn from(text: &str) -> Self {
        ActionInput::Text(text.to_string())
    }
}

impl From<String> for ActionInput {
    fn from(text: String) -> Self {
        ActionInput::Text(text)
    }
}

/// Structured output of one reasoning step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Why the model picked this action; never empty
    pub reasoning: String,
    /// Tool to run
    pub tool: ToolKind,
    /// Input for the tool
    pub action_input: ActionInput,
    /// What the model expects to learn
    pub expected_outcome: String,
}

impl Decision {
    /// Create a new decision
    pub fn new(
        reasoning: impl Into<String>,
        tool: ToolKind,
        action_input: impl Into<ActionInput>,
        expected_outcome: impl Into<String>,
    ) -> Self {
        Self {
            reasoning: reasoning.into(),
            tool,
            action_input: action_input.into(),
            expected_outcome: expected_outcome.into(),
        }
    }
}

/// Normalized result of executing one decision
///
/// Fields are private so an observation is either a success carrying text or
/// a failure carrying an error detail, never a mix of both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    source_tool: ToolKind,
    raw_text: String,
    byte_length: usize,
    succeeded: bool,
    error_detail: Option<String>,
}

impl Observation {
    /// Create a successful observation
    pub fn success(tool: ToolKind, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        Self {
            source_tool: tool,
            byte_length: raw_text.len(),
            raw_text,
            succeeded: true,
            error_detail: None,
        }
    }

    /// Create a failed observation
    pub fn failure(tool: ToolKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            source_tool: tool,
            raw_text: String::new(),
            byte_length: 0,
            succeeded: false,
            error_detail: Some(if detail.trim().is_empty() {
                "unknown error".to_string()
            } else {
                detail
            }),
        }
    }

    /// Failed observation for a call that ran out of time
    pub fn timeout(tool: ToolKind) -> Self {
        Self::failure(tool, "timeout")
    }

    pub fn source_tool(&self) -> ToolKind {
        self.source_tool
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Whether this failure was caused by the time budget
    pub fn timed_out(&self) -> bool {
        self.error_detail.as_deref() == Some("timeout")
    }
}
