//! Decision parser
//!
//! Two stages: a strict attempt to read a JSON decision out of the model's
//! text, then a keyword/URL heuristic when that fails. Parsing never fails;
//! the result says whether the model cooperated or the decision was guessed.

use serde::Deserialize;
use serde_json::Value;

use crate::core::text::find_url;
use crate::core::{ActionInput, Decision, ToolKind};

/// Reasoning attached to every heuristic decision
pub const FALLBACK_REASONING: &str =
    "Model output could not be parsed as a decision; tool chosen heuristically";

/// Reasoning used when a structured decision omits it
const MISSING_REASONING: &str = "No reasoning provided by the model";

/// Upper bound on candidate JSON start positions tried per output
const MAX_JSON_CANDIDATES: usize = 32;

/// A decision tagged with how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDecision {
    /// The model produced a valid structured decision
    Structured(Decision),
    /// The decision was inferred by the fallback heuristic
    Degraded(Decision),
}

impl ParsedDecision {
    pub fn decision(&self) -> &Decision {
        match self {
            ParsedDecision::Structured(d) | ParsedDecision::Degraded(d) => d,
        }
    }

    pub fn into_decision(self) -> Decision {
        match self {
            ParsedDecision::Structured(d) | ParsedDecision::Degraded(d) => d,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ParsedDecision::Degraded(_))
    }
}

/// Wire shape of a decision as models write it
#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default, alias = "input")]
    action_input: Option<Value>,
    #[serde(default)]
    expected_outcome: Option<String>,
}

/// Parse raw model output into a decision for `query`
pub fn parse_decision(raw: &str, query: &str) -> ParsedDecision {
    match parse_structured(raw, query) {
        Some(decision) => ParsedDecision::Structured(decision),
        None => ParsedDecision::Degraded(fallback_decision(raw, query)),
    }
}

/// Try every `{` in the output as the start of a JSON decision
///
/// Reading with a stream deserializer tolerates prose after the object, and
/// starting from each brace tolerates prose and code fences before it.
fn parse_structured(raw: &str, query: &str) -> Option<Decision> {
    raw.match_indices('{')
        .take(MAX_JSON_CANDIDATES)
        .find_map(|(start, _)| {
            let mut stream =
                serde_json::Deserializer::from_str(&raw[start..]).into_iter::<RawDecision>();
            match stream.next() {
                Some(Ok(candidate)) => into_decision(candidate, query),
                _ => None,
            }
        })
}

fn into_decision(raw: RawDecision, query: &str) -> Option<Decision> {
    let tool: ToolKind = raw.tool?.parse().ok()?;

    let mut action_input = match raw.action_input {
        None | Some(Value::Null) => ActionInput::default(),
        Some(Value::String(text)) => ActionInput::Text(text.trim().to_string()),
        Some(Value::Object(map)) => ActionInput::Params(map),
        Some(other) => ActionInput::Text(other.to_string()),
    };

    if action_input.is_empty() {
        action_input = match tool {
            ToolKind::Search | ToolKind::SearchAndScrape => ActionInput::Text(query.trim().to_string()),
            ToolKind::Scrape => find_url(query).map(ActionInput::Text).unwrap_or_default(),
            ToolKind::None => ActionInput::default(),
        };
    }

    let reasoning = raw
        .reasoning
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| MISSING_REASONING.to_string());

    Some(Decision {
        reasoning,
        tool,
        action_input,
        expected_outcome: raw.expected_outcome.unwrap_or_default(),
    })
}

/// Heuristic decision used when the model output is unusable
///
/// A URL in the query wins; otherwise the raw text's tool keywords decide,
/// defaulting to the comprehensive `search_and_scrape`.
pub fn fallback_decision(raw: &str, query: &str) -> Decision {
    let query = query.trim();
    let lowered = raw.to_lowercase();

    if let Some(url) = find_url(query) {
        return Decision::new(
            FALLBACK_REASONING,
            ToolKind::Scrape,
            url,
            "Readable content of the linked page",
        );
    }

    if lowered.contains("scrape") {
        if let Some(url) = find_url(raw) {
            return Decision::new(
                FALLBACK_REASONING,
                ToolKind::Scrape,
                url,
                "Readable content of the page the model named",
            );
        }
    }

    if lowered.contains("web_search") || lowered.contains("quick search") {
        return Decision::new(
            FALLBACK_REASONING,
            ToolKind::Search,
            query,
            "Search result snippets",
        );
    }

    Decision::new(
        FALLBACK_REASONING,
        ToolKind::SearchAndScrape,
        query,
        "Comprehensive search results",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_clean_json() {
        let raw = r#"{"reasoning": "Need current prices", "tool": "search", "action_input": "rtx 4090 price", "expected_outcome": "price list"}"#;
        let parsed = parse_decision(raw, "how much is a 4090");

        assert!(!parsed.is_degraded());
        let d = parsed.decision();
        assert_eq!(d.tool, ToolKind::Search);
        assert_eq!(d.action_input, ActionInput::from("rtx 4090 price"));
        assert_eq!(d.reasoning, "Need current prices");
        assert_eq!(d.expected_outcome, "price list");
    }

    #[test]
    fn test_parses_json_inside_prose_and_fences() {
        let raw = "Sure! Here is my plan:\n```json\n{\"reasoning\": \"r\", \"tool\": \"search_and_scrape\", \"action_input\": \"best laptop\", \"expected_outcome\": \"reviews\"}\n```\nLet me know.";
        let parsed = parse_decision(raw, "best laptop");

        assert!(!parsed.is_degraded());
        assert_eq!(parsed.decision().tool, ToolKind::SearchAndScrape);
    }

    #[test]
    fn test_accepts_legacy_names_and_input_alias() {
        let raw = r#"{"tool": "scrape_url", "input": "https://example.com", "reasoning": "URL detected"}"#;
        let parsed = parse_decision(raw, "summarize https://example.com");

        assert!(!parsed.is_degraded());
        assert_eq!(parsed.decision().tool, ToolKind::Scrape);
        assert_eq!(parsed.decision().action_input.as_text(), "https://example.com");
    }

    #[test]
    fn test_structured_params_input() {
        let raw = r#"{"reasoning": "r", "tool": "scrape", "action_input": {"url": "https://a.example/x"}, "expected_outcome": ""}"#;
        let parsed = parse_decision(raw, "read it");

        assert_eq!(
            parsed.decision().action_input.get_string("url").as_deref(),
            Some("https://a.example/x")
        );
    }

    #[test]
    fn test_skips_leading_braces_that_are_not_decisions() {
        let raw = r#"Thinking {about it}... {"reasoning": "r", "tool": "none", "action_input": "", "expected_outcome": ""}"#;
        let parsed = parse_decision(raw, "hi");

        assert!(!parsed.is_degraded());
        assert_eq!(parsed.decision().tool, ToolKind::None);
    }

    #[test]
    fn test_empty_input_defaults_to_query_and_blank_reasoning_is_filled() {
        let raw = r#"{"reasoning": "  ", "tool": "search", "action_input": "", "expected_outcome": ""}"#;
        let parsed = parse_decision(raw, "  Best laptop ");

        let d = parsed.decision();
        assert_eq!(d.action_input.as_text(), "Best laptop");
        assert!(!d.reasoning.is_empty());
    }

    #[test]
    fn test_unknown_tool_is_degraded() {
        let raw = r#"{"reasoning": "r", "tool": "browse_web", "action_input": "x", "expected_outcome": ""}"#;
        let parsed = parse_decision(raw, "latest rust release");

        assert!(parsed.is_degraded());
        assert_eq!(parsed.decision().tool, ToolKind::SearchAndScrape);
        assert_eq!(parsed.decision().reasoning, FALLBACK_REASONING);
    }

    #[test]
    fn test_missing_tool_is_degraded() {
        let raw = r#"{"reasoning": "r", "action_input": "x"}"#;
        assert!(parse_decision(raw, "q").is_degraded());
    }

    #[test]
    fn test_prose_with_url_in_query_selects_scrape() {
        let raw = "I think we should look at that page and summarize it for the user.";
        let parsed = parse_decision(raw, "What does https://example.com/about say?");

        assert!(parsed.is_degraded());
        let d = parsed.decision();
        assert_eq!(d.tool, ToolKind::Scrape);
        assert_eq!(d.action_input.as_text(), "https://example.com/about");
        assert!(!d.reasoning.is_empty());
    }

    #[test]
    fn test_prose_without_url_defaults_to_search_and_scrape() {
        let parsed = parse_decision("no idea, sorry", "best laptop for programming");

        assert!(parsed.is_degraded());
        assert_eq!(parsed.decision().tool, ToolKind::SearchAndScrape);
        assert_eq!(
            parsed.decision().action_input.as_text(),
            "best laptop for programming"
        );
    }

    #[test]
    fn test_keyword_heuristics() {
        let d = fallback_decision("a quick search should do (web_search)", "rust version");
        assert_eq!(d.tool, ToolKind::Search);

        let d = fallback_decision("scrape https://news.example.com/today please", "news");
        assert_eq!(d.tool, ToolKind::Scrape);
        assert_eq!(d.action_input.as_text(), "https://news.example.com/today");
    }

    #[test]
    fn test_empty_output_still_yields_decision() {
        let parsed = parse_decision("", "what is rust");
        assert!(parsed.is_degraded());
        assert_eq!(parsed.decision().reasoning, FALLBACK_REASONING);
    }
}
