//! Prompt construction for the reasoning and synthesis calls

use crate::core::ToolKind;

/// Prompt asking the model for the next decision
pub fn reasoning_prompt(query: &str, history: &str) -> String {
    let tools = ToolKind::ALL
        .iter()
        .map(|tool| format!("- {}: {}", tool, tool.description()))
        .collect::<Vec<_>>()
        .join("\n");

    let history = if history.is_empty() {
        String::new()
    } else {
        format!(
            "\n## Previous Actions\n{}\n\nDo not repeat an action that already succeeded. \
             Choose \"none\" if the information above already answers the query.\n",
            history
        )
    };

    format!(
        r#"You are a web research assistant. Decide the single next action for the user's query.

## Available Tools
{tools}

## Rules
- If the query contains a URL, use scrape with that URL.
- Use search for simple facts and search_and_scrape for questions that need detail.
- Use none only when no lookup is needed.

## User Query
"{query}"
{history}
Respond with ONLY a JSON object in this format:
{{"reasoning": "why this action", "tool": "search | scrape | search_and_scrape | none", "action_input": "search terms or URL", "expected_outcome": "what this should find"}}"#
    )
}

/// Prompt asking the model for the final answer
///
/// `incomplete` tells the model that some gathered observations were left
/// out to fit the prompt budget.
pub fn synthesis_prompt(query: &str, observations: &str, incomplete: bool) -> String {
    let observations = if observations.trim().is_empty() {
        "(no information could be gathered)".to_string()
    } else {
        observations.to_string()
    };
    let note = if incomplete {
        "\nNote: older findings were omitted for length.\n"
    } else {
        ""
    };

    format!(
        r#"You are a web research assistant. Answer the user's question using the information gathered below.

## Question
"{query}"

## Gathered Information
{observations}
{note}
## Instructions
- Answer directly and concisely.
- Cite the source URLs you relied on.
- If the information is missing or a source failed, say what could not be found instead of guessing.

Answer:"#
    )
}
