//! Agent loop state management
//!
//! Tracks the cycles of one query's reason/act loop and turns them into the
//! context blocks the prompts need.

use std::time::Duration;

use serde::Serialize;

use crate::agent::parser::ParsedDecision;
use crate::core::text::truncate_chars;
use crate::core::{Decision, Observation, ToolKind};

/// Characters of each earlier observation shown to the reasoning step
const REASONING_PREVIEW_CHARS: usize = 300;

/// One reason/act round
#[derive(Debug, Clone, Serialize)]
pub struct CycleRecord {
    pub decision: Decision,
    /// Whether the decision came from the fallback heuristic
    pub degraded: bool,
    pub observation: Observation,
}

/// Phases of the agent loop
#[derive(Debug)]
pub enum LoopPhase {
    CacheCheck,
    Reason,
    Act(ParsedDecision),
    Observe,
    Synthesize,
}

/// Why a query ended without a synthesized answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The query was blank
    EmptyQuery,
    /// Both synthesis attempts failed
    SynthesisFailed,
    /// The wall-clock ceiling was reached
    WallClock,
}

/// How a query ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Answered,
    FromCache,
    GracefulFailure(FailureReason),
}

/// Result of processing one query
#[derive(Debug, Clone, Serialize)]
pub struct AgentResult {
    /// Final answer; never empty
    pub answer: String,
    pub cycles: Vec<CycleRecord>,
    pub cache_hit: bool,
    pub elapsed: Duration,
    pub outcome: Outcome,
}

impl AgentResult {
    /// Tool calls that actually ran (excludes `none`)
    pub fn tool_calls(&self) -> usize {
        self.cycles
            .iter()
            .filter(|c| c.decision.tool != ToolKind::None)
            .count()
    }
}

/// State of the agent reasoning loop
#[derive(Debug, Clone)]
pub struct AgentLoopState {
    /// Maximum allowed cycles
    pub max_iterations: usize,
    cycles: Vec<CycleRecord>,
}

impl AgentLoopState {
    /// Create a new loop state with the given iteration bound
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            cycles: Vec::new(),
        }
    }

    /// Completed cycles so far
    pub fn iteration(&self) -> usize {
        self.cycles.len()
    }

    pub fn cycles(&self) -> &[CycleRecord] {
        &self.cycles
    }

    pub fn into_cycles(self) -> Vec<CycleRecord> {
        self.cycles
    }

    /// Record a finished cycle; ignored once the bound is reached
    pub fn record(&mut self, parsed: ParsedDecision, observation: Observation) {
        if self.cycles.len() >= self.max_iterations {
            return;
        }
        let degraded = parsed.is_degraded();
        self.cycles.push(CycleRecord {
            decision: parsed.into_decision(),
            degraded,
            observation,
        });
    }

    /// Characters of successfully gathered text
    pub fn gathered_chars(&self) -> usize {
        self.cycles
            .iter()
            .filter(|c| c.observation.succeeded())
            .map(|c| c.observation.raw_text().chars().count())
            .sum()
    }

    /// Whether the gathered information is enough to answer
    ///
    /// A `none` decision always ends gathering.
    pub fn is_sufficient(&self, threshold: usize) -> bool {
        match self.cycles.last() {
            None => false,
            Some(last) if last.decision.tool == ToolKind::None => true,
            Some(_) => self.gathered_chars() >= threshold,
        }
    }

    /// Check if the loop should gather more information
    pub fn should_continue(&self, threshold: usize) -> bool {
        self.iteration() < self.max_iterations && !self.is_sufficient(threshold)
    }

    /// Summary of earlier cycles for the reasoning prompt
    pub fn format_history(&self) -> String {
        self.cycles
            .iter()
            .enumerate()
            .map(|(i, cycle)| {
                let obs = &cycle.observation;
                let result = if obs.succeeded() {
                    format!(
                        "succeeded ({} chars): {}",
                        obs.raw_text().chars().count(),
                        truncate_chars(obs.raw_text(), REASONING_PREVIEW_CHARS, "...")
                    )
                } else {
                    format!("failed: {}", obs.error_detail().unwrap_or("unknown error"))
                };
                format!(
                    "{}. {} \"{}\" -> {}",
                    i + 1,
                    cycle.decision.tool,
                    cycle.decision.action_input.as_text(),
                    result
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Observations for the synthesis prompt, bounded to `max_chars`
    ///
    /// Newest observations are kept first; once the budget is spent older
    /// ones are dropped. Kept blocks are returned in chronological order.
    /// Returns the text and how many observations were dropped.
    pub fn format_observations(&self, max_chars: usize) -> (String, usize) {
        let mut kept: Vec<String> = Vec::new();
        let mut used = 0;
        let mut dropped = 0;

        for (i, cycle) in self.cycles.iter().enumerate().rev() {
            let obs = &cycle.observation;
            if obs.source_tool() == ToolKind::None {
                continue;
            }

            let block = if obs.succeeded() {
                format!("### Source {} ({})\n{}\n", i + 1, obs.source_tool(), obs.raw_text())
            } else {
                format!(
                    "### Source {} ({}) failed: {}\n",
                    i + 1,
                    obs.source_tool(),
                    obs.error_detail().unwrap_or("unknown error")
                )
            };

            // Every block after the first costs one joining newline
            let len = block.chars().count() + usize::from(!kept.is_empty());
            if used + len <= max_chars {
                used += len;
                kept.push(block);
            } else if kept.is_empty() && max_chars > 0 {
                // The newest block alone is too long; keep its head
                let block = truncate_chars(&block, max_chars, "");
                used += block.chars().count();
                kept.push(block);
            } else {
                dropped += 1;
            }
        }

        kept.reverse();
        (kept.join("\n"), dropped)
    }
}
