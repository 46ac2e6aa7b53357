//! Agent module - the research loop and its supporting pieces
//!
//! Contains the orchestrator that coordinates model calls and tool
//! execution, the decision parser, the query cache and loop bookkeeping.

pub mod cache;
pub mod loop_state;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod stats;

pub use cache::{normalize_query, CacheEntry, QueryCache};
pub use loop_state::{AgentLoopState, AgentResult, CycleRecord, FailureReason, LoopPhase, Outcome};
pub use orchestrator::{Agent, EMPTY_QUERY_ANSWER, GRACEFUL_FAILURE_ANSWER};
pub use parser::{fallback_decision, parse_decision, ParsedDecision};
pub use stats::SessionStats;
