//! Agent orchestrator
//!
//! Runs the research loop for one query at a time:
//! cache check, then REASON → ACT → OBSERVE until the gathered information is
//! sufficient or the iteration bound is hit, then SYNTHESIZE.
//! Every path ends in an [`AgentResult`] with a non-empty answer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::agent::cache::QueryCache;
use crate::agent::loop_state::{AgentLoopState, AgentResult, FailureReason, LoopPhase, Outcome};
use crate::agent::parser::{fallback_decision, parse_decision, ParsedDecision};
use crate::agent::prompts::{reasoning_prompt, synthesis_prompt};
use crate::agent::stats::SessionStats;
use crate::core::text::truncate_chars;
use crate::core::{Config, Result};
use crate::llm::{create_provider, GenerateOptions, LLMProvider};
use crate::tools::ToolDispatcher;

/// Answer returned when research could not be completed
pub const GRACEFUL_FAILURE_ANSWER: &str = "I'm sorry, I wasn't able to complete the research for your question right now. Please try again in a moment or rephrase the question.";

/// Answer returned for a blank query
pub const EMPTY_QUERY_ANSWER: &str = "Please ask a question and I'll research it for you.";

const RESPONSE_TRIM_MARKER: &str = "\n... [response trimmed]";

/// Synthesis attempts before giving up
const SYNTHESIS_ATTEMPTS: usize = 2;

/// Main agent that orchestrates the model and tools
pub struct Agent {
    config: Config,
    llm: Arc<dyn LLMProvider>,
    dispatcher: ToolDispatcher,
    cache: Arc<QueryCache>,
    stats: Mutex<SessionStats>,
}

impl Agent {
    /// Create an agent from its parts
    pub fn new(
        config: Config,
        llm: Arc<dyn LLMProvider>,
        dispatcher: ToolDispatcher,
        cache: Arc<QueryCache>,
    ) -> Self {
        Self {
            config,
            llm,
            dispatcher,
            cache,
            stats: Mutex::new(SessionStats::default()),
        }
    }

    /// Create an agent with the configured provider and web capabilities
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let llm = create_provider(&config.llm)?;
        let dispatcher = ToolDispatcher::from_config(&config)?;
        let cache = Arc::new(QueryCache::new(config.agent.cache_max_entries));
        Ok(Self::new(config, llm, dispatcher, cache))
    }

    /// Check that the model backend is usable
    pub async fn initialize(&self) -> Result<()> {
        self.llm.check().await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Snapshot of the session counters
    pub fn stats(&self) -> SessionStats {
        self.lock_stats().clone()
    }

    fn lock_stats(&self) -> MutexGuard<'_, SessionStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer a query
    ///
    /// Never fails: model and tool errors degrade the answer instead, down to
    /// the fixed apology in [`GRACEFUL_FAILURE_ANSWER`].
    pub async fn process(&self, query: &str) -> AgentResult {
        let start = Instant::now();
        let result = self.run(query.trim(), start).await;

        self.lock_stats().record(&result);
        info!(
            outcome = ?result.outcome,
            cycles = result.cycles.len(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "query finished"
        );
        result
    }

    async fn run(&self, query: &str, start: Instant) -> AgentResult {
        let settings = &self.config.agent;

        if query.is_empty() {
            return finish(
                EMPTY_QUERY_ANSWER.to_string(),
                AgentLoopState::new(1),
                Outcome::GracefulFailure(FailureReason::EmptyQuery),
                start,
            );
        }

        info!(query, "processing query");
        let deadline = start + settings.wall_clock();
        let mut state = AgentLoopState::new(settings.max_iterations);
        let mut phase = LoopPhase::CacheCheck;

        loop {
            phase = match phase {
                LoopPhase::CacheCheck => {
                    if settings.enable_caching {
                        if let Some(answer) = self.cache.get(query) {
                            info!("answered from cache");
                            let mut result = finish(answer, state, Outcome::FromCache, start);
                            result.cache_hit = true;
                            return result;
                        }
                    }
                    LoopPhase::Reason
                }
                LoopPhase::Reason => {
                    let Some(remaining) = remaining(deadline) else {
                        return self.give_up(FailureReason::WallClock, state, start);
                    };
                    let budget = remaining.min(self.config.llm.timeout());
                    LoopPhase::Act(self.reason(query, &state, budget).await)
                }
                LoopPhase::Act(parsed) => {
                    let Some(remaining) = remaining(deadline) else {
                        return self.give_up(FailureReason::WallClock, state, start);
                    };
                    let budget = remaining.min(settings.tool_timeout());
                    let observation = self.dispatcher.execute(parsed.decision(), budget).await;

                    debug!(
                        cycle = state.iteration() + 1,
                        tool = %parsed.decision().tool,
                        input = %parsed.decision().action_input.as_text(),
                        degraded = parsed.is_degraded(),
                        succeeded = observation.succeeded(),
                        "cycle complete"
                    );
                    state.record(parsed, observation);
                    LoopPhase::Observe
                }
                LoopPhase::Observe => {
                    if state.should_continue(settings.sufficiency_threshold) {
                        LoopPhase::Reason
                    } else {
                        LoopPhase::Synthesize
                    }
                }
                LoopPhase::Synthesize => {
                    return match self.synthesize(query, &state, deadline).await {
                        Ok(answer) => {
                            if settings.enable_caching {
                                self.cache.put(query, answer.as_str());
                            }
                            finish(answer, state, Outcome::Answered, start)
                        }
                        Err(reason) => self.give_up(reason, state, start),
                    };
                }
            };
        }
    }

    /// Ask the model for the next decision
    ///
    /// A failed or timed-out call falls back to the heuristic decision.
    async fn reason(&self, query: &str, state: &AgentLoopState, budget: Duration) -> ParsedDecision {
        let prompt = reasoning_prompt(query, &state.format_history());
        let llm = &self.config.llm;
        let options = GenerateOptions::new(llm.planning_max_tokens, llm.planning_temperature);

        let parsed = match timeout(budget, self.llm.complete(&prompt, options)).await {
            Ok(Ok(raw)) => parse_decision(&raw, query),
            Ok(Err(e)) => {
                warn!(error = %e, "reasoning call failed, choosing tool heuristically");
                ParsedDecision::Degraded(fallback_decision("", query))
            }
            Err(_) => {
                warn!(budget_ms = budget.as_millis() as u64, "reasoning call timed out, choosing tool heuristically");
                ParsedDecision::Degraded(fallback_decision("", query))
            }
        };

        if parsed.is_degraded() {
            debug!(tool = %parsed.decision().tool, "using heuristic decision");
        } else {
            debug!(
                tool = %parsed.decision().tool,
                reasoning = %parsed.decision().reasoning,
                "model decision"
            );
        }
        parsed
    }

    /// Produce the final answer, retrying once
    async fn synthesize(
        &self,
        query: &str,
        state: &AgentLoopState,
        deadline: Instant,
    ) -> std::result::Result<String, FailureReason> {
        let (observations, dropped) = state.format_observations(self.config.agent.max_prompt_chars);
        if dropped > 0 {
            debug!(dropped, "older observations left out of synthesis prompt");
        }
        let prompt = synthesis_prompt(query, &observations, dropped > 0);

        let llm = &self.config.llm;
        let options = GenerateOptions::new(llm.synthesis_max_tokens, llm.synthesis_temperature);

        for attempt in 1..=SYNTHESIS_ATTEMPTS {
            let Some(remaining) = remaining(deadline) else {
                return Err(FailureReason::WallClock);
            };
            let budget = remaining.min(llm.timeout());

            match timeout(budget, self.llm.complete(&prompt, options.clone())).await {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    return Ok(truncate_chars(
                        text.trim(),
                        self.config.agent.max_response_length,
                        RESPONSE_TRIM_MARKER,
                    ));
                }
                Ok(Ok(_)) => warn!(attempt, "synthesis returned empty text"),
                Ok(Err(e)) => warn!(attempt, error = %e, "synthesis call failed"),
                Err(_) => warn!(attempt, "synthesis call timed out"),
            }
        }

        Err(FailureReason::SynthesisFailed)
    }

    fn give_up(&self, reason: FailureReason, state: AgentLoopState, start: Instant) -> AgentResult {
        warn!(?reason, cycles = state.iteration(), "returning graceful failure");
        finish(
            GRACEFUL_FAILURE_ANSWER.to_string(),
            state,
            Outcome::GracefulFailure(reason),
            start,
        )
    }
}

fn finish(answer: String, state: AgentLoopState, outcome: Outcome, start: Instant) -> AgentResult {
    AgentResult {
        answer,
        cycles: state.into_cycles(),
        cache_hit: false,
        elapsed: start.elapsed(),
        outcome,
    }
}

/// Time left before `deadline`, if any
fn remaining(deadline: Instant) -> Option<Duration> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|left| !left.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    use crate::core::{QuaeroError, ToolKind};
    use crate::tools::{DispatchSettings, FetchCapability, SearchCapability, SearchHit};

    /// Replies from a script, then repeats the last entry
    struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedLlm {
        async fn complete(&self, _prompt: &str, _options: GenerateOptions) -> Result<String> {
            *self.calls.lock().unwrap() += 1;
            let mut replies = self.replies.lock().unwrap();
            match replies.len() {
                0 => Err(QuaeroError::llm("script exhausted")),
                1 => match replies.front().unwrap() {
                    Ok(text) => Ok(text.clone()),
                    Err(e) => Err(QuaeroError::llm(e.to_string())),
                },
                _ => replies.pop_front().unwrap(),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct FixedSearch;

    #[async_trait]
    impl SearchCapability for FixedSearch {
        async fn search(&self, query: &str, _max: usize) -> Result<Vec<SearchHit>> {
            Ok(vec![SearchHit {
                title: format!("About {}", query),
                url: "https://info.example.com/".to_string(),
                snippet: "Plenty of useful detail about the topic at hand. ".repeat(5),
            }])
        }
    }

    struct FixedFetch;

    #[async_trait]
    impl FetchCapability for FixedFetch {
        async fn fetch(&self, _url: &str) -> Result<String> {
            Ok("Full article text with enough words to be useful.".to_string())
        }
    }

    fn agent(llm: Arc<ScriptedLlm>) -> Agent {
        let config = Config::default();
        let dispatcher = ToolDispatcher::new(
            Arc::new(FixedSearch),
            Arc::new(FixedFetch),
            DispatchSettings::from(&config.agent),
        );
        Agent::new(config, llm, dispatcher, Arc::new(QueryCache::new(10)))
    }

    const SEARCH_DECISION: &str =
        r#"{"reasoning": "look it up", "tool": "search", "action_input": "rust", "expected_outcome": "facts"}"#;

    #[tokio::test]
    async fn test_single_cycle_answer() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(SEARCH_DECISION.to_string()),
            Ok("Rust is a systems programming language.".to_string()),
        ]));
        let agent = agent(llm.clone());

        let result = agent.process("What is Rust?").await;
        assert_eq!(result.outcome, Outcome::Answered);
        assert_eq!(result.answer, "Rust is a systems programming language.");
        assert_eq!(result.cycles.len(), 1);
        assert!(!result.cycles[0].degraded);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_blank_query_skips_model() {
        let llm = Arc::new(ScriptedLlm::new(vec![Ok("unused".to_string())]));
        let agent = agent(llm.clone());

        let result = agent.process("   ").await;
        assert_eq!(result.answer, EMPTY_QUERY_ANSWER);
        assert_eq!(
            result.outcome,
            Outcome::GracefulFailure(FailureReason::EmptyQuery)
        );
        assert_eq!(llm.calls(), 0);
        assert!(agent.cache().is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_retries_once_then_apologizes() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(SEARCH_DECISION.to_string()),
            Ok("   ".to_string()),
            Err(QuaeroError::llm("overloaded")),
        ]));
        let agent = agent(llm.clone());

        let result = agent.process("What is Rust?").await;
        assert_eq!(result.answer, GRACEFUL_FAILURE_ANSWER);
        assert_eq!(
            result.outcome,
            Outcome::GracefulFailure(FailureReason::SynthesisFailed)
        );
        assert_eq!(result.cycles.len(), 1);
        assert_eq!(llm.calls(), 3);
        assert!(agent.cache().is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_error_then_success_is_answered() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(SEARCH_DECISION.to_string()),
            Err(QuaeroError::llm("connection reset")),
            Ok("Rust is a systems programming language.".to_string()),
        ]));
        let agent = agent(llm.clone());

        let result = agent.process("What is Rust?").await;
        assert_eq!(result.outcome, Outcome::Answered);
        assert_eq!(result.answer, "Rust is a systems programming language.");
        assert_eq!(llm.calls(), 3);
        assert_eq!(
            agent.cache().get("what is rust?").as_deref(),
            Some("Rust is a systems programming language.")
        );
    }

    #[tokio::test]
    async fn test_none_decision_goes_straight_to_synthesis() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(r#"{"reasoning": "greeting", "tool": "none", "action_input": "", "expected_outcome": ""}"#.to_string()),
            Ok("Hello!".to_string()),
        ]));
        let agent = agent(llm);

        let result = agent.process("hi there").await;
        assert_eq!(result.answer, "Hello!");
        assert_eq!(result.cycles.len(), 1);
        assert_eq!(result.cycles[0].decision.tool, ToolKind::None);
        assert_eq!(agent.stats().tool_calls, 0);
    }

    #[tokio::test]
    async fn test_answer_is_trimmed_to_limit() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(SEARCH_DECISION.to_string()),
            Ok("word ".repeat(2000)),
        ]));
        let agent = agent(llm);

        let result = agent.process("long please").await;
        let limit = agent.config().agent.max_response_length;
        assert!(result.answer.ends_with("[response trimmed]"));
        assert_eq!(
            result.answer.chars().count(),
            limit + RESPONSE_TRIM_MARKER.chars().count()
        );
    }

    #[tokio::test]
    async fn test_stats_track_cache_hits() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Ok(SEARCH_DECISION.to_string()),
            Ok("Answer.".to_string()),
        ]));
        let agent = agent(llm);

        agent.process("What is Rust?").await;
        let second = agent.process("  what is rust?").await;
        assert!(second.cache_hit);
        assert_eq!(second.answer, "Answer.");

        let stats = agent.stats();
        assert_eq!(stats.total_queries, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.tool_calls, 1);
    }
}
