//! Session statistics

use std::time::Duration;

use serde::Serialize;

use crate::agent::loop_state::{AgentResult, Outcome};

/// Counters accumulated over an agent's lifetime
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    pub total_queries: u64,
    pub cache_hits: u64,
    pub tool_calls: u64,
    pub degraded_decisions: u64,
    pub graceful_failures: u64,
    total_response_time: Duration,
}

impl SessionStats {
    /// Fold one finished query into the counters
    pub fn record(&mut self, result: &AgentResult) {
        self.total_queries += 1;
        self.total_response_time += result.elapsed;
        self.tool_calls += result.tool_calls() as u64;
        self.degraded_decisions += result.cycles.iter().filter(|c| c.degraded).count() as u64;

        match result.outcome {
            Outcome::FromCache => self.cache_hits += 1,
            Outcome::GracefulFailure(_) => self.graceful_failures += 1,
            Outcome::Answered => {}
        }
    }

    pub fn avg_response_time(&self) -> Duration {
        match u32::try_from(self.total_queries) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_response_time / n,
            Err(_) => Duration::from_secs_f64(
                self.total_response_time.as_secs_f64() / self.total_queries as f64,
            ),
        }
    }

    /// Fraction of queries answered from the cache
    pub fn cache_hit_rate(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_queries as f64
        }
    }
}
