//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::agent::Agent;

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Not a command; research it
    Query(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
}

/// Parse and handle special commands
pub fn handle_command(input: &str, agent: &Agent) -> CommandResult {
    let input = input.trim();
    let cmd = input.trim_start_matches('/').to_lowercase();

    match cmd.as_str() {
        "exit" | "quit" | "q" => CommandResult::Exit,

        "help" | "?" => CommandResult::Handled(help_text()),

        "clear" => {
            let dropped = agent.cache().len();
            agent.clear_cache();
            CommandResult::Handled(format!("Cache cleared ({} entries).", dropped))
        }

        "stats" => CommandResult::Handled(stats_text(agent)),

        "config" => CommandResult::Handled(config_text(agent)),

        _ if input.starts_with('/') => CommandResult::Handled(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            input
        )),

        _ => CommandResult::Query(input.to_string()),
    }
}

fn stats_text(agent: &Agent) -> String {
    let stats = agent.stats();
    format!(
        "Session Statistics:\n\
         ─────────────────────────────\n\
         Queries:           {}\n\
         Cache hits:        {} ({:.0}%)\n\
         Tool calls:        {}\n\
         Heuristic picks:   {}\n\
         Graceful failures: {}\n\
         Avg response:      {:.2}s\n\
         Cached answers:    {}/{}",
        stats.total_queries,
        stats.cache_hits,
        stats.cache_hit_rate() * 100.0,
        stats.tool_calls,
        stats.degraded_decisions,
        stats.graceful_failures,
        stats.avg_response_time().as_secs_f64(),
        agent.cache().len(),
        agent.cache().capacity()
    )
}

fn config_text(agent: &Agent) -> String {
    let config = agent.config();
    let on_off = |flag: bool| if flag { "on" } else { "off" };
    format!(
        "Configuration:\n\
         ─────────────────────────────\n\
         Provider:        {} ({})\n\
         Model:           {}\n\
         Max iterations:  {}\n\
         Tool timeout:    {}s\n\
         Wall clock:      {}s\n\
         Search results:  {}\n\
         Response limit:  {} chars\n\
         Caching:         {}\n\
         Debug:           {}",
        agent.provider_name(),
        config.llm.base_url,
        config.llm.model,
        config.agent.max_iterations,
        config.agent.tool_timeout_secs,
        config.agent.wall_clock_secs,
        config.agent.max_search_results,
        config.agent.max_response_length,
        on_off(config.agent.enable_caching),
        on_off(config.agent.debug)
    )
}

/// Generate help text
fn help_text() -> String {
    r#"Quaero Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  stats            Show session statistics
  clear            Clear cached answers
  config           Show current configuration
  exit, quit, q    Exit Quaero

Anything else is researched on the web and answered.

Keyboard Shortcuts:
  Ctrl+D           Exit Quaero
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::agent::QueryCache;
    use crate::core::{Config, Result};
    use crate::llm::{GenerateOptions, LLMProvider};
    use crate::tools::{DispatchSettings, FetchCapability, SearchCapability, SearchHit, ToolDispatcher};

    struct Silent;

    #[async_trait]
    impl LLMProvider for Silent {
        async fn complete(&self, _prompt: &str, _options: GenerateOptions) -> Result<String> {
            Ok(String::new())
        }

        fn name(&self) -> &str {
            "silent"
        }
    }

    #[async_trait]
    impl SearchCapability for Silent {
        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl FetchCapability for Silent {
        async fn fetch(&self, _url: &str) -> Result<String> {
            Ok(String::new())
        }
    }

    fn agent() -> Agent {
        let config = Config::default();
        let dispatcher = ToolDispatcher::new(
            Arc::new(Silent),
            Arc::new(Silent),
            DispatchSettings::from(&config.agent),
        );
        Agent::new(config, Arc::new(Silent), dispatcher, Arc::new(QueryCache::new(5)))
    }

    #[test]
    fn test_commands() {
        let agent = agent();
        assert_eq!(handle_command("exit", &agent), CommandResult::Exit);
        assert_eq!(handle_command(" QUIT ", &agent), CommandResult::Exit);
        assert!(matches!(handle_command("help", &agent), CommandResult::Handled(_)));
        assert!(matches!(handle_command("/stats", &agent), CommandResult::Handled(_)));
        assert!(matches!(handle_command("config", &agent), CommandResult::Handled(_)));
    }

    #[test]
    fn test_clear_empties_cache() {
        let agent = agent();
        agent.cache().put("q", "a");
        let result = handle_command("clear", &agent);

        assert_eq!(result, CommandResult::Handled("Cache cleared (1 entries).".to_string()));
        assert!(agent.cache().is_empty());
    }

    #[test]
    fn test_other_input_is_a_query() {
        let agent = agent();
        assert_eq!(
            handle_command("what is the stats package in R?", &agent),
            CommandResult::Query("what is the stats package in R?".to_string())
        );
        assert!(matches!(handle_command("/nope", &agent), CommandResult::Handled(_)));
    }
}
