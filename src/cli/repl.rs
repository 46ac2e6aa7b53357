//! Interactive REPL for Quaero
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};

use crate::agent::{Agent, AgentResult, Outcome};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::text::truncate_chars;
use crate::core::{Config, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    agent: Agent,
    show_cycles: bool,
}

impl Repl {
    /// Create a REPL with custom configuration
    pub fn with_config(config: Config, show_cycles: bool) -> Result<Self> {
        Ok(Self {
            agent: Agent::from_config(config)?,
            show_cycles,
        })
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        print!("Checking model backend...");
        io::stdout().flush()?;
        match self.agent.initialize().await {
            Ok(()) => println!(" ready.\n"),
            Err(e) => {
                println!("\n\nInitialization error: {}\n", e);
                return Ok(());
            }
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &self.agent) {
                CommandResult::Exit => {
                    println!("\nGoodbye!");
                    break;
                }
                CommandResult::Handled(output) => println!("{}\n", output),
                CommandResult::Query(query) => {
                    println!("Researching...");
                    let result = self.agent.process(&query).await;
                    println!("\n{}\n", render_result(&result, self.show_cycles));
                }
            }
        }

        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = self.agent.config();

        println!(
            r#"
  ___
 / _ \ _   _  __ _  ___ _ __ ___
| | | | | | |/ _` |/ _ \ '__/ _ \
| |_| | |_| | (_| |  __/ | | (_) |
 \__\_\\__,_|\__,_|\___|_|  \___/

 Web research agent
"#
        );
        println!("Provider:   {} ({})", self.agent.provider_name(), config.llm.base_url);
        println!("Model:      {}", config.llm.model);
        println!(
            "Limits:     {} iterations, {}s per tool",
            config.agent.max_iterations, config.agent.tool_timeout_secs
        );
        println!();
        println!("Commands: help, stats, clear, config, exit");
        println!("───────────────────────────────────────────────────────────");
    }
}

/// Format an answer with its footer, optionally listing every cycle
pub fn render_result(result: &AgentResult, show_cycles: bool) -> String {
    let mut output = String::new();

    if show_cycles && !result.cycles.is_empty() {
        output.push_str("Cycles:\n");
        for (i, cycle) in result.cycles.iter().enumerate() {
            let obs = &cycle.observation;
            let status = if obs.succeeded() {
                format!("ok, {} bytes", obs.byte_length())
            } else {
                format!("failed: {}", obs.error_detail().unwrap_or("unknown error"))
            };
            output.push_str(&format!(
                "  {}. {}{} \"{}\" ({})\n     {}\n",
                i + 1,
                cycle.decision.tool,
                if cycle.degraded { " [heuristic]" } else { "" },
                truncate_chars(&cycle.decision.action_input.as_text(), 80, "..."),
                status,
                cycle.decision.reasoning
            ));
        }
        output.push('\n');
    }

    output.push_str(&result.answer);

    let source = match result.outcome {
        Outcome::FromCache => "cached",
        Outcome::Answered => "researched",
        Outcome::GracefulFailure(_) => "incomplete",
    };
    output.push_str(&format!(
        "\n\n[{} | {} cycle(s) | {:.1}s]",
        source,
        result.cycles.len(),
        result.elapsed.as_secs_f64()
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::agent::{CycleRecord, FailureReason};
    use crate::core::{Decision, Observation, ToolKind};

    fn result(outcome: Outcome) -> AgentResult {
        AgentResult {
            answer: "Rust 1.80 stabilized LazyLock.".to_string(),
            cycles: vec![
                CycleRecord {
                    decision: Decision::new("Need release notes", ToolKind::Search, "rust 1.80", ""),
                    degraded: false,
                    observation: Observation::success(ToolKind::Search, "notes"),
                },
                CycleRecord {
                    decision: Decision::new("guess", ToolKind::Scrape, "https://blog.example", ""),
                    degraded: true,
                    observation: Observation::failure(ToolKind::Scrape, "timeout"),
                },
            ],
            cache_hit: false,
            elapsed: Duration::from_millis(1500),
            outcome,
        }
    }

    #[test]
    fn test_render_footer() {
        let text = render_result(&result(Outcome::Answered), false);
        assert!(text.starts_with("Rust 1.80"));
        assert!(text.ends_with("[researched | 2 cycle(s) | 1.5s]"));
        assert!(!text.contains("Cycles:"));
    }

    #[test]
    fn test_render_cycles() {
        let text = render_result(
            &result(Outcome::GracefulFailure(FailureReason::WallClock)),
            true,
        );
        assert!(text.contains("1. search \"rust 1.80\" (ok, 5 bytes)"));
        assert!(text.contains("2. scrape [heuristic] \"https://blog.example\" (failed: timeout)"));
        assert!(text.contains("[incomplete |"));
    }
}
