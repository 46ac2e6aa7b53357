//! Quaero - Web Research Agent
//!
//! Main entry point for the CLI application.

use clap::Parser;
use quaero::core::{Profile, ProviderType};
use quaero::{render_result, Agent, Config, Repl};
use tracing_subscriber::EnvFilter;

/// Quaero - answers questions by searching and reading the web
#[derive(Parser, Debug)]
#[command(name = "quaero")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Model name
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Model backend (ollama, openai, cerebras)
    #[arg(long)]
    provider: Option<ProviderType>,

    /// Preset limits (demo, production, development)
    #[arg(long)]
    profile: Option<Profile>,

    /// Maximum reason/act cycles per query
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Disable the answer cache
    #[arg(long)]
    no_cache: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Print every cycle's decision and outcome
    #[arg(long)]
    show_cycles: bool,
}

fn log_filter(debug: bool) -> EnvFilter {
    let default = if debug { "quaero=debug" } else { "quaero=info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn init_tracing(debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(debug))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration; config file problems are reported before the
    // final log level is known
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.debug))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let mut config = tracing::subscriber::with_default(bootstrap, Config::load);

    // Apply CLI overrides
    if let Some(profile) = args.profile {
        config.agent.apply_profile(profile);
    }

    if let Some(provider) = args.provider {
        config.llm.switch_provider(provider);
    }

    if let Some(ref model) = args.model {
        config.llm.model = model.clone();
    }

    if let Some(n) = args.max_iterations {
        config.agent.max_iterations = n;
    }

    if args.no_cache {
        config.agent.enable_caching = false;
    }

    if args.debug {
        config.agent.debug = true;
    }

    config.validate()?;
    init_tracing(config.agent.debug);

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let agent = Agent::from_config(config)?;
        agent.initialize().await?;

        let result = agent.process(&prompt).await;
        println!("{}", render_result(&result, args.show_cycles));
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config, args.show_cycles)?;
    repl.run().await?;

    Ok(())
}
