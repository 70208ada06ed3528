//! Planwright CLI - Command line interface for Planwright
//!
//! Turns a goal into a validated, day-by-day plan.

mod commands;
mod output;
mod store;

use clap::{Parser, Subcommand};
use planwright_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ConfigArgs, GenerateArgs, ParseArgs, PromptArgs};

/// Planwright: goal-to-plan generation
#[derive(Parser, Debug)]
#[command(name = "planwright")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model to use (overrides config and env)
    #[arg(long, global = true, env = "PLANWRIGHT_MODEL")]
    model: Option<String>,

    /// API base URL (overrides config and env)
    #[arg(long, global = true, env = "PLANWRIGHT_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Generate a plan for a goal
    #[command(visible_alias = "g")]
    Generate(GenerateArgs),

    /// Parse saved generator output into a plan
    Parse(ParseArgs),

    /// Print the prompt for a goal without sending it
    Prompt(PromptArgs),

    /// Show current configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so plan output can be piped
    let default_filter = if cli.verbose { "planwright=debug,info" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.model.clone(), cli.base_url.clone())?;

    if cli.verbose {
        tracing::info!(
            model = %config.model.model,
            base_url = %config.model.base_url,
            max_retries = config.generation.max_retries,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("planwright {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Generate(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Parse(args)) => {
            args.execute(cli.verbose, &config)?;
        }
        Some(Commands::Prompt(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Config(args)) => {
            args.execute(&config)?;
        }
        None => {
            println!("Planwright - turn a goal into a day-by-day plan");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
