//! Generate command - turn a goal into a plan

use std::sync::Arc;

use clap::Args;
use planwright_core::{save_then, Config, Orchestrator, PlanRequest, RateLimiter, Secrets};
use planwright_llm::GeminiClient;

use crate::output::{render_plan, PrintHandler};
use crate::store::JsonFileStore;

/// Rate-limit key for requests made from this terminal
const LOCAL_REQUESTER: &str = "local";

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// The goal to plan for
    #[arg(required = true)]
    pub goal: String,

    /// Plan length in days (defaults to the configured duration)
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Save the plan to the data directory
    #[arg(long)]
    pub save: bool,

    /// Hide progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Wait for the full response instead of streaming
    #[arg(long)]
    pub no_stream: bool,
}

impl GenerateArgs {
    /// Execute the generate command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let request = PlanRequest::new(&self.goal, self.days)?.with_requester(LOCAL_REQUESTER);

        let secrets = Secrets::load()?;
        let client = GeminiClient::from_config(&config.model, &secrets)?;
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit.max_requests,
            config.rate_limit.window,
        ));

        let orchestrator = Orchestrator::new(Arc::new(client), config.generation)
            .with_options(config.model.options)
            .with_rate_limiter(limiter)
            .with_streaming(!self.no_stream);

        if verbose {
            tracing::info!(
                goal = %request.goal,
                days = ?request.duration_days,
                model = %config.model.model,
                streaming = !self.no_stream,
                "Starting plan generation"
            );
        }

        let mut handler = PrintHandler::new(verbose, self.quiet);
        let plan = orchestrator.generate(&request, &mut handler).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print!("{}", render_plan(&plan));
        }

        if self.save {
            let store = JsonFileStore::open_default()?;
            let (_, summary) = save_then(&store, &plan, |id, plan| {
                format!(
                    "Saved plan {} ({} tasks) to {}",
                    id,
                    plan.total_tasks(),
                    store.path_for(id).display()
                )
            })
            .await?;
            eprintln!("{}", summary);
        }

        Ok(())
    }
}
