//! Prompt command - show the prompt that would be sent

use clap::Args;
use planwright_core::{build_prompt, Config, PlanRequest};

/// Arguments for the prompt command
#[derive(Args, Debug)]
pub struct PromptArgs {
    /// The goal to plan for
    #[arg(required = true)]
    pub goal: String,

    /// Plan length in days (defaults to the configured duration)
    #[arg(short, long)]
    pub days: Option<u32>,
}

impl PromptArgs {
    /// Execute the prompt command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let request = PlanRequest::new(&self.goal, self.days)?;
        let days = request
            .duration_days
            .unwrap_or(config.generation.default_duration_days);

        println!("{}", build_prompt(&request.goal, Some(days)));
        Ok(())
    }
}
