//! Config command - show effective configuration

use clap::Args;
use planwright_core::{Config, Secrets};

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Create a secrets file template if none exists
    #[arg(long)]
    pub init_secrets: bool,
}

impl ConfigArgs {
    /// Execute the config command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if self.init_secrets {
            let path = Secrets::create_template()?;
            println!("Created secrets template at {}", path.display());
            println!("Add your API key, then keep the file private (chmod 600).");
            return Ok(());
        }

        let g = &config.generation;
        let m = &config.model;

        println!("Planwright Configuration");
        println!("========================");
        println!();
        println!("Generation Settings:");
        println!("  default_duration_days: {}", g.default_duration_days);
        println!("  max_retries: {}", g.max_retries);
        println!("  acceptance_ratio: {}", g.acceptance_ratio);
        println!("  dedup_threshold: {}", g.dedup_threshold);
        println!("  cache_capacity: {}", g.cache_capacity);
        println!();
        println!("Model Settings:");
        println!("  base_url: {}", m.base_url);
        println!("  model: {}", m.model);
        println!("  temperature: {}", m.options.temperature);
        println!("  top_k: {}", m.options.top_k);
        println!("  top_p: {}", m.options.top_p);
        println!("  max_output_tokens: {}", m.options.max_output_tokens);
        println!("  timeout: {}s", m.timeout.as_secs());
        println!();
        println!("Rate Limit:");
        println!(
            "  {} requests per {}s",
            config.rate_limit.max_requests,
            config.rate_limit.window.as_secs()
        );
        println!();

        if let Some(path) = Config::default_config_path() {
            println!("Config file: {}", path.display());
            if path.exists() {
                println!("  (exists)");
            } else {
                println!("  (not found - using defaults)");
            }
        }

        let api_key = Secrets::load().ok().and_then(|s| s.api_key());
        println!(
            "API key: {}",
            if api_key.is_some() { "configured" } else { "not set" }
        );
        Ok(())
    }
}
