//! Parse command - parse a saved generator response

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use planwright_core::generate::{validate, Validation};
use planwright_core::{Config, ParseMode, ParseResult, Plan, PlanParser};

use crate::output::render_plan;

/// Arguments for the parse command
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// File holding raw generator output
    #[arg(required = true)]
    pub file: PathBuf,

    /// Goal to attach to the plan (defaults to the file name)
    #[arg(short, long)]
    pub goal: Option<String>,

    /// Check the plan against this many expected tasks
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Replay the text line by line through the streaming parser first
    #[arg(long)]
    pub stream: bool,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

impl ParseArgs {
    /// Execute the parse command
    pub fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let text = std::fs::read_to_string(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let goal = self.goal.clone().unwrap_or_else(|| {
            self.file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Untitled goal".to_string())
        });
        let parser = PlanParser::new().with_dedup_threshold(config.generation.dedup_threshold);

        if self.stream {
            for (lines, preview) in replay(&parser, &text, &goal, self.days).enumerate() {
                eprintln!(
                    "[{:>4}] {} months, {} weeks, {} tasks",
                    lines + 1,
                    preview.months.len(),
                    preview.total_weeks(),
                    preview.total_tasks()
                );
            }
        }

        let (result, stats) = parser.parse_with_stats(&text, &goal, self.days, ParseMode::Final);
        if verbose {
            eprintln!(
                "[headers: {}, duplicates skipped: {}, ignored lines: {}, synthesized months: {}]",
                stats.headers,
                stats.duplicates_skipped,
                stats.ignored_lines,
                stats.synthesized_months
            );
        }

        let plan = match self.days {
            Some(days) => {
                match validate(result, days as usize, config.generation.acceptance_ratio) {
                    Validation::Accepted { plan, found } => {
                        eprintln!("Accepted: {} of {} expected tasks", found, days);
                        plan
                    }
                    rejected => {
                        let reason = rejected
                            .to_error()
                            .map(|e| e.to_string())
                            .unwrap_or_default();
                        anyhow::bail!("{}: {}", self.file.display(), reason);
                    }
                }
            }
            None => match result {
                ParseResult::Failed => anyhow::bail!(
                    "{}: no month or week headers found",
                    self.file.display()
                ),
                other => other
                    .into_plan()
                    .context("parser returned no plan")?,
            },
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print!("{}", render_plan(&plan));
        }
        Ok(())
    }
}

/// Streaming-mode previews of `text`, one per line received
fn replay<'a>(
    parser: &'a PlanParser,
    text: &'a str,
    goal: &'a str,
    days: Option<u32>,
) -> impl Iterator<Item = Plan> + 'a {
    text.split_inclusive('\n').scan(0usize, move |received, line| {
        *received += line.len();
        parser
            .parse(&text[..*received], goal, days, ParseMode::Streaming)
            .into_plan()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "## Month 1: Basics\n### Week 1: Start\n- Day 1: Read\n- Day 2: Write\n";

    #[test]
    fn test_replay_grows_monotonically() {
        let parser = PlanParser::new();
        let counts: Vec<usize> = replay(&parser, RESPONSE, "Goal", None)
            .map(|p| p.total_tasks())
            .collect();
        assert_eq!(counts, vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_execute_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("response.md");
        std::fs::write(&path, RESPONSE).unwrap();

        let args = ParseArgs {
            file: path,
            goal: None,
            days: Some(2),
            stream: true,
            json: true,
        };
        assert!(args.execute(false, &Config::default()).is_ok());
    }

    #[test]
    fn test_execute_reports_shortfall() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("response.md");
        std::fs::write(&path, RESPONSE).unwrap();

        let args = ParseArgs {
            file: path,
            goal: Some("Goal".to_string()),
            days: Some(30),
            stream: false,
            json: false,
        };
        let err = args.execute(false, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("found 2, expected 30"));
    }
}
