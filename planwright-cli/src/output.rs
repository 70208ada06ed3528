//! Terminal output for plan generation

use std::io::Write;

use planwright_core::generate::{GenerationAttempt, GenerationHandler, GenerationPhase};
use planwright_core::Plan;

/// Handler that reports generation progress on stderr
pub struct PrintHandler {
    /// Whether to echo raw generator text
    verbose: bool,
    /// Suppress progress entirely
    quiet: bool,
    last_tasks: usize,
}

impl PrintHandler {
    /// Create a new print handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            last_tasks: 0,
        }
    }
}

impl GenerationHandler for PrintHandler {
    fn on_phase(&mut self, phase: GenerationPhase) {
        if self.verbose && !self.quiet {
            eprintln!("[phase: {}]", phase);
        }
    }

    fn on_attempt_start(&mut self, attempt: &GenerationAttempt) {
        self.last_tasks = 0;
        if !self.quiet {
            eprintln!(
                "Attempt {}: generating a {}-day plan ({} tasks expected)",
                attempt.attempt_number, attempt.duration_days, attempt.expected_task_count
            );
        }
    }

    fn on_chunk(&mut self, chunk: &str) {
        if self.verbose && !self.quiet {
            eprint!("{}", chunk);
        }
    }

    fn on_partial(&mut self, plan: &Plan) {
        if self.quiet || self.verbose {
            return;
        }
        let tasks = plan.total_tasks();
        if tasks != self.last_tasks {
            self.last_tasks = tasks;
            eprint!(
                "\r  {} months, {} weeks, {} tasks",
                plan.months.len(),
                plan.total_weeks(),
                tasks
            );
            let _ = std::io::stderr().flush();
        }
    }

    fn on_shortfall(&mut self, attempt: &GenerationAttempt, found: usize) {
        if !self.quiet {
            eprintln!();
            eprintln!(
                "Attempt {} produced {} of {} tasks",
                attempt.attempt_number, found, attempt.expected_task_count
            );
        }
    }

    fn on_complete(&mut self, plan: &Plan, attempts: u32) {
        if !self.quiet {
            eprintln!();
            eprintln!(
                "Plan ready: {} tasks after {} attempt(s)",
                plan.total_tasks(),
                attempts
            );
        }
    }
}

/// Render a plan as a markdown checklist
pub fn render_plan(plan: &Plan) -> String {
    let mut out = format!("# {}\n", plan.goal);
    for month in &plan.months {
        out.push_str(&format!("\n## Month {}: {}\n", month.index, month.title));
        for week in &month.weeks {
            out.push_str(&format!("\n### Week {}: {}\n", week.index, week.title));
            for task in &week.tasks {
                let mark = if task.completed { "x" } else { " " };
                out.push_str(&format!("- [{}] Day {}: {}\n", mark, task.day, task.description));
            }
        }
    }
    out
}
