//! Completeness validation for final-mode parses

use crate::plan::{ParseResult, Plan};
use crate::Error;

/// Minimum share of expected tasks for a plan to be accepted
pub const DEFAULT_ACCEPTANCE_RATIO: f64 = 0.7;

/// Verdict on a final-mode parse
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// Enough unique tasks; the plan is used as-is even if over-produced
    Accepted { plan: Plan, found: usize },
    /// No recognizable structure
    Unparseable,
    /// Structure found but too few unique tasks
    Shortfall { found: usize, expected: usize },
}

impl Validation {
    /// Number of unique tasks found
    pub fn found(&self) -> usize {
        match self {
            Validation::Accepted { found, .. } | Validation::Shortfall { found, .. } => *found,
            Validation::Unparseable => 0,
        }
    }

    /// Error describing a rejected parse
    pub fn to_error(&self) -> Option<Error> {
        match self {
            Validation::Accepted { .. } => None,
            Validation::Unparseable => Some(Error::ParseFailure),
            Validation::Shortfall { found, expected } => Some(Error::ValidationShortfall {
                found: *found,
                expected: *expected,
            }),
        }
    }
}

/// Check a final-mode parse against the expected task count
pub fn validate(result: ParseResult, expected: usize, acceptance_ratio: f64) -> Validation {
    let plan = match result {
        ParseResult::Complete(plan) | ParseResult::Partial(plan) => plan,
        ParseResult::Failed => return Validation::Unparseable,
    };
    if plan.ensure_complete().is_err() {
        return Validation::Unparseable;
    }

    let found = plan.total_tasks();
    if (found as f64) < expected as f64 * acceptance_ratio {
        return Validation::Shortfall { found, expected };
    }

    Validation::Accepted { plan, found }
}
