//! Callbacks for observing a plan generation

use serde::{Deserialize, Serialize};

use crate::plan::Plan;

/// Where a generation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum GenerationPhase {
    /// No generation running
    Idle,
    /// Receiving chunks for an attempt
    Streaming { attempt: u32 },
    /// Running the final parse and completeness check
    Validating { attempt: u32 },
    /// The attempt produced too few tasks and will be retried
    Shortfall { attempt: u32 },
    /// A plan was accepted
    Done,
    /// The generation failed
    Failed,
}

impl GenerationPhase {
    /// Whether a generation is in flight
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            GenerationPhase::Streaming { .. }
                | GenerationPhase::Validating { .. }
                | GenerationPhase::Shortfall { .. }
        )
    }
}

impl std::fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationPhase::Idle => write!(f, "idle"),
            GenerationPhase::Streaming { attempt } => write!(f, "streaming (attempt {})", attempt),
            GenerationPhase::Validating { attempt } => {
                write!(f, "validating (attempt {})", attempt)
            }
            GenerationPhase::Shortfall { attempt } => write!(f, "shortfall (attempt {})", attempt),
            GenerationPhase::Done => write!(f, "done"),
            GenerationPhase::Failed => write!(f, "failed"),
        }
    }
}

/// One try at generating a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAttempt {
    /// Goal text
    pub goal: String,
    /// Requested plan duration
    pub duration_days: u32,
    /// 1-based attempt number
    pub attempt_number: u32,
    /// Unique tasks the plan should contain
    pub expected_task_count: usize,
}

/// Handler for generation progress
///
/// Callbacks run synchronously on the generating task, in arrival order.
pub trait GenerationHandler: Send {
    /// Called on every phase change
    fn on_phase(&mut self, _phase: GenerationPhase) {}

    /// Called when an attempt starts
    fn on_attempt_start(&mut self, _attempt: &GenerationAttempt) {}

    /// Called with each raw text chunk
    fn on_chunk(&mut self, _chunk: &str) {}

    /// Called with the streaming-mode parse after each chunk
    fn on_partial(&mut self, _plan: &Plan) {}

    /// Called when an attempt is rejected
    fn on_shortfall(&mut self, _attempt: &GenerationAttempt, _found: usize) {}

    /// Called once with the accepted plan
    fn on_complete(&mut self, _plan: &Plan, _attempts: u32) {}
}

/// Handler that ignores every callback
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl GenerationHandler for NoopHandler {}
