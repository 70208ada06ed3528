//! Planwright Core - turn a goal into a validated day-by-day plan
//!
//! This crate holds the pipeline that builds a structured prompt, streams
//! generator output through an incremental parser, and retries until the
//! plan has enough unique tasks. Network clients live in `planwright-llm`.

pub mod config;
pub mod error;
pub mod generate;
pub mod persist;
pub mod plan;
pub mod prompt;
pub mod rate_limit;
pub mod secrets;

pub use config::{Config, GenerationSettings, ModelConfig, RateLimitConfig};
pub use error::{Error, Result};
pub use generate::{
    GenerationHandler, GenerationOptions, GenerationPhase, GenerationRequest, Orchestrator,
    PlanRequest, ResultCache, TextGenerator,
};
pub use persist::{save_then, PlanId, PlanStore};
pub use plan::{parse_plan, DailyTask, MonthlyMilestone, ParseMode, ParseResult, Plan, PlanParser, WeeklyObjective};
pub use prompt::{build_prompt, build_request};
pub use rate_limit::RateLimiter;
pub use secrets::Secrets;
