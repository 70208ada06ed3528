//! Plan generation: transport seam, retry loop, validation and caching

mod cache;
mod handler;
mod orchestrator;
mod transport;
mod validation;

pub use cache::{CacheKey, ResultCache, DEFAULT_CACHE_CAPACITY};
pub use handler::{GenerationAttempt, GenerationHandler, GenerationPhase, NoopHandler};
pub use orchestrator::{Orchestrator, PlanRequest, MAX_GOAL_CHARS};
pub use transport::{ChunkStream, GenerationOptions, GenerationRequest, TextGenerator};
pub use validation::{validate, Validation, DEFAULT_ACCEPTANCE_RATIO};
