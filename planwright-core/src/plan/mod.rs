//! Plan model and parsing
//!
//! This module turns generator markdown into a `Plan` tree of months,
//! weeks and daily tasks, suppressing near-duplicate tasks along the way.

mod dedup;
mod model;
mod normalize;
mod parser;

pub use dedup::{is_duplicate, jaccard_similarity, DedupFilter, DEFAULT_DEDUP_THRESHOLD};
pub use model::{DailyTask, MonthlyMilestone, Plan, WeeklyObjective};
pub use normalize::{normalize_for_comparison, strip_decoration};
pub use parser::{parse_plan, ParseMode, ParseResult, ParseStats, PlanParser};
