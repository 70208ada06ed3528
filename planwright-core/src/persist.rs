//! Hand-off of finished plans to a persistence collaborator
//!
//! Work that depends on a stored plan runs only after the store has
//! confirmed the save.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::plan::Plan;
use crate::Result;

/// Opaque identifier returned by a plan store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanId(pub String);

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for services that store finalized plans
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Store a plan and return its identifier
    async fn save(&self, plan: &Plan) -> Result<PlanId>;
}

/// Save a plan, then run `follow_up` with the confirmed identifier
///
/// `follow_up` never runs when the save fails.
pub async fn save_then<F, T>(store: &dyn PlanStore, plan: &Plan, follow_up: F) -> Result<(PlanId, T)>
where
    F: FnOnce(&PlanId, &Plan) -> T + Send,
{
    plan.ensure_complete()?;

    let id = store.save(plan).await.inspect_err(|e| {
        warn!(goal = %plan.goal, error = %e, "Plan save failed");
    })?;
    debug!(id = %id, "Plan saved, running follow-up");

    let output = follow_up(&id, plan);
    Ok((id, output))
}
