//! Plan storage as JSON files in the user's data directory

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use planwright_core::{Error, Plan, PlanId, PlanStore, Result};
use tracing::info;

/// Stores each plan as `<id>.json` in a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under `<data dir>/planwright/plans`
    pub fn open_default() -> Result<Self> {
        let dir = dirs::data_dir()
            .map(|p| p.join("planwright").join("plans"))
            .ok_or_else(|| Error::Persistence("Could not determine data directory".to_string()))?;
        Ok(Self::new(dir))
    }

    /// Directory holding the plan files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file for `id`
    pub fn path_for(&self, id: &PlanId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Read a stored plan back
    pub async fn load(&self, id: &PlanId) -> Result<Plan> {
        let bytes = tokio::fs::read(self.path_for(id)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl PlanStore for JsonFileStore {
    async fn save(&self, plan: &Plan) -> Result<PlanId> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Persistence(format!("{}: {}", self.dir.display(), e)))?;

        let json = serde_json::to_vec_pretty(plan)?;
        let stem = format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S%3f"), slug(&plan.goal));

        let mut suffix = 0u32;
        loop {
            let id = match suffix {
                0 => PlanId(stem.clone()),
                n => PlanId(format!("{}-{}", stem, n)),
            };
            let path = self.path_for(&id);

            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match file {
                Ok(mut file) => {
                    use tokio::io::AsyncWriteExt;
                    file.write_all(&json)
                        .await
                        .map_err(|e| Error::Persistence(format!("{}: {}", path.display(), e)))?;
                    file.flush()
                        .await
                        .map_err(|e| Error::Persistence(format!("{}: {}", path.display(), e)))?;
                    info!(id = %id, path = %path.display(), "Saved plan");
                    return Ok(id);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => {
                    return Err(Error::Persistence(format!("{}: {}", path.display(), e)));
                }
            }
        }
    }
}

/// Lowercase ASCII slug of at most 40 characters
fn slug(goal: &str) -> String {
    let mut out = String::new();
    for c in goal.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
        if out.len() >= 40 {
            break;
        }
    }
    let out = out.trim_end_matches('-');
    if out.is_empty() {
        "plan".to_string()
    } else {
        out.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planwright_core::{parse_plan, save_then, ParseMode};

    fn sample_plan() -> Plan {
        parse_plan(
            "## Month 1: Basics\n### Week 1: Start\n- Day 1: Read\n",
            "Learn Rust, fast!",
            ParseMode::Final,
        )
        .into_plan()
        .unwrap()
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Learn Rust, fast!"), "learn-rust-fast");
        assert_eq!(slug("日本語"), "plan");
        assert!(slug(&"a".repeat(100)).len() <= 40);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("plans"));
        let plan = sample_plan();

        let id = store.save(&plan).await.unwrap();
        assert!(id.0.ends_with("learn-rust-fast"));
        assert!(store.path_for(&id).exists());
        assert_eq!(store.load(&id).await.unwrap(), plan);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let plan = sample_plan();

        let first = store.save(&plan).await.unwrap();
        let second = store.save(&plan).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_save_then_reports_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        let (id, message) = save_then(&store, &sample_plan(), |id, plan| {
            format!("{} ({} tasks)", id, plan.total_tasks())
        })
        .await
        .unwrap();
        assert_eq!(message, format!("{} (1 tasks)", id));
    }
}
