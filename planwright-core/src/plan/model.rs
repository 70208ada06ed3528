//! Plan data model

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A hierarchical plan: months, then weeks, then daily tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// The goal this plan works towards
    pub goal: String,
    /// Month-level milestones in declaration order
    pub months: Vec<MonthlyMilestone>,
}

/// A month-level grouping of weekly objectives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyMilestone {
    /// Month ordinal as declared, or synthesized from a week number
    pub index: u32,
    /// Milestone title
    pub title: String,
    /// Weekly objectives in this month
    pub weeks: Vec<WeeklyObjective>,
}

/// A week-level grouping of daily tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyObjective {
    /// Week ordinal as declared
    pub index: u32,
    /// Objective title
    pub title: String,
    /// Tasks for this week
    pub tasks: Vec<DailyTask>,
}

/// A single completable task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTask {
    /// Day number, explicit or auto-assigned within the week
    pub day: u32,
    /// Task description with markdown decoration removed
    pub description: String,
    /// Completion flag, always false when parsed
    pub completed: bool,
}

impl Plan {
    /// Create an empty plan for a goal
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            months: Vec::new(),
        }
    }

    /// Total number of tasks across all months and weeks
    pub fn total_tasks(&self) -> usize {
        self.months
            .iter()
            .flat_map(|m| &m.weeks)
            .map(|w| w.tasks.len())
            .sum()
    }

    /// Total number of weeks across all months
    pub fn total_weeks(&self) -> usize {
        self.months.iter().map(|m| m.weeks.len()).sum()
    }

    /// Iterate over every task in plan order
    pub fn tasks(&self) -> impl Iterator<Item = &DailyTask> {
        self.months
            .iter()
            .flat_map(|m| &m.weeks)
            .flat_map(|w| &w.tasks)
    }

    /// Whether no structure has been recognized yet
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Check the invariant that holds for every completed plan
    pub fn ensure_complete(&self) -> Result<()> {
        if self.months.is_empty() {
            return Err(Error::ParseFailure);
        }
        Ok(())
    }
}

impl MonthlyMilestone {
    /// Create a month with no weeks
    pub fn new(index: u32, title: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            weeks: Vec::new(),
        }
    }

    /// Generic milestone used when weeks arrive without a month header
    pub fn synthesized(index: u32) -> Self {
        Self::new(index, format!("Month {}", index))
    }
}

impl WeeklyObjective {
    /// Create a week with no tasks
    pub fn new(index: u32, title: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            tasks: Vec::new(),
        }
    }

    /// Day number the next task without an explicit day should receive
    pub fn next_day(&self) -> u32 {
        self.tasks.len() as u32 + 1
    }
}

impl DailyTask {
    /// Create an incomplete task
    pub fn new(day: u32, description: impl Into<String>) -> Self {
        Self {
            day,
            description: description.into(),
            completed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Plan {
        let mut week1 = WeeklyObjective::new(1, "Basics");
        week1.tasks.push(DailyTask::new(1, "Tune the guitar"));
        week1.tasks.push(DailyTask::new(2, "Learn the E chord"));
        let mut week2 = WeeklyObjective::new(2, "Strumming");
        week2.tasks.push(DailyTask::new(1, "Downstrokes only"));

        let mut month = MonthlyMilestone::new(1, "Foundations");
        month.weeks.push(week1);
        month.weeks.push(week2);

        Plan {
            goal: "Learn guitar".to_string(),
            months: vec![month],
        }
    }

    #[test]
    fn test_totals() {
        let plan = sample_plan();
        assert_eq!(plan.total_tasks(), 3);
        assert_eq!(plan.total_weeks(), 2);
        let days: Vec<u32> = plan.tasks().map(|t| t.day).collect();
        assert_eq!(days, vec![1, 2, 1]);
    }

    #[test]
    fn test_new_task_is_incomplete() {
        assert!(!DailyTask::new(3, "Anything").completed);
    }

    #[test]
    fn test_ensure_complete() {
        assert!(sample_plan().ensure_complete().is_ok());
        assert!(matches!(
            Plan::new("Empty").ensure_complete(),
            Err(Error::ParseFailure)
        ));
    }

    #[test]
    fn test_synthesized_month_title() {
        let month = MonthlyMilestone::synthesized(2);
        assert_eq!(month.index, 2);
        assert_eq!(month.title, "Month 2");
        assert!(month.weeks.is_empty());
    }

    #[test]
    fn test_plan_json_shape() {
        let json = serde_json::to_value(sample_plan()).unwrap();
        assert_eq!(json["goal"], "Learn guitar");
        assert_eq!(json["months"][0]["weeks"][0]["tasks"][1]["day"], 2);
        assert_eq!(json["months"][0]["weeks"][0]["tasks"][1]["completed"], false);
    }
}
