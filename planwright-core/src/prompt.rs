//! Plan prompt construction
//!
//! The prompt embeds a fully expanded skeleton of the expected output (every
//! month, week and day marker) instead of asking the generator to work out
//! the plan length itself. The template uses `{{VARIABLE}}` placeholders.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::generate::{GenerationOptions, GenerationRequest};

/// Duration used when the caller does not give one
pub const DEFAULT_DURATION_DAYS: u32 = 90;

/// Longest plan that can be requested, in days
pub const MAX_DURATION_DAYS: u32 = 366;

/// Days per week in the skeleton
const DAYS_PER_WEEK: u32 = 7;

/// Weeks per month in the skeleton
const WEEKS_PER_MONTH: u32 = 4;

/// Embedded plan prompt template
const PLAN_PROMPT: &str = include_str!("prompts/plan.md");

/// Phase names and their share of the plan
const PHASES: [(&str, &str, f64); 4] = [
    ("Foundation", "fundamentals, setup and first habits", 0.25),
    ("Building", "core skills and steady practice", 0.30),
    ("Application", "real projects that apply what was learned", 0.25),
    ("Mastery", "refinement, review and independent work", 0.20),
];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z_]+)\}\}").expect("placeholder pattern"));

/// Week in the expected output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekShape {
    /// Week number, counted across the whole plan
    pub index: u32,
    /// Day markers in this week
    pub days: RangeInclusive<u32>,
}

/// Month in the expected output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthShape {
    /// Month number
    pub index: u32,
    /// Weeks in this month
    pub weeks: Vec<WeekShape>,
}

/// Expected output structure for a duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSkeleton {
    /// Whether month headers are emitted
    pub with_months: bool,
    /// Months (a single implicit month when `with_months` is false)
    pub months: Vec<MonthShape>,
}

impl PlanSkeleton {
    /// Build the skeleton for a plan duration
    ///
    /// Durations are clamped to `1..=MAX_DURATION_DAYS`.
    pub fn for_duration(duration_days: u32) -> Self {
        let duration_days = duration_days.clamp(1, MAX_DURATION_DAYS);
        match duration_days {
            7 => Self::uniform(1, 1, false),
            30 => {
                let weeks = (1..=WEEKS_PER_MONTH)
                    .map(|w| {
                        let start = (w - 1) * DAYS_PER_WEEK + 1;
                        let end = if w == WEEKS_PER_MONTH { 30 } else { w * DAYS_PER_WEEK };
                        WeekShape {
                            index: w,
                            days: start..=end,
                        }
                    })
                    .collect();
                Self {
                    with_months: true,
                    months: vec![MonthShape { index: 1, weeks }],
                }
            }
            90 => Self::uniform(3, WEEKS_PER_MONTH, true),
            other => Self::computed(other),
        }
    }

    /// Whole months of whole weeks
    fn uniform(months: u32, weeks_per_month: u32, with_months: bool) -> Self {
        let months = (1..=months)
            .map(|m| MonthShape {
                index: m,
                weeks: (1..=weeks_per_month)
                    .map(|w| {
                        let index = (m - 1) * weeks_per_month + w;
                        let start = (index - 1) * DAYS_PER_WEEK + 1;
                        WeekShape {
                            index,
                            days: start..=start + DAYS_PER_WEEK - 1,
                        }
                    })
                    .collect(),
            })
            .collect();
        Self {
            with_months,
            months,
        }
    }

    /// Weeks of seven days packed into months of four weeks
    fn computed(duration_days: u32) -> Self {
        let weeks_needed = duration_days.div_ceil(DAYS_PER_WEEK);
        let months_needed = weeks_needed.div_ceil(WEEKS_PER_MONTH);

        let months = (1..=months_needed)
            .map(|m| {
                let first = (m - 1) * WEEKS_PER_MONTH + 1;
                let last = (m * WEEKS_PER_MONTH).min(weeks_needed);
                MonthShape {
                    index: m,
                    weeks: (first..=last)
                        .map(|w| WeekShape {
                            index: w,
                            days: (w - 1) * DAYS_PER_WEEK + 1..=(w * DAYS_PER_WEEK).min(duration_days),
                        })
                        .collect(),
                }
            })
            .collect();

        Self {
            with_months: weeks_needed > 1,
            months,
        }
    }

    /// Number of day markers in the skeleton
    pub fn day_count(&self) -> usize {
        self.months
            .iter()
            .flat_map(|m| &m.weeks)
            .map(|w| w.days.clone().count())
            .sum()
    }

    /// Number of weeks in the skeleton
    pub fn week_count(&self) -> usize {
        self.months.iter().map(|m| m.weeks.len()).sum()
    }

    /// Render the skeleton as markdown with bracketed placeholders
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for month in &self.months {
            if self.with_months {
                lines.push(format!("## Month {}: [Milestone title]", month.index));
            }
            for week in &month.weeks {
                lines.push(format!("### Week {}: [Objective title]", week.index));
                for day in week.days.clone() {
                    lines.push(format!("- Day {}: [Task]", day));
                }
            }
        }
        lines.join("\n")
    }
}

/// Render the phase guidance for a duration
fn render_phases(duration_days: u32) -> String {
    let mut lines = Vec::new();
    let mut start = 1;
    let mut share_so_far = 0.0;

    for (i, (name, focus, share)) in PHASES.iter().enumerate() {
        share_so_far += share;
        let end = if i == PHASES.len() - 1 {
            duration_days
        } else {
            (duration_days as f64 * share_so_far).round() as u32
        };
        if end >= start {
            lines.push(format!(
                "{}. {} (Days {}-{}, ~{:.0}%): {}",
                lines.len() + 1,
                name,
                start,
                end,
                share * 100.0,
                focus
            ));
            start = end + 1;
        }
    }

    lines.join("\n")
}

/// Render a template string with variable substitution
///
/// Placeholders are substituted in a single pass, so variable values that
/// themselves contain `{{...}}` are left untouched. Unset placeholders
/// become "(not specified)".
fn render_template(template: &str, variables: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            variables
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| "(not specified)".to_string())
        })
        .into_owned()
}

/// Build the plan prompt for a goal
pub fn build_prompt(goal: &str, duration_days: Option<u32>) -> String {
    let duration = duration_days
        .unwrap_or(DEFAULT_DURATION_DAYS)
        .clamp(1, MAX_DURATION_DAYS);
    let skeleton = PlanSkeleton::for_duration(duration);

    let mut variables = HashMap::new();
    variables.insert("GOAL", goal.trim().to_string());
    variables.insert("DURATION", duration.to_string());
    variables.insert("TASK_COUNT", skeleton.day_count().to_string());
    variables.insert("STRUCTURE", skeleton.render());
    variables.insert("PHASES", render_phases(duration));

    render_template(PLAN_PROMPT, &variables)
}

/// Build a full generation request for a goal
pub fn build_request(
    goal: &str,
    duration_days: Option<u32>,
    options: GenerationOptions,
) -> GenerationRequest {
    GenerationRequest::new(build_prompt(goal, duration_days)).with_options(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ninety_day_skeleton() {
        let skeleton = PlanSkeleton::for_duration(90);
        assert!(skeleton.with_months);
        assert_eq!(skeleton.months.len(), 3);
        assert!(skeleton.months.iter().all(|m| m.weeks.len() == 4));
        assert_eq!(skeleton.day_count(), 84);
        assert_eq!(skeleton.months[2].weeks[3].index, 12);
        assert_eq!(skeleton.months[2].weeks[3].days, 78..=84);
    }

    #[test]
    fn test_thirty_day_skeleton() {
        let skeleton = PlanSkeleton::for_duration(30);
        assert_eq!(skeleton.months.len(), 1);
        assert_eq!(skeleton.week_count(), 4);
        assert_eq!(skeleton.day_count(), 30);
        assert_eq!(skeleton.months[0].weeks[3].days, 22..=30);
    }

    #[test]
    fn test_seven_day_skeleton_has_no_month_layer() {
        let skeleton = PlanSkeleton::for_duration(7);
        assert!(!skeleton.with_months);
        assert_eq!(skeleton.day_count(), 7);
        let rendered = skeleton.render();
        assert!(!rendered.contains("Month"));
        assert!(rendered.starts_with("### Week 1: [Objective title]"));
        assert!(rendered.ends_with("- Day 7: [Task]"));
    }

    #[test]
    fn test_computed_skeleton_last_month_short() {
        // 45 days -> 7 weeks -> 2 months (4 + 3 weeks)
        let skeleton = PlanSkeleton::for_duration(45);
        assert!(skeleton.with_months);
        assert_eq!(skeleton.months.len(), 2);
        assert_eq!(skeleton.months[0].weeks.len(), 4);
        assert_eq!(skeleton.months[1].weeks.len(), 3);
        assert_eq!(skeleton.months[1].weeks[2].days, 43..=45);
        assert_eq!(skeleton.day_count(), 45);
    }

    #[test]
    fn test_oversized_duration_is_clamped() {
        let skeleton = PlanSkeleton::for_duration(u32::MAX);
        assert_eq!(skeleton.day_count(), MAX_DURATION_DAYS as usize);

        let prompt = build_prompt("Goal", Some(2_000_000));
        assert!(prompt.contains(&format!("{}-day plan", MAX_DURATION_DAYS)));
        assert!(prompt.len() < 64 * 1024);
    }

    #[test]
    fn test_short_duration_skeleton() {
        let skeleton = PlanSkeleton::for_duration(3);
        assert!(!skeleton.with_months);
        assert_eq!(skeleton.day_count(), 3);
    }

    #[test]
    fn test_prompt_embeds_goal_and_structure() {
        let prompt = build_prompt("Learn Spanish", Some(30));
        assert!(prompt.contains("Goal: Learn Spanish"));
        assert!(prompt.contains("30-day plan"));
        assert!(prompt.contains("## Month 1: [Milestone title]"));
        assert!(prompt.contains("- Day 30: [Task]"));
        assert!(!prompt.contains("- Day 31:"));
        assert!(prompt.contains("exactly 30 tasks"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_prompt_defaults_to_ninety_days() {
        let prompt = build_prompt("Run a marathon", None);
        assert!(prompt.contains("90-day plan"));
        assert!(prompt.contains("## Month 3: [Milestone title]"));
        assert!(prompt.contains("### Week 12: [Objective title]"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_prompt("Goal", Some(14)), build_prompt("Goal", Some(14)));
    }

    #[test]
    fn test_goal_placeholders_are_not_expanded() {
        let prompt = build_prompt("Study {{STRUCTURE}} syntax", Some(7));
        assert!(prompt.contains("Goal: Study {{STRUCTURE}} syntax"));
    }

    #[test]
    fn test_phase_split() {
        let phases = render_phases(100);
        assert!(phases.contains("Foundation (Days 1-25"));
        assert!(phases.contains("Building (Days 26-55"));
        assert!(phases.contains("Application (Days 56-80"));
        assert!(phases.contains("Mastery (Days 81-100"));
    }

    #[test]
    fn test_phase_split_tiny_duration() {
        let phases = render_phases(1);
        assert_eq!(phases.lines().count(), 1);
        assert!(phases.contains("Days 1-1"));
    }

    #[test]
    fn test_unset_placeholder() {
        let rendered = render_template("Hello {{NAME}}", &HashMap::new());
        assert_eq!(rendered, "Hello (not specified)");
    }

    #[test]
    fn test_build_request_carries_options() {
        let options = GenerationOptions {
            temperature: 0.2,
            ..GenerationOptions::default()
        };
        let request = build_request("Goal", Some(7), options);
        assert_eq!(request.options.temperature, 0.2);
        assert!(request.prompt.contains("7-day plan"));
    }
}
