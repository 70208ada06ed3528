//! Incremental parser for generated plan markdown
//!
//! The parser is line-oriented and stateless between calls: every call
//! re-reads the whole accumulated text. Recognized lines are month headers,
//! week headers and bullet tasks; everything else is ignored.
//!
//! ```text
//! ## Month 1: Foundations
//! ### Week 1: Basics
//! - Day 1: Tune the guitar
//! - Learn the E chord
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::dedup::{DedupFilter, DEFAULT_DEDUP_THRESHOLD};
use super::model::{DailyTask, MonthlyMilestone, Plan, WeeklyObjective};
use super::normalize::strip_decoration;

static MONTH_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#+\s*(?i:month)\s*(\d+):?\s*(.*)$").expect("month header pattern")
});
static WEEK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#+\s*(?i:week)\s*(\d+):?\s*(.*)$").expect("week header pattern")
});
static TASK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-*]\s*(?:(?i:day)\s*(\d+):?)?\s*(.*)$").expect("task line pattern")
});

/// How the input text should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Growing, possibly truncated text; never fails
    Streaming,
    /// Complete generator output; fails when nothing is recognized
    Final,
}

impl ParseMode {
    /// Whether this is the streaming mode
    pub fn is_streaming(&self) -> bool {
        matches!(self, ParseMode::Streaming)
    }
}

/// Outcome of a parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// Streaming snapshot; structure may be incomplete or empty
    Partial(Plan),
    /// Final parse with at least one month
    Complete(Plan),
    /// Final parse found no month or week headers
    Failed,
}

impl ParseResult {
    /// Borrow the parsed plan, if any
    pub fn plan(&self) -> Option<&Plan> {
        match self {
            ParseResult::Partial(plan) | ParseResult::Complete(plan) => Some(plan),
            ParseResult::Failed => None,
        }
    }

    /// Take the parsed plan, if any
    pub fn into_plan(self) -> Option<Plan> {
        match self {
            ParseResult::Partial(plan) | ParseResult::Complete(plan) => Some(plan),
            ParseResult::Failed => None,
        }
    }

    /// Number of accepted tasks (zero when failed)
    pub fn task_count(&self) -> usize {
        self.plan().map(Plan::total_tasks).unwrap_or(0)
    }

    /// Check if the parse failed
    pub fn is_failed(&self) -> bool {
        matches!(self, ParseResult::Failed)
    }
}

/// Counters collected while parsing, used for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Month and week headers recognized
    pub headers: usize,
    /// Tasks dropped as near-duplicates
    pub duplicates_skipped: usize,
    /// Non-blank lines that matched nothing or had nowhere to go
    pub ignored_lines: usize,
    /// Months fabricated for week headers without a month
    pub synthesized_months: usize,
}

/// Parser configuration
#[derive(Debug, Clone, Copy)]
pub struct PlanParser {
    dedup_threshold: f64,
}

impl Default for PlanParser {
    fn default() -> Self {
        Self {
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
        }
    }
}

impl PlanParser {
    /// Create a parser with the default dedup threshold
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the similarity threshold for duplicate suppression
    pub fn with_dedup_threshold(mut self, threshold: f64) -> Self {
        self.dedup_threshold = threshold;
        self
    }

    /// Parse accumulated generator text into a plan
    ///
    /// `expected_duration` is only used for diagnostics; the plan is never
    /// trimmed or padded to match it.
    pub fn parse(
        &self,
        text: &str,
        goal: &str,
        expected_duration: Option<u32>,
        mode: ParseMode,
    ) -> ParseResult {
        self.parse_with_stats(text, goal, expected_duration, mode).0
    }

    /// Parse and also return the diagnostic counters
    pub fn parse_with_stats(
        &self,
        text: &str,
        goal: &str,
        expected_duration: Option<u32>,
        mode: ParseMode,
    ) -> (ParseResult, ParseStats) {
        let mut state = ParseState::new(goal, self.dedup_threshold);

        for line in text.lines() {
            let line = line.trim();
            if !line.is_empty() {
                state.feed(line);
            }
        }

        let ParseState { plan, stats, .. } = state;
        debug!(
            mode = ?mode,
            months = plan.months.len(),
            weeks = plan.total_weeks(),
            tasks = plan.total_tasks(),
            expected = ?expected_duration,
            headers = stats.headers,
            duplicates_skipped = stats.duplicates_skipped,
            ignored_lines = stats.ignored_lines,
            synthesized_months = stats.synthesized_months,
            "Parsed plan text"
        );

        let result = match mode {
            ParseMode::Streaming => ParseResult::Partial(plan),
            ParseMode::Final if plan.months.is_empty() => ParseResult::Failed,
            ParseMode::Final => ParseResult::Complete(plan),
        };
        (result, stats)
    }
}

/// Parse with default settings
pub fn parse_plan(text: &str, goal: &str, mode: ParseMode) -> ParseResult {
    PlanParser::default().parse(text, goal, None, mode)
}

/// Cursor state for a single parse
struct ParseState {
    plan: Plan,
    current_month: Option<usize>,
    current_month_synthesized: bool,
    current_week: Option<usize>,
    /// Synthesized month ordinal -> position in `plan.months`
    synthesized: HashMap<u32, usize>,
    dedup: DedupFilter,
    stats: ParseStats,
}

impl ParseState {
    fn new(goal: &str, dedup_threshold: f64) -> Self {
        Self {
            plan: Plan::new(goal),
            current_month: None,
            current_month_synthesized: false,
            current_week: None,
            synthesized: HashMap::new(),
            dedup: DedupFilter::new(dedup_threshold),
            stats: ParseStats::default(),
        }
    }

    fn feed(&mut self, line: &str) {
        if let Some((index, title)) = header(&MONTH_HEADER, line) {
            self.open_month(index, title);
        } else if let Some((index, title)) = header(&WEEK_HEADER, line) {
            self.open_week(index, title);
        } else if is_emphasis_or_rule(line) {
            self.stats.ignored_lines += 1;
        } else if let Some(caps) = TASK_LINE.captures(line) {
            let day = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            let description = strip_decoration(caps.get(2).map_or("", |m| m.as_str()));
            self.add_task(day, description);
        } else {
            self.stats.ignored_lines += 1;
        }
    }

    fn open_month(&mut self, index: u32, title: String) {
        self.stats.headers += 1;
        self.plan.months.push(MonthlyMilestone::new(index, title));
        self.current_month = Some(self.plan.months.len() - 1);
        self.current_month_synthesized = false;
        self.current_week = None;
    }

    fn open_week(&mut self, index: u32, title: String) {
        self.stats.headers += 1;
        let month = match self.current_month {
            Some(month) if !self.current_month_synthesized => month,
            _ => self.synthesized_month(index.div_ceil(4)),
        };

        let weeks = &mut self.plan.months[month].weeks;
        weeks.push(WeeklyObjective::new(index, title));
        self.current_week = Some(weeks.len() - 1);
    }

    fn synthesized_month(&mut self, ordinal: u32) -> usize {
        let position = match self.synthesized.get(&ordinal) {
            Some(&position) => position,
            None => {
                self.plan.months.push(MonthlyMilestone::synthesized(ordinal));
                let position = self.plan.months.len() - 1;
                self.synthesized.insert(ordinal, position);
                self.stats.synthesized_months += 1;
                position
            }
        };
        self.current_month = Some(position);
        self.current_month_synthesized = true;
        position
    }

    fn add_task(&mut self, day: Option<u32>, description: String) {
        let (Some(month), Some(week)) = (self.current_month, self.current_week) else {
            self.stats.ignored_lines += 1;
            return;
        };
        if description.is_empty() {
            self.stats.ignored_lines += 1;
            return;
        }
        if !self.dedup.check_and_record(&description) {
            self.stats.duplicates_skipped += 1;
            return;
        }

        let week = &mut self.plan.months[month].weeks[week];
        let day = day.unwrap_or_else(|| week.next_day());
        week.tasks.push(DailyTask::new(day, description));
    }
}

/// Bold lead-ins (`**Focus:**`) and thematic breaks (`---`, `***`) start
/// with a bullet character but are not tasks
fn is_emphasis_or_rule(line: &str) -> bool {
    if line.starts_with("**") && !line.starts_with("** ") {
        return true;
    }
    line.len() >= 3
        && line
            .chars()
            .all(|c| matches!(c, '-' | '*' | '_') || c.is_whitespace())
}

/// Match a month or week header, returning its ordinal and cleaned title
fn header(pattern: &Regex, line: &str) -> Option<(u32, String)> {
    let caps = pattern.captures(line)?;
    let index = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let title = caps.get(2).map_or("", |m| m.as_str());
    let title = title.trim_start_matches(|c: char| matches!(c, '-' | '–' | '—' | ':') || c.is_whitespace());
    Some((index, strip_decoration(title)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PLAN: &str = r#"# Goal: Learn X
## Month 1: Foo
### Week 1: Bar
- Day 1: Task A
- Day 2: Task B
"#;

    #[test]
    fn test_end_to_end_sample() {
        let result = parse_plan(SAMPLE_PLAN, "Learn X", ParseMode::Final);
        let ParseResult::Complete(plan) = result else {
            panic!("Expected Complete, got {:?}", result);
        };
        assert_eq!(plan.goal, "Learn X");
        assert_eq!(plan.months[0].title, "Foo");
        assert_eq!(plan.months[0].weeks[0].title, "Bar");
        let tasks = &plan.months[0].weeks[0].tasks;
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| !t.completed));
        assert_eq!(tasks[0].description, "Task A");
        assert_eq!(tasks[1].day, 2);
    }

    #[test]
    fn test_final_without_headers_fails() {
        let text = "Here is your plan!\n- Day 1: Orphan task\nGood luck.";
        assert_eq!(parse_plan(text, "G", ParseMode::Final), ParseResult::Failed);
    }

    #[test]
    fn test_streaming_without_headers_is_empty_partial() {
        let result = parse_plan("Here is your pl", "G", ParseMode::Streaming);
        match result {
            ParseResult::Partial(plan) => assert!(plan.is_empty()),
            other => panic!("Expected Partial, got {:?}", other),
        }
    }

    #[test]
    fn test_streaming_truncated_task_line() {
        let text = "## Month 1: Foo\n### Week 1: Bar\n- Day 1: Task A\n- Day 2: Prac";
        let result = parse_plan(text, "G", ParseMode::Streaming);
        let ParseResult::Partial(plan) = result else {
            panic!("Expected Partial");
        };
        let tasks = &plan.months[0].weeks[0].tasks;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].description, "Prac");
    }

    #[test]
    fn test_streaming_truncated_day_marker_is_skipped() {
        let text = "### Week 1: Bar\n- Day 1: Task A\n- Day 2:";
        let plan = parse_plan(text, "G", ParseMode::Streaming).into_plan().unwrap();
        assert_eq!(plan.total_tasks(), 1);
    }

    #[test]
    fn test_week_only_synthesizes_months() {
        let text = "### Week 1: A\n- a1\n### Week 2: B\n- b1\n### Week 5: C\n- c1\n### Week 8: D\n- d1\n### Week 9: E\n- e1";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();

        let months: Vec<(u32, Vec<u32>)> = plan
            .months
            .iter()
            .map(|m| (m.index, m.weeks.iter().map(|w| w.index).collect()))
            .collect();
        assert_eq!(
            months,
            vec![(1, vec![1, 2]), (2, vec![5, 8]), (3, vec![9])]
        );
        assert_eq!(plan.months[0].title, "Month 1");
    }

    #[test]
    fn test_seven_day_week_only_plan() {
        let mut text = String::from("### Week 1: Kickoff\n");
        for day in 1..=7 {
            text.push_str(&format!("- Day {}: Distinct step number {}\n", day, day));
        }
        let plan = parse_plan(&text, "G", ParseMode::Final).into_plan().unwrap();
        assert_eq!(plan.months.len(), 1);
        assert_eq!(plan.months[0].index, 1);
        assert_eq!(plan.total_tasks(), 7);
    }

    #[test]
    fn test_weeks_after_declared_month_stay_in_it() {
        let text = "## Month 1: Foo\n### Week 5: Late week\n- task";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();
        assert_eq!(plan.months.len(), 1);
        assert_eq!(plan.months[0].weeks[0].index, 5);
    }

    #[test]
    fn test_month_header_resets_week_cursor() {
        let text = "## Month 1: Foo\n### Week 1: Bar\n- a\n## Month 2: Baz\n- orphan\n### Week 5: Qux\n- b";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();
        assert_eq!(plan.months[0].weeks[0].tasks.len(), 1);
        assert_eq!(plan.months[1].weeks[0].tasks.len(), 1);
        assert_eq!(plan.months[1].weeks[0].tasks[0].description, "b");
    }

    #[test]
    fn test_auto_numbered_days() {
        let text = "### Week 1: Bar\n- Stretch\n* Run two miles\n- Log the run";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();
        let days: Vec<u32> = plan.tasks().map(|t| t.day).collect();
        assert_eq!(days, vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicates_skipped_plan_wide() {
        let text = "### Week 1: A\n- Practice guitar chords\n### Week 2: B\n- practice Guitar Chords!!\n- Write a song";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();
        assert_eq!(plan.total_tasks(), 2);
        assert_eq!(plan.months[0].weeks[1].tasks[0].description, "Write a song");
        assert_eq!(plan.months[0].weeks[1].tasks[0].day, 1);
    }

    #[test]
    fn test_decoration_stripped_from_tasks() {
        let text = "## Month 1: **Foo**\n### Week 1: Bar\n- Day 1: **Read** the [guide](http://x.y)";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();
        assert_eq!(plan.months[0].title, "Foo");
        assert_eq!(plan.months[0].weeks[0].tasks[0].description, "Read the guide");
    }

    #[test]
    fn test_bold_line_is_not_a_task() {
        let text = "### Week 1: Bar\n**Focus:** consistency\n- Day 1: Task A";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();
        assert_eq!(plan.total_tasks(), 1);
    }

    #[test]
    fn test_bullets_without_space() {
        let text = "### Week 1: Bar\n-Day 1: Task A\n*Task B";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();
        let tasks = &plan.months[0].weeks[0].tasks;
        assert_eq!(tasks.len(), 2);
        assert_eq!((tasks[0].day, tasks[0].description.as_str()), (1, "Task A"));
        assert_eq!((tasks[1].day, tasks[1].description.as_str()), (2, "Task B"));
    }

    #[test]
    fn test_rules_are_not_tasks() {
        let text = "### Week 1: Bar\n---\n- Day 1: Task A\n* * *\n***";
        let (result, stats) =
            PlanParser::new().parse_with_stats(text, "G", None, ParseMode::Final);
        assert_eq!(result.task_count(), 1);
        assert_eq!(stats.ignored_lines, 3);
    }

    #[test]
    fn test_week_zero_maps_to_month_zero() {
        let text = "### Week 0: Prep\n- Gather tools\n### Week 1: Start\n- Begin";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();
        let shape: Vec<(u32, Vec<u32>)> = plan
            .months
            .iter()
            .map(|m| (m.index, m.weeks.iter().map(|w| w.index).collect()))
            .collect();
        assert_eq!(shape, vec![(0, vec![0]), (1, vec![1])]);
        assert_eq!(plan.months[0].title, "Month 0");
    }

    #[test]
    fn test_parse_stats() {
        let text = "Intro line\n### Week 1: A\n- Practice guitar chords\n- practice Guitar Chords!!";
        let (result, stats) =
            PlanParser::new().parse_with_stats(text, "G", Some(7), ParseMode::Final);
        assert_eq!(result.task_count(), 1);
        assert_eq!(stats.headers, 1);
        assert_eq!(stats.duplicates_skipped, 1);
        assert_eq!(stats.ignored_lines, 1);
        assert_eq!(stats.synthesized_months, 1);
    }

    #[test]
    fn test_continuation_lines_are_dropped() {
        let text = "### Week 1: Bar\n- Day 1: Task A\n  with more detail here\n- Day 2: Task B";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();
        assert_eq!(plan.months[0].weeks[0].tasks[0].description, "Task A");
        assert_eq!(plan.total_tasks(), 2);
    }

    #[test]
    fn test_header_variants() {
        let text = "#Month 2 - Scale up\n####  week 3 Ship it\n- day 4 Deploy";
        let plan = parse_plan(text, "G", ParseMode::Final).into_plan().unwrap();
        assert_eq!(plan.months[0].index, 2);
        assert_eq!(plan.months[0].title, "Scale up");
        assert_eq!(plan.months[0].weeks[0].title, "Ship it");
        assert_eq!(plan.months[0].weeks[0].tasks[0].day, 4);
        assert_eq!(plan.months[0].weeks[0].tasks[0].description, "Deploy");
    }

    #[test]
    fn test_streaming_previews_grow_monotonically() {
        let text = "## Month 1: Foo\n### Week 1: Bar\n- Day 1: Task A\n- Day 2: Task B\n### Week 2: Baz\n- Day 3: Task C\n";
        let mut last = 0;
        for end in 0..=text.len() {
            let count = parse_plan(&text[..end], "G", ParseMode::Streaming)
                .plan()
                .map(|p| p.total_weeks())
                .unwrap_or(0);
            assert!(count >= last);
            last = count;
        }
        assert_eq!(last, 2);
    }
}
