//! Statistics derived from already-fetched report data.

use time::OffsetDateTime;
use time::macros::format_description;

use crate::models::{
    Category, CommonIssue, RunStatus, Severity, TestRunWithReport, UXAgentInsight, UXAgentRun,
};

/// Mean of the present scores; 0 when no run has a score.
pub fn average_score<I>(scores: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = scores
        .into_iter()
        .flatten()
        .fold((0.0_f64, 0usize), |(sum, count), s| (sum + s, count + 1));
    if count > 0 { sum / count as f64 } else { 0.0 }
}

pub struct SeverityCount {
    pub severity: Severity,
    pub count: usize,
}

pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// Insight counts for the summary cards.
///
/// Both count lists partition `total`: unknown severities are counted as low
/// and unknown categories under `Other`.
pub struct InsightSummary {
    pub total: usize,
    pub by_severity: Vec<SeverityCount>,
    pub by_category: Vec<CategoryCount>,
}

impl InsightSummary {
    pub fn from_insights<'a, I>(insights: I) -> Self
    where
        I: IntoIterator<Item = &'a UXAgentInsight>,
    {
        let mut severity_counts = [0usize; 4];
        let mut category_counts = [0usize; Category::ORDERED.len()];
        let mut total = 0;

        for insight in insights {
            total += 1;
            severity_counts[insight.severity.rank() as usize] += 1;
            if let Some(pos) = Category::ORDERED.iter().position(|c| *c == insight.category) {
                category_counts[pos] += 1;
            }
        }

        Self {
            total,
            by_severity: Severity::ORDERED
                .iter()
                .zip(severity_counts)
                .map(|(&severity, count)| SeverityCount { severity, count })
                .collect(),
            by_category: Category::ORDERED
                .iter()
                .zip(category_counts)
                .filter(|(_, count)| *count > 0)
                .map(|(&category, count)| CategoryCount { category, count })
                .collect(),
        }
    }
}

/// Stable sort, most severe first.
pub fn sort_by_severity<T>(items: &mut [T], severity: impl Fn(&T) -> Severity) {
    items.sort_by_key(|item| severity(item).rank());
}

pub struct CategoryGroup<T> {
    pub category: Category,
    pub items: Vec<T>,
}

/// Groups in fixed category order; empty categories are left out.
pub fn group_by_category<T>(
    items: Vec<T>,
    category: impl Fn(&T) -> Category,
) -> Vec<CategoryGroup<T>> {
    let mut groups: Vec<CategoryGroup<T>> = Category::ORDERED
        .iter()
        .map(|&c| CategoryGroup {
            category: c,
            items: Vec::new(),
        })
        .collect();

    for item in items {
        let c = category(&item);
        if let Some(group) = groups.iter_mut().find(|g| g.category == c) {
            group.items.push(item);
        }
    }

    groups.retain(|g| !g.items.is_empty());
    groups
}

pub fn sorted_common_issues(issues: Option<&[CommonIssue]>) -> Vec<CommonIssue> {
    let mut issues = issues.map(|i| i.to_vec()).unwrap_or_default();
    sort_by_severity(&mut issues, |i| i.severity);
    issues
}

/// Name shown for an agent run: the persona name, a name lifted from the
/// free-text persona description, or a positional fallback.
pub fn agent_display_name(run: &UXAgentRun, index: usize) -> String {
    if let Some(name) = run.persona_data.get("name").and_then(|n| n.as_str())
        && !name.trim().is_empty()
    {
        return name.to_string();
    }

    if let Some(persona) = run.basic_info.get("persona").and_then(|p| p.as_str())
        && let Some(name) = name_from_description(persona)
    {
        return name;
    }

    format!("Agent {}", index + 1)
}

fn name_from_description(text: &str) -> Option<String> {
    let mut rest = text.trim_start();
    if rest.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("name")) {
        let after = &rest[4..];
        let stripped = after.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
        if stripped.len() < after.len() {
            rest = stripped;
        }
    }

    let words: Vec<&str> = rest
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| w.chars().count() >= 2)
        .collect();
    let first = words.first()?;

    // a second word only counts if it directly follows the first after whitespace
    let start = rest.find(first)?;
    let tail = &rest[start + first.len()..];
    let second = tail
        .strip_prefix(|c: char| c.is_whitespace())
        .map(|t| t.trim_start())
        .and_then(|t| {
            let word: String = t.chars().take_while(|c| c.is_alphabetic()).collect();
            (word.chars().count() >= 2).then_some(word)
        });

    Some(match second {
        Some(second) => format!("{} {}", first, second),
        None => first.to_string(),
    })
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
}

/// "Just now", "5 minutes ago", ... falling back to a date after a week.
pub fn format_relative(ts: OffsetDateTime, now: OffsetDateTime) -> String {
    let diff = now - ts;
    let mins = diff.whole_minutes();
    let hours = diff.whole_hours();
    let days = diff.whole_days();

    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        plural(mins, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        ts.format(format_description!(
            "[month repr:short] [day padding:none], [year]"
        ))
        .unwrap_or_else(|_| ts.date().to_string())
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub completed: usize,
    pub failed: usize,
    pub running: usize,
    pub pending: usize,
}

impl RunCounts {
    pub fn from_test_runs(runs: &[TestRunWithReport]) -> Self {
        Self::from_statuses(runs.iter().map(|r| &r.test_run.status))
    }

    pub fn from_agent_runs(runs: &[UXAgentRun]) -> Self {
        Self::from_statuses(runs.iter().map(|r| &r.status))
    }

    fn from_statuses<'a>(statuses: impl Iterator<Item = &'a RunStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                RunStatus::Completed => counts.completed += 1,
                RunStatus::Failed | RunStatus::Terminated => counts.failed += 1,
                RunStatus::Running => counts.running += 1,
                RunStatus::Pending | RunStatus::Unknown => counts.pending += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.completed + self.failed + self.running + self.pending
    }

    pub fn finished_percent(&self) -> f64 {
        let total = self.total();
        if total > 0 {
            ((self.completed + self.failed) as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}
