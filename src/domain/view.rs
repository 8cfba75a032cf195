//! Derived view over the task collection: status filter, text search, sort.
//!
//! Everything here is a pure function of the task slice and a [`ViewQuery`];
//! the store is never touched.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::task::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }

    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Pending,
            StatusFilter::Pending => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOption {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "dueDate")]
    DueDate,
    #[serde(rename = "priority")]
    Priority,
}

impl SortOption {
    pub fn next(self) -> Self {
        match self {
            SortOption::None => SortOption::DueDate,
            SortOption::DueDate => SortOption::Priority,
            SortOption::Priority => SortOption::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::None => "none",
            SortOption::DueDate => "dueDate",
            SortOption::Priority => "priority",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseViewError(String);

impl FromStr for StatusFilter {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(ParseViewError(format!("invalid filter: {other}"))),
        }
    }
}

impl FromStr for SortOption {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(SortOption::None),
            "dueDate" => Ok(SortOption::DueDate),
            "priority" => Ok(SortOption::Priority),
            other => Err(ParseViewError(format!("invalid sort: {other}"))),
        }
    }
}

/// The three view parameters a renderer controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub filter: StatusFilter,
    pub query: String,
    pub sort: SortOption,
}

impl ViewQuery {
    pub fn new(filter: StatusFilter, query: impl Into<String>, sort: SortOption) -> Self {
        Self { filter, query: query.into(), sort }
    }
}

/// Aggregate counts, always taken over the whole collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

impl TaskCounts {
    pub fn of(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self { total, pending: total - completed, completed }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub items: Vec<Task>,
    pub counts: TaskCounts,
}

/// Case-insensitive substring matcher over title and description.
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Returns `None` for blank queries, which match everything.
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self { needle: trimmed.to_lowercase() })
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.matches_field(&task.title) || task.description().is_some_and(|d| self.matches_field(d))
    }

    fn matches_field(&self, value: &str) -> bool { value.to_lowercase().contains(&self.needle) }
}

fn compare_due_dates(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filter, search, then sort. Sorting is stable so equal keys keep insertion order.
pub fn project(tasks: &[Task], view: &ViewQuery) -> Projection {
    let matcher = TextMatcher::new(&view.query);
    let mut items: Vec<Task> = tasks
        .iter()
        .filter(|t| view.filter.matches(t))
        .filter(|t| matcher.as_ref().is_none_or(|m| m.matches(t)))
        .cloned()
        .collect();

    match view.sort {
        SortOption::None => {}
        SortOption::DueDate => items.sort_by(compare_due_dates),
        SortOption::Priority => items.sort_by_key(|t| t.priority.rank()),
    }

    Projection { items, counts: TaskCounts::of(tasks) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::{Priority, TaskId};
    use chrono::NaiveDate;

    fn task(id: i64, title: &str) -> Task {
        Task { id: TaskId(id), title: title.into(), description: String::new(), due_date: None, priority: Priority::Normal, completed: false }
    }

    fn ids(p: &Projection) -> Vec<i64> { p.items.iter().map(|t| t.id.0).collect() }

    fn date(d: u32) -> Option<NaiveDate> { NaiveDate::from_ymd_opt(2025, 1, d) }

    #[test]
    fn default_view_is_identity() {
        let tasks = vec![task(3, "c"), task(1, "a"), Task { completed: true, ..task(2, "b") }];
        let p = project(&tasks, &ViewQuery::default());
        assert_eq!(p.items, tasks);
    }

    #[test]
    fn pending_filter_scenario() {
        let tasks = vec![
            Task { priority: Priority::High, ..task(1, "A") },
            Task { priority: Priority::Low, completed: true, ..task(2, "B") },
        ];
        let p = project(&tasks, &ViewQuery::new(StatusFilter::Pending, "", SortOption::None));
        assert_eq!(ids(&p), vec![1]);
        assert_eq!(p.counts, TaskCounts { total: 2, pending: 1, completed: 1 });

        let p = project(&tasks, &ViewQuery::new(StatusFilter::Completed, "", SortOption::None));
        assert_eq!(ids(&p), vec![2]);
    }

    #[test]
    fn counts_ignore_filter_query_and_sort() {
        let tasks = vec![task(1, "alpha"), Task { completed: true, ..task(2, "beta") }, task(3, "gamma")];
        let expected = TaskCounts { total: 3, pending: 2, completed: 1 };
        for view in [
            ViewQuery::default(),
            ViewQuery::new(StatusFilter::Completed, "zzz", SortOption::Priority),
            ViewQuery::new(StatusFilter::Pending, "alp", SortOption::DueDate),
        ] {
            let p = project(&tasks, &view);
            assert_eq!(p.counts, expected);
            assert_eq!(p.counts.pending + p.counts.completed, p.counts.total);
        }
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let tasks = vec![
            task(1, "Buy MILK"),
            Task { description: "call the Plumber".into(), ..task(2, "House") },
            task(3, "Other"),
        ];
        let p = project(&tasks, &ViewQuery::new(StatusFilter::All, "  milk ", SortOption::None));
        assert_eq!(ids(&p), vec![1]);
        let p = project(&tasks, &ViewQuery::new(StatusFilter::All, "PLUMB", SortOption::None));
        assert_eq!(ids(&p), vec![2]);
    }

    #[test]
    fn blank_query_matches_everything() {
        let tasks = vec![task(1, "a"), task(2, "b")];
        for q in ["", "   ", "\t"] {
            let p = project(&tasks, &ViewQuery::new(StatusFilter::All, q, SortOption::None));
            assert_eq!(ids(&p), vec![1, 2]);
        }
    }

    #[test]
    fn empty_description_never_matches() {
        assert!(TextMatcher::new("").is_none());
        let m = TextMatcher::new("x").unwrap();
        assert!(!m.matches(&task(1, "abc")));
    }

    #[test]
    fn due_date_sort_puts_undated_last_and_is_stable() {
        let tasks = vec![
            task(1, "no date 1"),
            Task { due_date: date(20), ..task(2, "late") },
            task(3, "no date 2"),
            Task { due_date: date(5), ..task(4, "early") },
            Task { due_date: date(20), ..task(5, "late too") },
        ];
        let p = project(&tasks, &ViewQuery::new(StatusFilter::All, "", SortOption::DueDate));
        assert_eq!(ids(&p), vec![4, 2, 5, 1, 3]);
    }

    #[test]
    fn undated_ties_keep_relative_order() {
        let tasks = vec![task(9, "first"), task(4, "second")];
        let p = project(&tasks, &ViewQuery::new(StatusFilter::All, "", SortOption::DueDate));
        assert_eq!(ids(&p), vec![9, 4]);
    }

    #[test]
    fn priority_sort_ranks_unknown_last() {
        let tasks = vec![
            Task { priority: Priority::Other("someday".into()), ..task(1, "a") },
            Task { priority: Priority::Low, ..task(2, "b") },
            Task { priority: Priority::High, ..task(3, "c") },
            Task { priority: Priority::Normal, ..task(4, "d") },
            Task { priority: Priority::High, ..task(5, "e") },
        ];
        let p = project(&tasks, &ViewQuery::new(StatusFilter::All, "", SortOption::Priority));
        assert_eq!(ids(&p), vec![3, 5, 4, 2, 1]);
        // source slice untouched
        assert_eq!(tasks[0].id, TaskId(1));
    }

    #[test]
    fn view_parameters_parse_from_strings() {
        assert_eq!("Pending".parse::<StatusFilter>().unwrap(), StatusFilter::Pending);
        assert_eq!("dueDate".parse::<SortOption>().unwrap(), SortOption::DueDate);
        let err = "newest".parse::<SortOption>().unwrap_err();
        assert_eq!(err.to_string(), "invalid sort: newest");
        assert!("done".parse::<StatusFilter>().is_err());
    }
}
