//! Sorting and filtering for task listings

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::date::Date;
use super::error::TodoError;
use super::priority::Priority;
use super::todo::ToDo;

/// Key for ordering a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most important first
    Priority,
    /// Earliest first, tasks without a deadline last
    Deadline,
    /// Case-insensitive lexicographic
    Category,
    /// Case-insensitive lexicographic
    Title,
    /// Oldest first
    CreatedAt,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Priority => "priority",
            SortKey::Deadline => "deadline",
            SortKey::Category => "category",
            SortKey::Title => "title",
            SortKey::CreatedAt => "created_at",
        }
    }

    pub fn compare(&self, a: &ToDo, b: &ToDo) -> Ordering {
        match self {
            SortKey::Priority => b.priority.cmp(&a.priority),
            SortKey::Deadline => match (a.deadline, b.deadline) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::Category => a.category.to_lowercase().cmp(&b.category.to_lowercase()),
            SortKey::Title => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
            SortKey::CreatedAt => a.created_at().cmp(&b.created_at()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" => Ok(SortKey::Priority),
            "deadline" => Ok(SortKey::Deadline),
            "category" => Ok(SortKey::Category),
            "title" => Ok(SortKey::Title),
            "created_at" | "created" => Ok(SortKey::CreatedAt),
            other => Err(TodoError::validation(format!(
                "unknown sort key '{}', expected priority, deadline, category, title or created_at",
                other
            ))),
        }
    }
}

/// Priority condition of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityFilter {
    Exactly(Priority),
    /// This level or more important
    AtLeast(Priority),
}

impl PriorityFilter {
    pub fn matches(&self, priority: Priority) -> bool {
        match self {
            PriorityFilter::Exactly(p) => priority == *p,
            PriorityFilter::AtLeast(p) => priority >= *p,
        }
    }
}

/// Conjunctive filter over tasks; an empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoFilter {
    pub category: Option<String>,
    pub priority: Option<PriorityFilter>,
    pub done: Option<bool>,
    /// Expected overdue state and the reference date it is judged against
    pub overdue: Option<(bool, Date)>,
    pub tag: Option<String>,
}

impl TodoFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(PriorityFilter::Exactly(priority));
        self
    }

    pub fn priority_at_least(mut self, priority: Priority) -> Self {
        self.priority = Some(PriorityFilter::AtLeast(priority));
        self
    }

    pub fn done(mut self, done: bool) -> Self {
        self.done = Some(done);
        self
    }

    pub fn overdue(mut self, overdue: bool, as_of: Date) -> Self {
        self.overdue = Some((overdue, as_of));
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn matches(&self, todo: &ToDo) -> bool {
        self.category.as_ref().map_or(true, |c| &todo.category == c)
            && self.priority.map_or(true, |p| p.matches(todo.priority))
            && self.done.map_or(true, |d| todo.is_done() == d)
            && self
                .overdue
                .map_or(true, |(overdue, as_of)| todo.is_overdue(&as_of) == overdue)
            && self.tag.as_ref().map_or(true, |t| todo.tags.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(title: &str, priority: Priority) -> ToDo {
        ToDo::new(title).unwrap().with_priority(priority)
    }

    #[test]
    fn priority_sorts_most_important_first() {
        let a = todo("a", Priority::Critical);
        let b = todo("b", Priority::Moderate);
        assert_eq!(SortKey::Priority.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn deadline_none_sorts_last() {
        let dated = todo("a", Priority::Low).with_deadline(Date::new(2030, 1, 1).unwrap());
        let undated = todo("b", Priority::Low);
        assert_eq!(SortKey::Deadline.compare(&dated, &undated), Ordering::Less);
        assert_eq!(SortKey::Deadline.compare(&undated, &dated), Ordering::Greater);
        assert_eq!(SortKey::Deadline.compare(&undated, &undated), Ordering::Equal);
    }

    #[test]
    fn title_is_case_insensitive() {
        let a = todo("apple", Priority::Low);
        let b = todo("Banana", Priority::Low);
        assert_eq!(SortKey::Title.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn parse_sort_keys() {
        assert_eq!("priority".parse::<SortKey>().unwrap(), SortKey::Priority);
        assert_eq!("Created".parse::<SortKey>().unwrap(), SortKey::CreatedAt);
        assert!(matches!(
            "urgency".parse::<SortKey>(),
            Err(TodoError::Validation(_))
        ));
    }

    #[test]
    fn filters_compose() {
        let today = Date::new(2025, 10, 7).unwrap();
        let late = todo("late", Priority::Important)
            .with_category("University")
            .with_deadline(Date::new(2025, 10, 1).unwrap())
            .with_tags(["thesis"]);
        let relaxed = todo("relaxed", Priority::Low).with_category("University");

        let filter = TodoFilter::new()
            .category("University")
            .priority_at_least(Priority::Moderate)
            .overdue(true, today);
        assert!(filter.matches(&late));
        assert!(!filter.matches(&relaxed));

        assert!(TodoFilter::new().matches(&relaxed));
        assert!(TodoFilter::new().tag("thesis").matches(&late));
        assert!(!TodoFilter::new().tag("thesis").matches(&relaxed));
        assert!(TodoFilter::new().priority(Priority::Low).matches(&relaxed));
        assert!(TodoFilter::new().overdue(false, today).matches(&relaxed));
        assert!(TodoFilter::new().done(false).matches(&relaxed));
        assert!(!TodoFilter::new().done(true).matches(&relaxed));
    }
}
