//! ToDo domain model
//!
//! A ToDo is one node of the dependency graph. It stores the IDs of the tasks
//! it depends on and of the tasks that depend on it, never the tasks
//! themselves. Keeping those two sets mirror images of each other is the
//! manager's job; the entity only offers single-side mutators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::date::Date;
use super::error::TodoError;
use super::id::TodoId;
use super::priority::Priority;

/// Ordered set of task IDs, serialized as a plain array
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(Vec<TodoId>);

impl Links {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds an ID, returning false if it was already present
    pub fn add(&mut self, id: TodoId) -> bool {
        if self.0.contains(&id) {
            false
        } else {
            self.0.push(id);
            true
        }
    }

    /// Removes an ID, returning true if it was present
    pub fn remove(&mut self, id: &TodoId) -> bool {
        let len_before = self.0.len();
        self.0.retain(|existing| existing != id);
        self.0.len() != len_before
    }

    pub fn contains(&self, id: &TodoId) -> bool {
        self.0.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TodoId> {
        self.0.iter()
    }

    fn clear(&mut self) {
        self.0.clear();
    }

    fn first_duplicate(&self) -> Option<&TodoId> {
        self.0
            .iter()
            .enumerate()
            .find(|(i, id)| self.0[..*i].contains(id))
            .map(|(_, id)| id)
    }
}

impl<'a> IntoIterator for &'a Links {
    type Item = &'a TodoId;
    type IntoIter = std::slice::Iter<'a, TodoId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<TodoId> for Links {
    fn from_iter<I: IntoIterator<Item = TodoId>>(iter: I) -> Self {
        let mut links = Links::new();
        for id in iter {
            links.add(id);
        }
        links
    }
}

/// A task or project node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TodoRecord")]
pub struct ToDo {
    id: TodoId,

    title: String,

    /// Free-form grouping, empty when unset
    pub category: String,

    pub description: String,

    pub priority: Priority,

    /// Deadline escalation stages already applied to `priority`
    escalations: u8,

    created_at: DateTime<Utc>,

    /// Direct replacement is allowed; use [`ToDo::extend_deadline`] to only move it later
    pub deadline: Option<Date>,

    pub tags: BTreeSet<String>,

    /// Hours
    estimated_time: Option<f64>,

    /// Hours
    actual_time: Option<f64>,

    in_progress: bool,

    done: bool,

    completed_at: Option<DateTime<Utc>>,

    dependencies: Links,

    dependents: Links,
}

impl ToDo {
    /// Creates an open task with a freshly generated ID
    pub fn new(title: impl Into<String>) -> Result<Self, TodoError> {
        let title = validate_title(title.into())?;
        let now = Utc::now();
        Ok(Self {
            id: TodoId::generate(&title, now),
            title,
            category: String::new(),
            description: String::new(),
            priority: Priority::default(),
            escalations: 0,
            created_at: now,
            deadline: None,
            tags: BTreeSet::new(),
            estimated_time: None,
            actual_time: None,
            in_progress: false,
            done: false,
            completed_at: None,
            dependencies: Links::new(),
            dependents: Links::new(),
        })
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_deadline(mut self, deadline: Date) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_estimated_time(mut self, hours: f64) -> Result<Self, TodoError> {
        self.set_estimated_time(Some(hours))?;
        Ok(self)
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &TodoId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn escalations(&self) -> u8 {
        self.escalations
    }

    pub fn estimated_time(&self) -> Option<f64> {
        self.estimated_time
    }

    pub fn actual_time(&self) -> Option<f64> {
        self.actual_time
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Tasks that must be done before this one
    pub fn dependencies(&self) -> &Links {
        &self.dependencies
    }

    /// Tasks that list this one as a dependency
    pub fn dependents(&self) -> &Links {
        &self.dependents
    }

    /// True if nothing depends on this task
    pub fn is_root(&self) -> bool {
        self.dependents.is_empty()
    }

    /// True if this task depends on nothing
    pub fn is_leaf(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), TodoError> {
        self.title = validate_title(title.into())?;
        Ok(())
    }

    pub fn set_estimated_time(&mut self, hours: Option<f64>) -> Result<(), TodoError> {
        self.estimated_time = validate_hours("estimated_time", hours)?;
        Ok(())
    }

    pub fn set_actual_time(&mut self, hours: Option<f64>) -> Result<(), TodoError> {
        self.actual_time = validate_hours("actual_time", hours)?;
        Ok(())
    }

    /// Adds a tag, returning false if it was already present
    pub fn add_tag(&mut self, tag: impl Into<String>) -> Result<bool, TodoError> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(TodoError::validation("tag must not be empty"));
        }
        Ok(self.tags.insert(tag))
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Marks the task in progress; no effect on a done task
    pub fn start(&mut self) {
        if !self.done {
            self.in_progress = true;
        }
    }

    /// Marks the task done now
    ///
    /// `open_dependencies` are the dependencies that are not yet done; the
    /// entity cannot see other tasks, so the caller supplies them. Fails with
    /// [`TodoError::Blocked`] unless the list is empty or
    /// `allow_with_open_dependencies` is set. Returns false if the task was
    /// already done.
    pub fn mark_done(
        &mut self,
        open_dependencies: &[TodoId],
        allow_with_open_dependencies: bool,
    ) -> Result<bool, TodoError> {
        self.mark_done_at(open_dependencies, allow_with_open_dependencies, Utc::now())
    }

    /// [`ToDo::mark_done`] with an explicit completion time
    pub fn mark_done_at(
        &mut self,
        open_dependencies: &[TodoId],
        allow_with_open_dependencies: bool,
        at: DateTime<Utc>,
    ) -> Result<bool, TodoError> {
        if self.done {
            return Ok(false);
        }
        if !open_dependencies.is_empty() && !allow_with_open_dependencies {
            return Err(TodoError::Blocked {
                id: self.id.clone(),
                open: open_dependencies.to_vec(),
            });
        }
        self.done = true;
        self.completed_at = Some(at);
        self.in_progress = false;
        Ok(true)
    }

    /// Reopens the task; returns false if it was not done
    pub fn unmark_done(&mut self) -> bool {
        if !self.done {
            return false;
        }
        self.done = false;
        self.completed_at = None;
        self.in_progress = false;
        true
    }

    /// Moves the deadline to `new_date`, which may not be earlier than the current one
    pub fn extend_deadline(&mut self, new_date: Date) -> Result<(), TodoError> {
        if let Some(current) = self.deadline {
            if new_date < current {
                return Err(TodoError::validation(format!(
                    "new deadline {} is earlier than current deadline {}",
                    new_date, current
                )));
            }
        }
        self.deadline = Some(new_date);
        Ok(())
    }

    pub fn set_deadline(&mut self, deadline: Option<Date>) {
        self.deadline = deadline;
    }

    /// Raises the priority one level for each stage above the applied count
    ///
    /// Stages only ever grow, so a stage is applied at most once. Returns
    /// false if `stage` was already reached.
    pub fn escalate_to(&mut self, stage: u8) -> bool {
        let stage = stage.min(MAX_ESCALATIONS);
        if stage <= self.escalations {
            return false;
        }
        self.priority = self.priority.raise(stage - self.escalations);
        self.escalations = stage;
        true
    }

    /// True iff the task is open and its deadline lies before `reference`
    pub fn is_overdue(&self, reference: &Date) -> bool {
        !self.done
            && self
                .deadline
                .as_ref()
                .is_some_and(|deadline| deadline.is_overdue(reference))
    }

    /// Records `id` as a dependency on this side only.
    ///
    /// Escape hatch for unmanaged tasks: this does not touch the other task's
    /// dependents and performs no cycle check. Use `ToDoManager::link` for
    /// tasks held by a manager.
    pub fn add_dependency(&mut self, id: TodoId) -> bool {
        self.dependencies.add(id)
    }

    /// Removes `id` from this task's dependencies only. See [`ToDo::add_dependency`].
    pub fn remove_dependency(&mut self, id: &TodoId) -> bool {
        self.dependencies.remove(id)
    }

    /// Records `id` as a dependent on this side only. See [`ToDo::add_dependency`].
    pub fn add_dependent(&mut self, id: TodoId) -> bool {
        self.dependents.add(id)
    }

    /// Removes `id` from this task's dependents only. See [`ToDo::add_dependency`].
    pub fn remove_dependent(&mut self, id: &TodoId) -> bool {
        self.dependents.remove(id)
    }

    pub(crate) fn clear_links(&mut self) {
        self.dependencies.clear();
        self.dependents.clear();
    }

    /// JSON mapping of every attribute, with links as ID lists
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Rebuilds a task from its JSON mapping
    ///
    /// Link IDs are recorded as-is; resolving them against other tasks happens
    /// when the manager loads a whole document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, TodoError> {
        serde_json::from_value::<TodoRecord>(value)
            .map_err(|e| TodoError::corrupt(e.to_string()))?
            .try_into()
    }
}

/// Three days left, one day left, overdue
pub const MAX_ESCALATIONS: u8 = 3;

fn validate_title(title: String) -> Result<String, TodoError> {
    if title.trim().is_empty() {
        return Err(TodoError::validation("title must not be empty"));
    }
    Ok(title)
}

fn validate_hours(field: &str, hours: Option<f64>) -> Result<Option<f64>, TodoError> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => Err(TodoError::validation(format!(
            "{} must be a non-negative number of hours, got {}",
            field, h
        ))),
        other => Ok(other),
    }
}

/// Wire shape of a task; converted into [`ToDo`] with validation
#[derive(Deserialize)]
struct TodoRecord {
    id: TodoId,
    title: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    escalations: u8,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    deadline: Option<Date>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    estimated_time: Option<f64>,
    #[serde(default)]
    actual_time: Option<f64>,
    #[serde(default)]
    in_progress: bool,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    dependencies: Links,
    #[serde(default)]
    dependents: Links,
}

impl TryFrom<TodoRecord> for ToDo {
    type Error = TodoError;

    fn try_from(record: TodoRecord) -> Result<Self, Self::Error> {
        let title = validate_title(record.title)?;
        let estimated_time = validate_hours("estimated_time", record.estimated_time)?;
        let actual_time = validate_hours("actual_time", record.actual_time)?;

        if record.done != record.completed_at.is_some() {
            return Err(TodoError::validation(format!(
                "task {}: done and completed_at disagree",
                record.id
            )));
        }
        if record.escalations > MAX_ESCALATIONS {
            return Err(TodoError::validation(format!(
                "task {}: escalations must be at most {}, got {}",
                record.id, MAX_ESCALATIONS, record.escalations
            )));
        }
        if record.done && record.in_progress {
            return Err(TodoError::validation(format!(
                "task {}: cannot be both done and in progress",
                record.id
            )));
        }
        for (name, links) in [
            ("dependencies", &record.dependencies),
            ("dependents", &record.dependents),
        ] {
            if let Some(dup) = links.first_duplicate() {
                return Err(TodoError::validation(format!(
                    "task {}: {} lists {} twice",
                    record.id, name, dup
                )));
            }
        }

        Ok(Self {
            id: record.id,
            title,
            category: record.category,
            description: record.description.unwrap_or_default(),
            priority: record.priority,
            escalations: record.escalations,
            created_at: record.created_at,
            deadline: record.deadline,
            tags: record.tags,
            estimated_time,
            actual_time,
            in_progress: record.in_progress,
            done: record.done,
            completed_at: record.completed_at,
            dependencies: record.dependencies,
            dependents: record.dependents,
        })
    }
}
