//! Task manager
//!
//! [`ToDoManager`] owns every task in an arena keyed by [`TodoId`] and is the
//! only code that changes relationship sets on managed tasks. Every
//! graph-mutating operation either succeeds completely or leaves the graph
//! exactly as it was.
//!
//! Completion never propagates to dependents. Completing a task only makes its
//! dependents *eligible*; [`ToDoManager::complete`] reports which ones.
//! Reopening does propagate: a done dependent of a reopened task would violate
//! "done implies prerequisites done", so it is reopened as well.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::date::Date;
use super::error::TodoError;
use super::graph::DependencyGraph;
use super::id::TodoId;
use super::priority::Priority;
use super::query::{SortKey, TodoFilter};
use super::todo::ToDo;

/// Scalar attribute changes for [`ToDoManager::update_todo`]
///
/// `None` leaves a field untouched. Relationship sets cannot be changed here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    /// `Some(None)` clears the deadline
    pub deadline: Option<Option<Date>>,
    pub estimated_time: Option<Option<f64>>,
    pub actual_time: Option<Option<f64>>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

impl TodoUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TodoUpdate::default()
    }

    fn apply(&self, todo: &mut ToDo) -> Result<(), TodoError> {
        if let Some(title) = &self.title {
            todo.set_title(title.clone())?;
        }
        if let Some(category) = &self.category {
            todo.category = category.clone();
        }
        if let Some(description) = &self.description {
            todo.description = description.clone();
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(deadline) = self.deadline {
            todo.set_deadline(deadline);
        }
        if let Some(hours) = self.estimated_time {
            todo.set_estimated_time(hours)?;
        }
        if let Some(hours) = self.actual_time {
            todo.set_actual_time(hours)?;
        }
        for tag in &self.add_tags {
            todo.add_tag(tag.clone())?;
        }
        for tag in &self.remove_tags {
            todo.remove_tag(tag);
        }
        Ok(())
    }
}

/// Summary counts over the collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub done: usize,
    pub open: usize,
    pub in_progress: usize,
    pub overdue: usize,
    pub ready: usize,
    pub blocked: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<Priority, usize>,
    /// Done tasks over all tasks, 0 when empty
    pub completion_ratio: f64,
    /// Mean time from creation to completion, in hours
    pub average_completion_hours: Option<f64>,
}

/// Owner of all tasks and their dependency graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToDoManager {
    /// Insertion order, for stable default listings
    order: Vec<TodoId>,
    todos: HashMap<TodoId, ToDo>,
}

impl ToDoManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &TodoId) -> bool {
        self.todos.contains_key(id)
    }

    pub fn get(&self, id: &TodoId) -> Option<&ToDo> {
        self.todos.get(id)
    }

    /// All tasks in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ToDo> {
        self.order.iter().filter_map(|id| self.todos.get(id))
    }

    pub fn find_by_title(&self, title: &str) -> Vec<&ToDo> {
        self.iter().filter(|t| t.title() == title).collect()
    }

    /// Resolves an exact ID or a unique ID prefix
    pub fn resolve(&self, query: &str) -> Result<TodoId, TodoError> {
        let id: TodoId = query.parse()?;
        if self.contains(&id) {
            return Ok(id);
        }

        let matches: Vec<_> = self
            .order
            .iter()
            .filter(|candidate| candidate.starts_with(id.as_str()))
            .collect();
        match matches.as_slice() {
            [single] => Ok((*single).clone()),
            [] => Err(TodoError::NotFound(id)),
            many => Err(TodoError::validation(format!(
                "'{}' is ambiguous, matches {} tasks",
                id,
                many.len()
            ))),
        }
    }

    fn require(&self, id: &TodoId) -> Result<&ToDo, TodoError> {
        self.todos
            .get(id)
            .ok_or_else(|| TodoError::NotFound(id.clone()))
    }

    fn require_mut(&mut self, id: &TodoId) -> Result<&mut ToDo, TodoError> {
        self.todos
            .get_mut(id)
            .ok_or_else(|| TodoError::NotFound(id.clone()))
    }

    // ------------------------------------------------------------------
    // Graph mutation
    // ------------------------------------------------------------------

    /// Registers a task under its ID
    ///
    /// A task that already lists dependencies or dependents is wired into the
    /// graph: every referenced task must exist, their inverse sets are updated
    /// and the result must stay acyclic. A done task that ends up depending on
    /// an open one is reopened along with its done dependents.
    pub fn add_todo(&mut self, todo: ToDo) -> Result<TodoId, TodoError> {
        let id = todo.id().clone();
        if self.contains(&id) {
            return Err(TodoError::DuplicateId(id));
        }

        for other in todo.dependencies().iter().chain(todo.dependents()) {
            if other == &id {
                return Err(TodoError::Cycle {
                    task: id.clone(),
                    depends_on: id,
                });
            }
            if !self.contains(other) {
                return Err(TodoError::NotFound(other.clone()));
            }
        }

        // The new task sits between its dependents and its dependencies, so a
        // dependency that already (transitively) depends on a dependent closes a loop.
        for dep in todo.dependencies() {
            let reachable = self.reachable_from(dep);
            if let Some(dependent) = todo.dependents().iter().find(|p| reachable.contains(*p)) {
                return Err(TodoError::Cycle {
                    task: dependent.clone(),
                    depends_on: id,
                });
            }
        }

        for dep in todo.dependencies() {
            if let Some(other) = self.todos.get_mut(dep) {
                other.add_dependent(id.clone());
            }
        }
        for dependent in todo.dependents() {
            if let Some(other) = self.todos.get_mut(dependent) {
                other.add_dependency(id.clone());
            }
        }

        let done = todo.is_done();
        let waits_on_open = !self.unblocked(&todo);
        let done_dependents: Vec<TodoId> = todo
            .dependents()
            .iter()
            .filter(|d| self.todos.get(*d).is_some_and(ToDo::is_done))
            .cloned()
            .collect();

        self.order.push(id.clone());
        self.todos.insert(id.clone(), todo);

        if done && waits_on_open {
            self.reopen(&id)?;
        } else if !done {
            for dependent in &done_dependents {
                self.reopen(dependent)?;
            }
        }
        Ok(id)
    }

    /// Removes a task and erases its ID from every other task's link sets
    pub fn remove_todo(&mut self, id: &TodoId) -> Result<ToDo, TodoError> {
        let mut removed = self
            .todos
            .remove(id)
            .ok_or_else(|| TodoError::NotFound(id.clone()))?;
        self.order.retain(|existing| existing != id);

        for dep in removed.dependencies() {
            if let Some(other) = self.todos.get_mut(dep) {
                other.remove_dependent(id);
            }
        }
        for dependent in removed.dependents() {
            if let Some(other) = self.todos.get_mut(dependent) {
                other.remove_dependency(id);
            }
        }

        removed.clear_links();
        Ok(removed)
    }

    /// Removes every task
    pub fn clear(&mut self) {
        self.order.clear();
        self.todos.clear();
    }

    /// Records that `task` depends on `depends_on`
    ///
    /// Idempotent. Fails with `Cycle` if `depends_on` already reaches `task`
    /// through its dependencies (or is `task` itself). If `task` is done and
    /// `depends_on` is open, `task` and its done dependents are reopened; their
    /// IDs are returned.
    pub fn link(&mut self, task: &TodoId, depends_on: &TodoId) -> Result<Vec<TodoId>, TodoError> {
        let task_done = self.require(task)?.is_done();
        let prerequisite_open = !self.require(depends_on)?.is_done();

        if self.require(task)?.dependencies().contains(depends_on) {
            return Ok(Vec::new());
        }
        if task == depends_on || self.reachable_from(depends_on).contains(task) {
            return Err(TodoError::Cycle {
                task: task.clone(),
                depends_on: depends_on.clone(),
            });
        }

        self.require_mut(task)?.add_dependency(depends_on.clone());
        self.require_mut(depends_on)?.add_dependent(task.clone());

        if !(task_done && prerequisite_open) {
            return Ok(Vec::new());
        }
        let mut reopened = vec![task.clone()];
        reopened.extend(self.reopen(task)?);
        Ok(reopened)
    }

    /// Removes the edge `task` depends on `depends_on`; no-op if absent
    pub fn unlink(&mut self, task: &TodoId, depends_on: &TodoId) -> Result<(), TodoError> {
        self.require(task)?;
        self.require(depends_on)?;

        self.require_mut(task)?.remove_dependency(depends_on);
        self.require_mut(depends_on)?.remove_dependent(task);
        Ok(())
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Marks a task done
    ///
    /// Fails with `Blocked` while any dependency is open. Dependents are never
    /// completed automatically; with `cascade` the IDs of dependents that have
    /// become eligible for completion are returned.
    pub fn complete(&mut self, id: &TodoId, cascade: bool) -> Result<Vec<TodoId>, TodoError> {
        let open = self.blocking_tasks(id)?;
        self.require_mut(id)?.mark_done(&open, false)?;

        if !cascade {
            return Ok(Vec::new());
        }
        Ok(self.eligible_dependents(id))
    }

    /// Marks a task done even if dependencies are still open
    pub fn force_complete(&mut self, id: &TodoId) -> Result<(), TodoError> {
        let open = self.blocking_tasks(id)?;
        self.require_mut(id)?.mark_done(&open, true)?;
        Ok(())
    }

    /// Reopens a task and every done task that transitively depends on it
    ///
    /// Returns the dependents that were reopened.
    pub fn reopen(&mut self, id: &TodoId) -> Result<Vec<TodoId>, TodoError> {
        let root = self.require_mut(id)?;
        root.unmark_done();
        let mut stack: Vec<TodoId> = root.dependents().iter().cloned().collect();

        let mut reopened = Vec::new();
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(todo) = self.todos.get_mut(&current) {
                if todo.unmark_done() {
                    stack.extend(todo.dependents().iter().cloned());
                    reopened.push(current);
                }
            }
        }
        Ok(reopened)
    }

    /// Marks a task in progress
    pub fn start(&mut self, id: &TodoId) -> Result<(), TodoError> {
        self.require_mut(id)?.start();
        Ok(())
    }

    /// Moves a task's deadline later
    pub fn extend_deadline(&mut self, id: &TodoId, new_date: Date) -> Result<(), TodoError> {
        self.require_mut(id)?.extend_deadline(new_date)
    }

    /// Raises the priority of open tasks as their deadline approaches
    ///
    /// One level at three days left, another at one day left and a last one
    /// once overdue. Each task records the stages it has been through, so a
    /// stage is applied at most once no matter how often this runs. Returns
    /// the tasks whose priority was raised.
    pub fn escalate_priorities(&mut self, today: &Date) -> Vec<TodoId> {
        let mut escalated = Vec::new();
        for id in &self.order {
            let Some(todo) = self.todos.get_mut(id) else {
                continue;
            };
            if todo.is_done() {
                continue;
            }
            let Some(deadline) = todo.deadline else {
                continue;
            };
            if todo.escalate_to(escalation_stage(today.days_until(&deadline))) {
                escalated.push(id.clone());
            }
        }
        escalated
    }

    /// Applies scalar attribute changes; nothing changes if any of them is invalid
    pub fn update_todo(&mut self, id: &TodoId, update: &TodoUpdate) -> Result<&ToDo, TodoError> {
        let mut edited = self.require(id)?.clone();
        update.apply(&mut edited)?;

        let slot = self.require_mut(id)?;
        *slot = edited;
        Ok(slot)
    }

    // ------------------------------------------------------------------
    // Dependency queries
    // ------------------------------------------------------------------

    /// Every task `start` depends on, directly or transitively, including `start`
    fn reachable_from(&self, start: &TodoId) -> HashSet<TodoId> {
        let mut visited = HashSet::new();
        let mut stack = vec![start.clone()];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(todo) = self.todos.get(&current) {
                stack.extend(todo.dependencies().iter().cloned());
            }
        }
        visited
    }

    /// Transitive dependencies of a task, nearest first
    pub fn transitive_dependencies(&self, id: &TodoId) -> Result<Vec<TodoId>, TodoError> {
        let mut seen = HashSet::from([id.clone()]);
        let mut queue: std::collections::VecDeque<TodoId> =
            self.require(id)?.dependencies().iter().cloned().collect();

        let mut result = Vec::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(todo) = self.todos.get(&current) {
                queue.extend(todo.dependencies().iter().cloned());
            }
            result.push(current);
        }
        Ok(result)
    }

    /// Dependencies of `id` that are not done yet
    pub fn blocking_tasks(&self, id: &TodoId) -> Result<Vec<TodoId>, TodoError> {
        Ok(self
            .require(id)?
            .dependencies()
            .iter()
            .filter(|dep| self.todos.get(*dep).is_some_and(|t| !t.is_done()))
            .cloned()
            .collect())
    }

    /// True if every dependency of `id` is done
    pub fn is_unblocked(&self, id: &TodoId) -> Result<bool, TodoError> {
        Ok(self.blocking_tasks(id)?.is_empty())
    }

    fn unblocked(&self, todo: &ToDo) -> bool {
        todo.dependencies()
            .iter()
            .all(|dep| self.todos.get(dep).is_some_and(ToDo::is_done))
    }

    /// Open dependents of `id` whose dependencies are all done
    pub fn eligible_dependents(&self, id: &TodoId) -> Vec<TodoId> {
        let Some(todo) = self.todos.get(id) else {
            return Vec::new();
        };
        todo.dependents()
            .iter()
            .filter(|dep| {
                self.todos
                    .get(*dep)
                    .is_some_and(|t| !t.is_done() && self.unblocked(t))
            })
            .cloned()
            .collect()
    }

    /// Open tasks with every dependency done
    pub fn ready(&self) -> Vec<&ToDo> {
        self.iter()
            .filter(|t| !t.is_done() && self.unblocked(t))
            .collect()
    }

    /// Open tasks waiting on at least one open dependency
    pub fn blocked(&self) -> Vec<&ToDo> {
        self.iter()
            .filter(|t| !t.is_done() && !self.unblocked(t))
            .collect()
    }

    /// Tasks nothing depends on
    pub fn roots(&self) -> Vec<&ToDo> {
        self.iter().filter(|t| t.is_root()).collect()
    }

    /// Tasks that depend on nothing
    pub fn leaves(&self) -> Vec<&ToDo> {
        self.iter().filter(|t| t.is_leaf()).collect()
    }

    /// All task IDs with dependencies before their dependents
    pub fn topological_order(&self) -> Result<Vec<TodoId>, TodoError> {
        DependencyGraph::from_todos(self.iter())?.topological_order()
    }

    // ------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------

    /// Filters, then stable-sorts by each key in turn
    ///
    /// Ties on every key keep insertion order.
    pub fn list_all(&self, sort_by: &[SortKey], filter: Option<&TodoFilter>) -> Vec<&ToDo> {
        let mut items: Vec<&ToDo> = self
            .iter()
            .filter(|t| filter.map_or(true, |f| f.matches(t)))
            .collect();

        items.sort_by(|a, b| {
            sort_by
                .iter()
                .fold(Ordering::Equal, |acc, key| acc.then_with(|| key.compare(a, b)))
        });
        items
    }

    pub fn overdue(&self, today: &Date) -> Vec<&ToDo> {
        self.iter().filter(|t| t.is_overdue(today)).collect()
    }

    /// Open tasks due between `today` and `days` days later, inclusive
    pub fn upcoming(&self, today: &Date, days: i64) -> Vec<&ToDo> {
        self.iter()
            .filter(|t| !t.is_done())
            .filter(|t| {
                t.deadline
                    .is_some_and(|deadline| (0..=days).contains(&today.days_until(&deadline)))
            })
            .collect()
    }

    pub fn in_progress(&self) -> Vec<&ToDo> {
        self.iter().filter(|t| t.is_in_progress()).collect()
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    pub fn stats(&self, today: &Date) -> Stats {
        let mut stats = Stats {
            total: self.len(),
            done: 0,
            open: 0,
            in_progress: 0,
            overdue: 0,
            ready: self.ready().len(),
            blocked: self.blocked().len(),
            by_category: BTreeMap::new(),
            by_priority: BTreeMap::new(),
            completion_ratio: 0.0,
            average_completion_hours: self
                .average_completion_time(None)
                .map(|d| d.num_milliseconds() as f64 / 3_600_000.0),
        };

        for todo in self.iter() {
            if todo.is_done() {
                stats.done += 1;
            } else {
                stats.open += 1;
            }
            if todo.is_in_progress() {
                stats.in_progress += 1;
            }
            if todo.is_overdue(today) {
                stats.overdue += 1;
            }
            *stats.by_category.entry(todo.category.clone()).or_default() += 1;
            *stats.by_priority.entry(todo.priority).or_default() += 1;
        }

        if stats.total > 0 {
            stats.completion_ratio = stats.done as f64 / stats.total as f64;
        }
        stats
    }

    /// Mean time from creation to completion over done tasks
    ///
    /// `scope` restricts the average to tasks whose category equals it or that
    /// carry it as a tag. `None` when no task qualifies.
    pub fn average_completion_time(&self, scope: Option<&str>) -> Option<Duration> {
        let spans: Vec<i64> = self
            .iter()
            .filter(|t| scope.map_or(true, |s| t.category == s || t.tags.contains(s)))
            .filter_map(|t| completion_span(t.created_at(), t.completed_at()?))
            .collect();

        if spans.is_empty() {
            return None;
        }
        let total: i64 = spans.iter().sum();
        Some(Duration::milliseconds(total / spans.len() as i64))
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Copies of every task in insertion order, links included
    pub fn to_records(&self) -> Vec<ToDo> {
        self.iter().cloned().collect()
    }

    /// The whole collection as a JSON array, in insertion order
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Array(self.iter().map(ToDo::to_value).collect())
    }

    /// Rebuilds a manager from a JSON array of task mappings
    pub fn from_value(value: serde_json::Value) -> Result<Self, TodoError> {
        let serde_json::Value::Array(items) = value else {
            return Err(TodoError::corrupt("expected a JSON array of tasks"));
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let todo = ToDo::from_value(item).map_err(|e| {
                TodoError::corrupt(format!("task #{}: {}", index + 1, inner_message(&e)))
            })?;
            records.push(todo);
        }
        Self::from_records(records)
    }

    /// Rebuilds a manager from tasks whose link sets are recorded but unresolved
    ///
    /// First every task is registered as-is; then every referenced ID must name
    /// a task in the same set, both sides of every link must agree, and the
    /// resulting graph must be acyclic.
    pub fn from_records(records: Vec<ToDo>) -> Result<Self, TodoError> {
        let mut manager = Self::new();
        for todo in records {
            let id = todo.id().clone();
            if manager.contains(&id) {
                return Err(TodoError::corrupt(format!("task {} appears twice", id)));
            }
            manager.order.push(id.clone());
            manager.todos.insert(id, todo);
        }

        for todo in manager.iter() {
            let id = todo.id();
            for dep in todo.dependencies() {
                let other = manager.todos.get(dep).ok_or_else(|| {
                    TodoError::corrupt(format!("task {} depends on unknown task {}", id, dep))
                })?;
                if !other.dependents().contains(id) {
                    return Err(TodoError::corrupt(format!(
                        "task {} depends on {}, but {} does not list it as a dependent",
                        id, dep, dep
                    )));
                }
            }
            for dependent in todo.dependents() {
                let other = manager.todos.get(dependent).ok_or_else(|| {
                    TodoError::corrupt(format!(
                        "task {} lists unknown dependent {}",
                        id, dependent
                    ))
                })?;
                if !other.dependencies().contains(id) {
                    return Err(TodoError::corrupt(format!(
                        "task {} lists {} as a dependent, but {} does not depend on it",
                        id, dependent, dependent
                    )));
                }
            }
        }

        DependencyGraph::from_todos(manager.iter())?;
        Ok(manager)
    }
}

fn escalation_stage(days_left: i64) -> u8 {
    match days_left {
        d if d < 0 => 3,
        0..=1 => 2,
        2..=3 => 1,
        _ => 0,
    }
}

fn completion_span(created: DateTime<Utc>, completed: DateTime<Utc>) -> Option<i64> {
    Some((completed - created).num_milliseconds())
}

fn inner_message(err: &TodoError) -> String {
    match err {
        TodoError::Validation(msg) | TodoError::CorruptData(msg) => msg.clone(),
        other => other.to_string(),
    }
}
