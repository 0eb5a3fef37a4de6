//! Error taxonomy for the task graph
//!
//! Every domain operation reports failures with [`TodoError`]. Storage and CLI
//! layers wrap it in `anyhow` with file context; callers that need the typed
//! variant can `downcast_ref::<TodoError>()`.

use thiserror::Error;

use super::id::TodoId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TodoError {
    /// Malformed date, unknown priority name or an invalid field value
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(TodoId),

    #[error("Task ID already exists: {0}")]
    DuplicateId(TodoId),

    /// `task` depending on `depends_on` would close a cycle
    #[error("Dependency would create a cycle: {task} -> {depends_on}")]
    Cycle { task: TodoId, depends_on: TodoId },

    #[error("Task {id} is blocked by open dependencies: {}", join_ids(.open))]
    Blocked { id: TodoId, open: Vec<TodoId> },

    /// A persisted document references unknown ids or is structurally invalid
    #[error("Corrupt task data: {0}")]
    CorruptData(String),
}

impl TodoError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        TodoError::Validation(message.into())
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        TodoError::CorruptData(message.into())
    }
}

fn join_ids(ids: &[TodoId]) -> String {
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
}
