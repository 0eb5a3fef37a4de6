//! todo-graph - tasks and projects as a dependency graph
//!
//! Every task is a node that may depend on other tasks. A task can only be
//! completed once everything it depends on is done, and the graph is kept
//! acyclic at all times. The whole collection persists as one JSON document.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{Date, Priority, ToDo, ToDoManager, TodoError, TodoId};
