//! Domain models for the ToDo graph
//!
//! Contains the core business logic without any I/O concerns.

mod date;
mod error;
mod graph;
mod id;
mod manager;
mod priority;
mod query;
mod todo;

pub use date::Date;
pub use error::TodoError;
pub use graph::DependencyGraph;
pub use id::TodoId;
pub use manager::{Stats, ToDoManager, TodoUpdate};
pub use priority::Priority;
pub use query::{PriorityFilter, SortKey, TodoFilter};
pub use todo::{Links, ToDo};
