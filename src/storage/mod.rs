//! # Storage Layer
//!
//! Persistence for the task collection and user configuration.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSON array of task objects | `data_file`, `--file` or `TODO_FILE` |
//! | Config | TOML | `<config dir>/todo-graph/config.toml` or `TODO_CONFIG` |
//!
//! ## Concurrency Safety
//!
//! - [`TodoStore`] uses file locking (`fs2`) for concurrent access
//! - All writes are atomic (temp file + rename)
//!
//! ## Key Types
//!
//! - [`Workspace`] - Entry point pairing config with the active task file
//! - [`TodoStore`] - Read/write the task document
//! - [`Config`] - User configuration

mod config;
mod json;
mod workspace;

pub use config::{Config, ConfigError, DEFAULT_DATA_FILE};
pub use json::TodoStore;
pub use workspace::Workspace;
