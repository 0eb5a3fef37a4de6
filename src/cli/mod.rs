//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Tasks | Create and change tasks | `add`, `edit`, `done`, `undone`, `rm` |
//! | Links | Dependency edges | `dep`, `undep` |
//! | Query | Views over the graph | `list`, `ready`, `blocked`, `upcoming`, `order`, `stats` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logging on stderr:
//! ```bash
//! todo --verbose ready
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod query;
mod todo_cmd;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
