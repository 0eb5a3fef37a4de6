//! Output formatting for CLI commands

use serde::{Deserialize, Serialize};

use crate::domain::{Date, ToDo};

/// Output format
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                // Callers normally render text themselves; this is the fallback
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Prints a list of tasks as a table, or as a JSON array
    pub fn todos(&self, todos: &[&ToDo], empty_message: &str) {
        if self.is_json() {
            let items: Vec<_> = todos.iter().map(|t| t.to_value()).collect();
            self.data(&items);
            return;
        }

        if todos.is_empty() {
            println!("{}", empty_message);
            return;
        }

        println!(
            "{:<14} {:<11} {:<11} {:<8} TITLE",
            "ID", "PRIORITY", "DEADLINE", "STATUS"
        );
        println!("{}", "-".repeat(72));
        for todo in todos {
            println!(
                "{:<14} {:<11} {:<11} {:<8} {}",
                todo.id(),
                todo.priority,
                todo.deadline.map(|d| d.to_string()).unwrap_or_default(),
                status_label(todo),
                todo.title()
            );
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Short state label used in listings
pub fn status_label(todo: &ToDo) -> &'static str {
    if todo.is_done() {
        "done"
    } else if todo.is_in_progress() {
        "active"
    } else {
        "open"
    }
}

/// Human description of a deadline relative to `today`
pub fn due_label(deadline: Date, today: &Date) -> String {
    match today.days_until(&deadline) {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n if n < 0 => format!("{} day(s) overdue", -n),
        n => format!("in {} days", n),
    }
}
