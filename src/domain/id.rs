//! Stable task identifiers
//!
//! Generated IDs look like `t-{10-char-hash}` (e.g. `t-7f2b4c19d0`). The hash is
//! derived from the title, creation timestamp, process id and a process-wide
//! counter, so two tasks created in the same process never share an ID even
//! with identical titles and timestamps.
//!
//! Any non-empty token without whitespace parses as an ID, which lets documents
//! written by other tools (UUIDs, hand-edited names) load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use super::error::TodoError;

const HASH_LEN: usize = 10;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates a short hash from title, timestamp and a process-unique sequence
fn generate_hash(title: &str, timestamp: DateTime<Utc>) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let input = format!(
        "{}{}{}{}",
        title,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        std::process::id(),
        seq
    );
    let hash = blake3::hash(input.as_bytes());
    hash.to_hex()[..HASH_LEN].to_string()
}

/// Identifier of a task; never reused and never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TodoId(String);

impl TodoId {
    /// Creates a fresh ID for a task with the given title
    pub fn generate(title: &str, timestamp: DateTime<Utc>) -> Self {
        Self(format!("t-{}", generate_hash(title, timestamp)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `prefix` is a prefix of this ID
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for TodoId {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(TodoError::validation(format!("invalid task ID: '{}'", s)));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TodoId {
    type Error = TodoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TodoId> for String {
    fn from(id: TodoId) -> Self {
        id.0
    }
}
