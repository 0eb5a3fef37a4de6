//! Task priority levels
//!
//! A closed set of seven levels. Each has a numeric level where 1 is the most
//! important; the `Ord` implementation orders by importance, so
//! `Priority::Critical > Priority::Parked`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::error::TodoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Priority {
    Critical,
    Essential,
    Important,
    Moderate,
    Background,
    Low,
    #[default]
    Parked,
}

impl Priority {
    /// All levels, most important first
    pub const ALL: [Priority; 7] = [
        Priority::Critical,
        Priority::Essential,
        Priority::Important,
        Priority::Moderate,
        Priority::Background,
        Priority::Low,
        Priority::Parked,
    ];

    /// Numeric level, 1 (critical) to 7 (parked)
    pub fn level(&self) -> u8 {
        match self {
            Priority::Critical => 1,
            Priority::Essential => 2,
            Priority::Important => 3,
            Priority::Moderate => 4,
            Priority::Background => 5,
            Priority::Low => 6,
            Priority::Parked => 7,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(usize::from(level).checked_sub(1)?).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::Essential => "essential",
            Priority::Important => "important",
            Priority::Moderate => "moderate",
            Priority::Background => "background",
            Priority::Low => "low",
            Priority::Parked => "parked",
        }
    }

    /// Moves `steps` levels towards critical, stopping there
    pub fn raise(self, steps: u8) -> Self {
        let level = self.level().saturating_sub(steps).max(1);
        Self::from_level(level).unwrap_or(Priority::Critical)
    }

    /// Moves `steps` levels towards parked, stopping there
    pub fn lower(self, steps: u8) -> Self {
        let level = self.level().saturating_add(steps).min(7);
        Self::from_level(level).unwrap_or(Priority::Parked)
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        other.level().cmp(&self.level())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Priority {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" | "blocking" => Ok(Priority::Critical),
            "essential" => Ok(Priority::Essential),
            "important" => Ok(Priority::Important),
            "moderate" => Ok(Priority::Moderate),
            "background" => Ok(Priority::Background),
            "low" | "optional" => Ok(Priority::Low),
            "parked" => Ok(Priority::Parked),
            other => Err(TodoError::validation(format!(
                "invalid priority '{}', must be one of: {}",
                other,
                Self::ALL.map(|p| p.name()).join(", ")
            ))),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = TodoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.name().to_string()
    }
}
