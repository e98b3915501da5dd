//! Task records.
//!
//! A task is a plain value: label, due date and priority. It carries no
//! identity of its own, so two tasks with the same fields are equal. The
//! session-scoped [`TaskId`] handed out by the store is what forms use to
//! find "their" entry again.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

/// Accepted layouts for a due date (`datetime-local` style, optional seconds)
const DUE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Priority {
    /// All priorities in selection order.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Normal => "Normal",
            Priority::Low => "Low",
        }
    }

    /// Parse one of the three priority literals. Anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
    }

    /// Next priority in selection order, wrapping around.
    pub fn cycle_next(self) -> Self {
        self.step(1)
    }

    /// Previous priority in selection order, wrapping around.
    pub fn cycle_prev(self) -> Self {
        self.step(-1)
    }

    fn step(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let idx = Self::ALL
            .iter()
            .position(|priority| *priority == self)
            .unwrap_or(0) as isize;
        Self::ALL[(idx + delta).rem_euclid(len) as usize]
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "invalid priority '{value}' (expected High|Normal|Low)"
            ))
        })
    }
}

/// One to-do item.
///
/// Serialized as `{"task": ..., "dueDate": ..., "priority": ...}` in that
/// field order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StoredTask")]
pub struct Task {
    pub task: String,
    #[serde(rename = "dueDate")]
    pub due_date: String,
    pub priority: Priority,
}

/// Wire shape of a task before the blank-field check.
#[derive(Deserialize)]
struct StoredTask {
    task: String,
    #[serde(rename = "dueDate")]
    due_date: String,
    priority: Priority,
}

impl TryFrom<StoredTask> for Task {
    type Error = String;

    fn try_from(stored: StoredTask) -> std::result::Result<Self, Self::Error> {
        if stored.task.trim().is_empty() {
            return Err("task is blank".to_string());
        }
        if stored.due_date.trim().is_empty() {
            return Err("dueDate is blank".to_string());
        }
        Ok(Self::new(stored.task, stored.due_date, stored.priority))
    }
}

impl Task {
    pub fn new(task: impl Into<String>, due_date: impl Into<String>, priority: Priority) -> Self {
        Self {
            task: task.into(),
            due_date: due_date.into(),
            priority,
        }
    }

    /// Coerce raw form values into a task.
    ///
    /// Returns `None` when a value is missing or blank, or when the priority is
    /// not one of the three literals. Values are kept exactly as given.
    pub fn from_form_values(
        task: Option<&str>,
        due_date: Option<&str>,
        priority: Option<&str>,
    ) -> Option<Self> {
        let task = task.filter(|value| !value.trim().is_empty())?;
        let due_date = due_date.filter(|value| !value.trim().is_empty())?;
        let priority = Priority::parse(priority?)?;
        Some(Self::new(task, due_date, priority))
    }

    /// Due date as a naive local timestamp, if it parses.
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        let value = self.due_date.trim();
        DUE_DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    }

    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        self.due_at().map(|due| due < now).unwrap_or(false)
    }
}

/// Session-scoped handle for a task held by a [`crate::store::TaskStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(Ulid);

impl TaskId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
