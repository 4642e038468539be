//! Task data types.
//!
//! Defines the [`Task`] record, its [`Priority`] and [`TaskStatus`] enums,
//! and the [`NewTask`] parameters used when creating one.

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Deadline format used for every stored task.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// Title used when none is given.
pub const DEFAULT_TITLE: &str = "Untitled task";

/// Deadline used when none is given.
pub const DEFAULT_DEADLINE: &str = "2099-12-31";

/// Effort estimate used when none is given.
pub const DEFAULT_ESTIMATED_HOURS: f64 = 1.0;

/// How urgent a task is.
///
/// Deserialization is lenient: unknown strings read as [`Priority::Medium`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Priority {
    /// Can wait.
    Low,
    /// The default.
    #[default]
    Medium,
    /// Do first.
    High,
}

impl Priority {
    /// Parse a priority, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "normal" => Some(Self::Medium),
            "high" | "urgent" => Some(Self::High),
            _ => None,
        }
    }

    /// Sort rank: high before medium before low.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    /// Lowercase name as stored on disk.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or_default()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a task.
///
/// Deserialization is lenient: unknown strings read as [`TaskStatus::Pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Pending,
    /// Being worked on.
    InProgress,
    /// Finished; never scheduled.
    Done,
}

impl TaskStatus {
    /// Parse a status, accepting common spellings (`"In Progress"`,
    /// `"in-progress"`, `"completed"`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "pending" | "todo" | "open" => Some(Self::Pending),
            "in_progress" | "started" | "doing" => Some(Self::InProgress),
            "done" | "completed" | "complete" | "finished" => Some(Self::Done),
            _ => None,
        }
    }

    /// Lowercase name as stored on disk.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw).unwrap_or_default()
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored task.
///
/// Records are read leniently so a hand-edited or older task file still
/// loads: a null or non-text title or deadline takes its default, hours may
/// be a numeric string, and unknown priority or status strings take their
/// defaults. Only a record without a usable id is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Store-wide unique id, starting at 1.
    #[serde(deserialize_with = "lenient_id")]
    pub id: u64,
    /// Short description.
    #[serde(default = "default_title", deserialize_with = "lenient_title")]
    pub title: String,
    /// Deadline as `YYYY-MM-DD`. Kept as text so malformed values survive
    /// a load/save cycle untouched.
    #[serde(default = "default_deadline", deserialize_with = "lenient_deadline")]
    pub deadline: String,
    /// Estimated effort in hours.
    #[serde(default = "default_hours", deserialize_with = "lenient_hours")]
    pub estimated_hours: f64,
    /// Urgency.
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Priority,
    /// Lifecycle state.
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: TaskStatus,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_owned()
}

fn default_deadline() -> String {
    DEFAULT_DEADLINE.to_owned()
}

fn default_hours() -> f64 {
    DEFAULT_ESTIMATED_HOURS
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let id = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    id.ok_or_else(|| D::Error::custom("task id is not a whole number"))
}

/// Text, or the stringified number; anything else is `None`.
fn text_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_title<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(text_value(Value::deserialize(deserializer)?).unwrap_or_else(default_title))
}

fn lenient_deadline<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(text_value(Value::deserialize(deserializer)?).unwrap_or_else(default_deadline))
}

fn lenient_hours<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let hours = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(hours
        .filter(|h| h.is_finite() && *h >= 0.0)
        .unwrap_or(DEFAULT_ESTIMATED_HOURS))
}

fn lenient_priority<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Priority, D::Error> {
    Ok(text_value(Value::deserialize(deserializer)?)
        .map(Priority::from)
        .unwrap_or_default())
}

fn lenient_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TaskStatus, D::Error> {
    Ok(text_value(Value::deserialize(deserializer)?)
        .map(TaskStatus::from)
        .unwrap_or_default())
}

impl Task {
    /// The deadline as a calendar date, or `None` when it does not parse.
    #[must_use]
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.deadline.trim(), DEADLINE_FORMAT).ok()
    }
}

/// Parameters for creating a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    /// Short description.
    pub title: String,
    /// Deadline as `YYYY-MM-DD`.
    pub deadline: String,
    /// Estimated effort in hours.
    pub estimated_hours: f64,
    /// Urgency.
    pub priority: Priority,
}

impl NewTask {
    /// Build the stored record for this task under the given id. New tasks
    /// always start out pending.
    #[must_use]
    pub fn into_task(self, id: u64) -> Task {
        Task {
            id,
            title: self.title,
            deadline: self.deadline,
            estimated_hours: self.estimated_hours,
            priority: self.priority,
            status: TaskStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn priority_parse_ignores_case() {
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse(" low "), Some(Priority::Low));
        assert_eq!(Priority::parse("Medium"), Some(Priority::Medium));
        assert_eq!(Priority::parse("critical"), None);
    }

    #[test]
    fn priority_rank_orders_high_first() {
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn status_parse_accepts_spellings() {
        assert_eq!(TaskStatus::parse("in progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("In-Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("DONE"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::parse("completed"), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::parse("archived"), None);
    }

    #[test]
    fn task_deserializes_leniently() {
        let json = r#"{"id": 3, "title": "Essay", "deadline": "soon",
            "estimated_hours": 2.5, "priority": "CRITICAL", "status": "weird"}"#;
        let task: Task = serde_json::from_str(json).expect("parse");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.deadline, "soon");
        assert!(task.deadline_date().is_none());
    }

    #[test]
    fn null_and_loose_fields_take_defaults() {
        let json = r#"{"id": "4", "title": null, "deadline": null,
            "estimated_hours": "1.5", "priority": null, "status": 3}"#;
        let task: Task = serde_json::from_str(json).expect("parse");
        assert_eq!(task.id, 4);
        assert_eq!(task.title, DEFAULT_TITLE);
        assert_eq!(task.deadline, DEFAULT_DEADLINE);
        assert!((task.estimated_hours - 1.5).abs() < f64::EPSILON);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let task: Task = serde_json::from_str(r#"{"id": 9}"#).expect("parse");
        assert_eq!(task.title, DEFAULT_TITLE);
        assert_eq!(task.deadline, DEFAULT_DEADLINE);
        assert!((task.estimated_hours - DEFAULT_ESTIMATED_HOURS).abs() < f64::EPSILON);
    }

    #[test]
    fn unusable_id_is_rejected() {
        assert!(serde_json::from_str::<Task>(r#"{"id": "abc", "title": "x"}"#).is_err());
        assert!(serde_json::from_str::<Task>(r#"{"id": -1}"#).is_err());
        assert!(serde_json::from_str::<Task>(r#"{"title": "no id"}"#).is_err());
    }

    #[test]
    fn task_serializes_snake_case() {
        let task = NewTask {
            title: "Lab report".into(),
            deadline: "2099-01-01".into(),
            estimated_hours: 1.0,
            priority: Priority::High,
        }
        .into_task(7);
        let value = serde_json::to_value(&task).expect("serialize");
        assert_eq!(value["priority"], "high");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn deadline_date_parses_iso() {
        let task = NewTask {
            title: "x".into(),
            deadline: "2099-12-31".into(),
            estimated_hours: 1.0,
            priority: Priority::Low,
        }
        .into_task(1);
        assert_eq!(
            task.deadline_date(),
            NaiveDate::from_ymd_opt(2099, 12, 31)
        );
    }
}
