//! Typed action records.
//!
//! Each [`Action`] variant carries its own parameter record. Fields are
//! optional because the model may omit or mangle any of them; defaults are
//! applied explicitly by the per-variant accessors rather than by the parser.

use serde_json::Value;
use tracing::debug;

use crate::tasks::{NewTask, Priority, TaskStatus};

pub use crate::tasks::types::{DEFAULT_DEADLINE, DEFAULT_ESTIMATED_HOURS, DEFAULT_TITLE};

/// One structured instruction from the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Add a task to the store.
    CreateTask(CreateTaskParams),
    /// Show stored tasks.
    ListTasks(ListTasksParams),
    /// Change the status of one task.
    UpdateTaskStatus(UpdateStatusParams),
    /// Build a multi-day study plan.
    GeneratePlan(PlanParams),
    /// Reply only; touch nothing.
    ChatOnly,
}

impl Action {
    /// Build an action from its wire name and a JSON parameter map.
    ///
    /// Unknown names become [`Action::ChatOnly`]; a non-object `params`
    /// is treated as an empty map.
    #[must_use]
    pub fn from_parts(name: &str, params: &Value) -> Self {
        match name.trim().to_lowercase().as_str() {
            "create_task" => Self::CreateTask(CreateTaskParams::from_value(params)),
            "list_tasks" => Self::ListTasks(ListTasksParams::from_value(params)),
            "update_task_status" => Self::UpdateTaskStatus(UpdateStatusParams::from_value(params)),
            "generate_plan" => Self::GeneratePlan(PlanParams::from_value(params)),
            "chat_only" | "" => Self::ChatOnly,
            other => {
                debug!("unknown action {other:?}, treating as chat_only");
                Self::ChatOnly
            }
        }
    }

    /// Wire name of the action.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTask(_) => "create_task",
            Self::ListTasks(_) => "list_tasks",
            Self::UpdateTaskStatus(_) => "update_task_status",
            Self::GeneratePlan(_) => "generate_plan",
            Self::ChatOnly => "chat_only",
        }
    }
}

/// Parameters of [`Action::CreateTask`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTaskParams {
    /// Task title.
    pub title: Option<String>,
    /// Deadline text, ideally `YYYY-MM-DD`.
    pub deadline: Option<String>,
    /// Effort in hours (non-negative).
    pub estimated_hours: Option<f64>,
    /// Urgency.
    pub priority: Option<Priority>,
}

impl CreateTaskParams {
    fn from_value(params: &Value) -> Self {
        Self {
            title: string_param(params, "title"),
            deadline: string_param(params, "deadline"),
            estimated_hours: number_param(params, "estimated_hours").filter(|h| *h >= 0.0),
            priority: string_param(params, "priority").and_then(|p| Priority::parse(&p)),
        }
    }

    /// Resolve missing fields to their defaults.
    #[must_use]
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title.unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
            deadline: self.deadline.unwrap_or_else(|| DEFAULT_DEADLINE.to_owned()),
            estimated_hours: self.estimated_hours.unwrap_or(DEFAULT_ESTIMATED_HOURS),
            priority: self.priority.unwrap_or_default(),
        }
    }
}

/// A status field as the model sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusParam {
    /// Absent, null or empty.
    #[default]
    Missing,
    /// A recognised status.
    Known(TaskStatus),
    /// Text that names no status; kept so callers can report it.
    Unrecognised(String),
}

impl StatusParam {
    fn from_value(params: &Value, key: &str) -> Self {
        match string_param(params, key) {
            None => Self::Missing,
            Some(raw) => match TaskStatus::parse(&raw) {
                Some(status) => Self::Known(status),
                None => {
                    debug!("unrecognised {key} {raw:?}");
                    Self::Unrecognised(raw)
                }
            },
        }
    }
}

impl From<TaskStatus> for StatusParam {
    fn from(status: TaskStatus) -> Self {
        Self::Known(status)
    }
}

/// Parameters of [`Action::ListTasks`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListTasksParams {
    /// Only list tasks in this state. An unrecognised value matches nothing.
    pub status: StatusParam,
}

impl ListTasksParams {
    fn from_value(params: &Value) -> Self {
        Self {
            status: StatusParam::from_value(params, "status"),
        }
    }
}

/// Parameters of [`Action::UpdateTaskStatus`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateStatusParams {
    /// Id of the task to change.
    pub task_id: Option<u64>,
    /// Requested status.
    pub new_status: StatusParam,
}

impl UpdateStatusParams {
    fn from_value(params: &Value) -> Self {
        Self {
            task_id: integer_param(params, "task_id"),
            new_status: StatusParam::from_value(params, "new_status"),
        }
    }

    /// The requested status: pending when none was given, `None` when the
    /// given text names no status.
    #[must_use]
    pub fn resolved_status(&self) -> Option<TaskStatus> {
        match &self.new_status {
            StatusParam::Missing => Some(TaskStatus::default()),
            StatusParam::Known(status) => Some(*status),
            StatusParam::Unrecognised(_) => None,
        }
    }
}

/// Parameters of [`Action::GeneratePlan`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanParams {
    /// Hours of capacity per day.
    pub daily_hours: Option<f64>,
    /// Planning horizon in days.
    pub num_days: Option<u32>,
}

impl PlanParams {
    fn from_value(params: &Value) -> Self {
        Self {
            daily_hours: number_param(params, "daily_hours"),
            num_days: integer_param(params, "num_days").map(|d| u32::try_from(d).unwrap_or(u32::MAX)),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field access
// ---------------------------------------------------------------------------

fn field<'a>(params: &'a Value, key: &str) -> Option<&'a Value> {
    params.as_object()?.get(key).filter(|v| !v.is_null())
}

/// Non-empty trimmed string; numbers are stringified.
fn string_param(params: &Value, key: &str) -> Option<String> {
    let text = match field(params, key)? {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Finite number, accepting numeric strings like `"2.5"`.
fn number_param(params: &Value, key: &str) -> Option<f64> {
    let number = match field(params, key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Non-negative whole number, accepting `3`, `3.0` and `"3"`.
fn integer_param(params: &Value, key: &str) -> Option<u64> {
    match field(params, key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}
