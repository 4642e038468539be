//! Action dispatcher.
//!
//! Executes one parsed action against the task store or the scheduler and
//! composes the reply text. Every branch substitutes defaults for missing
//! parameters and turns store failures into a plain-language line, so the
//! result is always a reply.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::action::{
    Action, CreateTaskParams, ListTasksParams, ParsedReply, PlanParams, StatusParam, UpdateStatusParams,
};
use crate::config::PlannerConfig;
use crate::planner::{Plan, generate_plan, local_today};
use crate::tasks::{Task, TaskStore};

/// Longest planning horizon accepted from a request, in days.
pub const MAX_PLAN_DAYS: u32 = 366;

/// Structured result of handling one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessResult {
    /// Wire name of the executed action.
    pub action: String,
    /// Parameters as received.
    pub params: Value,
    /// Final user-facing reply.
    pub assistant_message: String,
    /// Task created by `create_task`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    /// Tasks shown by `list_tasks`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    /// Whether `update_task_status` found its task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<bool>,
    /// Plan built by `generate_plan`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    /// The reply came from the response cache.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

impl ProcessResult {
    fn from_reply(reply: &ParsedReply, assistant_message: String) -> Self {
        Self {
            action: reply.action.name().to_owned(),
            params: reply.params.clone(),
            assistant_message,
            task: None,
            tasks: None,
            updated: None,
            plan: None,
            cached: false,
        }
    }

    /// A chat-only result carrying `message`.
    #[must_use]
    pub fn chat(message: impl Into<String>) -> Self {
        Self::from_reply(&ParsedReply::chat_only(""), message.into())
    }
}

/// Runs parsed actions against a task store.
pub struct Dispatcher {
    store: Arc<dyn TaskStore>,
    planner: PlannerConfig,
    today: Option<NaiveDate>,
}

impl Dispatcher {
    /// Dispatcher over `store` with planning defaults from `planner`.
    pub fn new(store: Arc<dyn TaskStore>, planner: PlannerConfig) -> Self {
        Self {
            store,
            planner,
            today: None,
        }
    }

    /// Pin the first plan day instead of using the local date.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// The store actions run against.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// Execute `reply.action` and compose the final reply.
    pub fn dispatch(&self, reply: ParsedReply) -> ProcessResult {
        debug!("dispatching {}", reply.action.name());
        let mut result = ProcessResult::from_reply(&reply, reply.assistant_message.clone());

        match reply.action {
            Action::CreateTask(params) => self.create_task(params, &mut result),
            Action::ListTasks(params) => self.list_tasks(&params, &mut result),
            Action::UpdateTaskStatus(params) => self.update_status(&params, &mut result),
            Action::GeneratePlan(params) => self.plan(&params, &mut result),
            Action::ChatOnly => {}
        }
        result
    }

    fn create_task(&self, params: CreateTaskParams, result: &mut ProcessResult) {
        match self.store.create(params.into_new_task()) {
            Ok(task) => {
                info!("created task {}", task.id);
                result
                    .assistant_message
                    .push_str(&format!("\n\n[Task created with ID {}]", task.id));
                result.task = Some(task);
            }
            Err(e) => {
                error!("failed to create task: {e}");
                result
                    .assistant_message
                    .push_str("\n\n[I couldn't save that task. Please try again.]");
            }
        }
    }

    fn list_tasks(&self, params: &ListTasksParams, result: &mut ProcessResult) {
        let listed = match &params.status {
            StatusParam::Missing => self.store.list(None),
            StatusParam::Known(status) => self.store.list(Some(*status)),
            StatusParam::Unrecognised(raw) => {
                debug!("status filter {raw:?} matches no task");
                Ok(Vec::new())
            }
        };
        let tasks = match listed {
            Ok(tasks) => tasks,
            Err(e) => {
                error!("failed to list tasks: {e}");
                result
                    .assistant_message
                    .push_str("\n\n[I couldn't read your tasks right now. Please try again.]");
                return;
            }
        };

        if tasks.is_empty() {
            result
                .assistant_message
                .push_str("\n\nYou currently have no tasks matching that filter.");
        } else {
            result.assistant_message.push_str("\n\nHere are your tasks:\n");
            for task in &tasks {
                result.assistant_message.push_str(&format_task_line(task));
            }
        }
        result.tasks = Some(tasks);
    }

    fn update_status(&self, params: &UpdateStatusParams, result: &mut ProcessResult) {
        let Some(task_id) = params.task_id else {
            debug!("update_task_status without a usable task id");
            result.updated = Some(false);
            result.assistant_message.push_str(NOT_FOUND_LINE);
            return;
        };

        let Some(status) = params.resolved_status() else {
            debug!("update_task_status with unrecognised status {:?}", params.new_status);
            result.updated = Some(false);
            result.assistant_message.push_str(UNKNOWN_STATUS_LINE);
            return;
        };

        match self.store.update_status(task_id, status) {
            Ok(true) => {
                info!("task {task_id} set to {status}");
                result.updated = Some(true);
                result
                    .assistant_message
                    .push_str("\n\n[Task status updated successfully.]");
            }
            Ok(false) => {
                result.updated = Some(false);
                result.assistant_message.push_str(NOT_FOUND_LINE);
            }
            Err(e) => {
                error!("failed to update task {task_id}: {e}");
                result.updated = Some(false);
                result
                    .assistant_message
                    .push_str("\n\n[I couldn't save that change. Please try again.]");
            }
        }
    }

    fn plan(&self, params: &PlanParams, result: &mut ProcessResult) {
        let (daily_hours, num_days) = resolve_plan_inputs(&self.planner, params);
        let tasks = match self.store.list(None) {
            Ok(tasks) => tasks,
            Err(e) => {
                error!("failed to read tasks for planning: {e}");
                result
                    .assistant_message
                    .push_str("\n\n[I couldn't read your tasks, so no plan was made.]");
                return;
            }
        };

        let today = self.today.unwrap_or_else(local_today);
        let plan = generate_plan(&tasks, daily_hours, num_days, today);
        result.assistant_message.push_str(&format_plan(&plan));
        result.plan = Some(plan);
    }
}

/// Requested capacity and horizon, with defaults for absent or unusable
/// values and the horizon capped at [`MAX_PLAN_DAYS`].
#[must_use]
pub fn resolve_plan_inputs(planner: &PlannerConfig, params: &PlanParams) -> (f64, u32) {
    let daily_hours = params
        .daily_hours
        .filter(|h| *h > 0.0)
        .unwrap_or(planner.default_daily_hours);
    let num_days = params
        .num_days
        .filter(|d| *d > 0)
        .unwrap_or(planner.default_num_days)
        .min(MAX_PLAN_DAYS);
    (daily_hours, num_days)
}

const NOT_FOUND_LINE: &str = "\n\n[I couldn't find that task ID. Please check and try again.]";

const UNKNOWN_STATUS_LINE: &str =
    "\n\n[I don't recognise that status. Use pending, in_progress or done.]";

/// One task as a list line.
#[must_use]
pub fn format_task_line(task: &Task) -> String {
    format!(
        "- ID {}: {} (deadline: {}, hours: {}, priority: {}, status: {})\n",
        task.id, task.title, task.deadline, task.estimated_hours, task.priority, task.status
    )
}

/// A plan as one block per day.
#[must_use]
pub fn format_plan(plan: &Plan) -> String {
    let mut out = String::from("\n\nHere's your study plan:\n");
    for day in plan.days() {
        out.push_str(&format!("\n📅 {}\n", day.date_string()));
        if day.slots.is_empty() {
            out.push_str("  - No tasks scheduled.\n");
        }
        for slot in &day.slots {
            out.push_str(&format!(
                "  - {} ({} hours) [Task ID {}]\n",
                slot.title, slot.hours, slot.task_id
            ));
        }
    }
    out
}
