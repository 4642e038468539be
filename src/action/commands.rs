//! Explicit commands understood while the model is offline.
//!
//! ```text
//! add task: title=DBMS assignment, deadline=2025-11-25, hours=3, priority=high
//! list tasks
//! list tasks: status=pending
//! done 3
//! start 3
//! plan: daily_hours=2 num_days=3
//! ```

use serde_json::{Map, Value};

use crate::action::parser::ParsedReply;
use crate::action::types::Action;

/// Message placed ahead of the results of a manual command.
pub const MANUAL_COMMAND_NOTICE: &str = "The language model is offline, so I ran your command directly.";

/// Recognise a manual command in `message`.
///
/// Returns `None` for anything that is not one of the documented commands.
#[must_use]
pub fn parse_manual_command(message: &str) -> Option<ParsedReply> {
    let text = message.trim();
    let (head, rest) = match text.split_once(':') {
        Some((head, rest)) => (head.trim(), rest.trim()),
        None => (text, ""),
    };
    let head = head.to_lowercase();
    let words: Vec<&str> = head.split_whitespace().collect();

    let (name, params) = match words.as_slice() {
        ["add", "task"] | ["add"] => ("create_task", create_params(rest)),
        ["list", "tasks"] | ["list"] | ["tasks"] => ("list_tasks", key_values(rest, &[])),
        ["plan"] => ("generate_plan", key_values(rest, &[("days", "num_days"), ("hours", "daily_hours")])),
        ["done" | "finish" | "complete", id] if is_task_id(id) => {
            ("update_task_status", status_params(id, "done"))
        }
        ["start", id] if is_task_id(id) => ("update_task_status", status_params(id, "in_progress")),
        ["reopen", id] if is_task_id(id) => ("update_task_status", status_params(id, "pending")),
        _ => return None,
    };

    let params = Value::Object(params);
    Some(ParsedReply {
        action: Action::from_parts(name, &params),
        params,
        assistant_message: MANUAL_COMMAND_NOTICE.to_owned(),
    })
}

fn create_params(rest: &str) -> Map<String, Value> {
    key_values(rest, &[("hours", "estimated_hours"), ("name", "title"), ("due", "deadline")])
}

fn is_task_id(word: &str) -> bool {
    let digits = word.trim_start_matches('#');
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn status_params(id: &str, status: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("task_id".to_owned(), Value::String(id.trim_start_matches('#').to_owned()));
    params.insert("new_status".to_owned(), Value::String(status.to_owned()));
    params
}

/// Parse `key=value` pairs separated by commas or whitespace.
///
/// Words without `=` continue the previous value, so titles may contain
/// spaces. Keys are lowercased and renamed through `aliases`.
fn key_values(text: &str, aliases: &[(&str, &str)]) -> Map<String, Value> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for word in text.split_whitespace() {
        let word = word.trim_end_matches(',');
        match word.split_once('=') {
            Some((key, value)) => {
                let key = key.trim().to_lowercase();
                let key = aliases
                    .iter()
                    .find(|(alias, _)| *alias == key)
                    .map_or(key.clone(), |(_, canonical)| (*canonical).to_owned());
                pairs.push((key, value.trim().to_owned()));
            }
            None => {
                if let Some((_, value)) = pairs.last_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(word);
                }
            }
        }
    }

    pairs
        .into_iter()
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .map(|(key, value)| (key, Value::String(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::types::{CreateTaskParams, ListTasksParams, PlanParams, StatusParam, UpdateStatusParams};
    use crate::tasks::{Priority, TaskStatus};

    #[test]
    fn add_task_with_all_fields() {
        let reply =
            parse_manual_command("add task: title=DBMS assignment, deadline=2025-11-25, hours=3, priority=high")
                .unwrap_or_else(|| panic!("expected command"));
        assert_eq!(
            reply.action,
            Action::CreateTask(CreateTaskParams {
                title: Some("DBMS assignment".to_owned()),
                deadline: Some("2025-11-25".to_owned()),
                estimated_hours: Some(3.0),
                priority: Some(Priority::High),
            })
        );
        assert_eq!(reply.assistant_message, MANUAL_COMMAND_NOTICE);
    }

    #[test]
    fn add_task_without_fields_uses_defaults_later() {
        let reply = parse_manual_command("Add Task").unwrap_or_else(|| panic!("expected command"));
        assert_eq!(reply.action, Action::CreateTask(CreateTaskParams::default()));
    }

    #[test]
    fn list_with_and_without_filter() {
        let reply = parse_manual_command("list tasks").unwrap_or_else(|| panic!("expected command"));
        assert_eq!(reply.action, Action::ListTasks(ListTasksParams::default()));

        let reply = parse_manual_command("list tasks: status=pending").unwrap_or_else(|| panic!("expected command"));
        assert_eq!(
            reply.action,
            Action::ListTasks(ListTasksParams {
                status: StatusParam::Known(TaskStatus::Pending)
            })
        );
    }

    #[test]
    fn done_and_start_update_status() {
        let reply = parse_manual_command("done 4").unwrap_or_else(|| panic!("expected command"));
        assert_eq!(
            reply.action,
            Action::UpdateTaskStatus(UpdateStatusParams {
                task_id: Some(4),
                new_status: StatusParam::Known(TaskStatus::Done),
            })
        );

        let reply = parse_manual_command("start #2").unwrap_or_else(|| panic!("expected command"));
        assert_eq!(
            reply.action,
            Action::UpdateTaskStatus(UpdateStatusParams {
                task_id: Some(2),
                new_status: StatusParam::Known(TaskStatus::InProgress),
            })
        );
    }

    #[test]
    fn plan_with_spaces_and_aliases() {
        let reply = parse_manual_command("plan: daily_hours=2 num_days=3").unwrap_or_else(|| panic!("expected command"));
        assert_eq!(
            reply.action,
            Action::GeneratePlan(PlanParams {
                daily_hours: Some(2.0),
                num_days: Some(3),
            })
        );

        let reply = parse_manual_command("plan: hours=1.5, days=2").unwrap_or_else(|| panic!("expected command"));
        assert_eq!(
            reply.action,
            Action::GeneratePlan(PlanParams {
                daily_hours: Some(1.5),
                num_days: Some(2),
            })
        );
    }

    #[test]
    fn free_text_is_not_a_command() {
        assert!(parse_manual_command("what should I study today?").is_none());
        assert!(parse_manual_command("done with everything").is_none());
        assert!(parse_manual_command("done studying").is_none());
        assert!(parse_manual_command("").is_none());
    }

    #[test]
    fn key_values_joins_multiword_values() {
        let map = key_values("title=read chapter 4, priority=low", &[]);
        assert_eq!(map.get("title"), Some(&Value::String("read chapter 4".to_owned())));
        assert_eq!(map.get("priority"), Some(&Value::String("low".to_owned())));
    }
}
