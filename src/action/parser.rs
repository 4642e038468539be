//! Model reply parsing.
//!
//! Turns raw model text into a [`ParsedReply`]. Handles markdown fences,
//! prose around the JSON object and outright garbage: malformed output is
//! expected, so the fallback is a chat-only reply carrying the raw text.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::action::types::Action;

/// An action extracted from a model reply, plus the text to show the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    /// The typed action.
    pub action: Action,
    /// Parameters exactly as the model sent them (always a JSON object).
    pub params: Value,
    /// Natural-language reply.
    pub assistant_message: String,
}

impl ParsedReply {
    /// A reply that only talks and touches nothing.
    pub fn chat_only(message: impl Into<String>) -> Self {
        Self {
            action: Action::ChatOnly,
            params: Value::Object(Map::new()),
            assistant_message: message.into(),
        }
    }
}

/// Parse raw model text into a [`ParsedReply`]. Never fails.
///
/// 1. A leading code fence (and a language tag line such as `json`) is
///    stripped.
/// 2. The span from the first `{` to the last `}` is taken as the JSON
///    candidate, so an outer object survives surrounding commentary.
/// 3. A candidate that parses contributes `action`, `params` and
///    `assistant_message`, each defaulted when absent.
/// 4. Anything else becomes a chat-only reply carrying the whole text.
#[must_use]
pub fn parse_model_reply(raw: &str) -> ParsedReply {
    let text = raw.trim();
    let unfenced = strip_code_fence(text);

    let Some(candidate) = json_candidate(unfenced) else {
        debug!("model reply has no JSON object, treating as chat");
        return ParsedReply::chat_only(text);
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(obj)) => reply_from_object(obj),
        Ok(other) => {
            warn!("model reply JSON is not an object: {other}");
            ParsedReply::chat_only(text)
        }
        Err(e) => {
            warn!("model reply JSON parse failed: {e}");
            ParsedReply::chat_only(text)
        }
    }
}

fn reply_from_object(mut obj: Map<String, Value>) -> ParsedReply {
    let name = match obj.get("action") {
        Some(Value::String(s)) => s.clone(),
        _ => "chat_only".to_owned(),
    };

    let params = match obj.remove("params") {
        Some(Value::Object(map)) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let assistant_message = match obj.remove("assistant_message") {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    ParsedReply {
        action: Action::from_parts(&name, &params),
        params,
        assistant_message,
    }
}

/// Strip a surrounding markdown code fence and its language tag line.
fn strip_code_fence(text: &str) -> &str {
    if !text.starts_with("```") {
        return text;
    }

    let inner = text.trim_matches('`').trim_start();
    match inner.split_once('\n') {
        Some((first, rest)) if is_language_tag(first) => rest.trim(),
        None if is_language_tag(inner) => "",
        _ => inner.strip_prefix("json").map_or(inner, str::trim_start).trim(),
    }
}

fn is_language_tag(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// The span from the first `{` to the last `}`, inclusive.
fn json_candidate(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::types::{ListTasksParams, PlanParams, StatusParam};
    use crate::tasks::TaskStatus;
    use serde_json::json;

    const LIST_PENDING: &str =
        r#"{"action":"list_tasks","params":{"status":"pending"},"assistant_message":"ok"}"#;

    #[test]
    fn parse_plain_json() {
        let reply = parse_model_reply(LIST_PENDING);
        assert_eq!(
            reply.action,
            Action::ListTasks(ListTasksParams {
                status: StatusParam::Known(TaskStatus::Pending)
            })
        );
        assert_eq!(reply.params, json!({"status": "pending"}));
        assert_eq!(reply.assistant_message, "ok");
    }

    #[test]
    fn fenced_json_matches_unfenced() {
        let fenced = format!("```json\n{LIST_PENDING}\n```");
        assert_eq!(parse_model_reply(&fenced), parse_model_reply(LIST_PENDING));
    }

    #[test]
    fn fence_without_language_tag() {
        let fenced = format!("```\n{LIST_PENDING}\n```");
        assert_eq!(parse_model_reply(&fenced), parse_model_reply(LIST_PENDING));
    }

    #[test]
    fn fence_with_tag_on_same_line() {
        let fenced = format!("```json {LIST_PENDING}```");
        assert_eq!(parse_model_reply(&fenced), parse_model_reply(LIST_PENDING));
    }

    #[test]
    fn no_braces_degrades_to_chat() {
        let reply = parse_model_reply("I think you should add a task");
        assert_eq!(reply.action, Action::ChatOnly);
        assert_eq!(reply.params, json!({}));
        assert_eq!(reply.assistant_message, "I think you should add a task");
    }

    #[test]
    fn surrounding_commentary_is_ignored() {
        let raw = format!("Sure! Here you go:\n{LIST_PENDING}\nLet me know if that helps.");
        assert_eq!(parse_model_reply(&raw).action.name(), "list_tasks");
    }

    #[test]
    fn nested_objects_span_outermost() {
        let raw = r#"Plan: {"action":"generate_plan","params":{"daily_hours":2,"num_days":3},"assistant_message":"Here is {your} plan"}"#;
        let reply = parse_model_reply(raw);
        assert_eq!(
            reply.action,
            Action::GeneratePlan(PlanParams {
                daily_hours: Some(2.0),
                num_days: Some(3)
            })
        );
        assert_eq!(reply.assistant_message, "Here is {your} plan");
    }

    #[test]
    fn malformed_json_degrades_to_chat_with_raw_text() {
        let raw = r#"{"action": "create_task", "params": {"title": "broken"#;
        let reply = parse_model_reply(raw);
        assert_eq!(reply.action, Action::ChatOnly);
        assert_eq!(reply.assistant_message, raw);
    }

    #[test]
    fn two_separate_objects_fail_to_chat() {
        let raw = r#"{"action":"list_tasks"} and also {"action":"chat_only"}"#;
        let reply = parse_model_reply(raw);
        assert_eq!(reply.action, Action::ChatOnly);
        assert_eq!(reply.assistant_message, raw);
    }

    #[test]
    fn missing_fields_default() {
        let reply = parse_model_reply("{}");
        assert_eq!(reply.action, Action::ChatOnly);
        assert_eq!(reply.params, json!({}));
        assert_eq!(reply.assistant_message, "");
    }

    #[test]
    fn null_params_become_empty_object() {
        let reply = parse_model_reply(r#"{"action":"list_tasks","params":null,"assistant_message":"hi"}"#);
        assert_eq!(reply.action, Action::ListTasks(ListTasksParams::default()));
        assert_eq!(reply.params, json!({}));
    }

    #[test]
    fn non_string_action_is_chat_only() {
        let reply = parse_model_reply(r#"{"action": 5, "assistant_message": "hmm"}"#);
        assert_eq!(reply.action, Action::ChatOnly);
        assert_eq!(reply.assistant_message, "hmm");
    }

    #[test]
    fn reversed_braces_degrade() {
        let reply = parse_model_reply("} nothing here {");
        assert_eq!(reply.action, Action::ChatOnly);
        assert_eq!(reply.assistant_message, "} nothing here {");
    }

    #[test]
    fn empty_input_is_empty_chat() {
        let reply = parse_model_reply("   ");
        assert_eq!(reply, ParsedReply::chat_only(""));
    }

    #[test]
    fn strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("no fence"), "no fence");
    }

    #[test]
    fn json_candidate_spans_first_to_last_brace() {
        assert_eq!(json_candidate("x {\"a\": {\"b\": 1}} y"), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(json_candidate("no braces"), None);
    }
}
