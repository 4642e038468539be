//! Prompt assembly and graceful degradation around the model client.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::action::ParsedReply;
use crate::config::LlmConfig;
use crate::conversation::{ConversationTurn, render_history, truncate_history_by_chars};
use crate::llm::{GeminiClient, ModelClient};

/// Fixed instruction block placed ahead of every conversation.
pub const SYSTEM_PROMPT: &str = include_str!("../../Prompts/planner.md");

/// Outcome of a gateway call.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayReply {
    /// Raw text from the model, still to be parsed.
    Model(String),
    /// The model could not be reached; a ready-made chat reply explaining
    /// why and listing the manual commands.
    Fallback(ParsedReply),
}

/// Formats prompts, calls the model and never lets a model failure escape.
pub struct LlmGateway {
    client: Option<Arc<dyn ModelClient>>,
    unavailable_reason: String,
    history_char_budget: usize,
}

impl LlmGateway {
    /// Gateway over an existing client.
    pub fn new(client: Arc<dyn ModelClient>, history_char_budget: usize) -> Self {
        Self {
            client: Some(client),
            unavailable_reason: String::new(),
            history_char_budget,
        }
    }

    /// Gateway with no model; every call falls back with `reason`.
    pub fn unavailable(reason: impl Into<String>, history_char_budget: usize) -> Self {
        Self {
            client: None,
            unavailable_reason: reason.into(),
            history_char_budget,
        }
    }

    /// Build the Gemini-backed gateway described by `config`.
    ///
    /// A client that cannot be built (usually a missing API key) yields an
    /// unavailable gateway instead of an error.
    pub fn from_config(config: &LlmConfig) -> Self {
        match GeminiClient::new(config) {
            Ok(client) => Self::new(Arc::new(client), config.history_char_budget),
            Err(e) => {
                warn!("model client unavailable: {e}");
                Self::unavailable(e.to_string(), config.history_char_budget)
            }
        }
    }

    /// Whether a model client is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// The full prompt sent for `message` after `history`.
    #[must_use]
    pub fn build_prompt(&self, message: &str, history: &[ConversationTurn]) -> String {
        let kept = truncate_history_by_chars(history, self.history_char_budget);
        if kept.len() < history.len() {
            debug!(
                "history trimmed from {} to {} turns for prompt",
                history.len(),
                kept.len()
            );
        }
        format!(
            "{}\n\n{}User: {message}\nAssistant:",
            SYSTEM_PROMPT.trim_end(),
            render_history(kept)
        )
    }

    /// Ask the model about `message`. Never fails.
    pub fn complete(&self, message: &str, history: &[ConversationTurn]) -> GatewayReply {
        let Some(client) = &self.client else {
            return GatewayReply::Fallback(ParsedReply::chat_only(fallback_message(&format!(
                "LLM unavailable: {}",
                self.unavailable_reason
            ))));
        };

        let prompt = self.build_prompt(message, history);
        debug!("calling {} with {} prompt chars", client.name(), prompt.len());
        match client.generate(&prompt) {
            Ok(text) => GatewayReply::Model(text),
            Err(e) => {
                warn!("model call failed: {e}");
                GatewayReply::Fallback(ParsedReply::chat_only(fallback_message(&format!(
                    "LLM request failed: {e}"
                ))))
            }
        }
    }
}

/// Explanation shown when the model cannot answer, followed by the
/// commands that still work without it.
#[must_use]
pub fn fallback_message(headline: &str) -> String {
    format!(
        "{headline}\n\n\
         You can still use me with explicit commands like:\n\
         - add task: title=DBMS assignment, deadline=2025-11-25, hours=3, priority=high\n\
         - list tasks\n\
         - done 1\n\
         - plan: daily_hours=2 num_days=3\n"
    )
}
