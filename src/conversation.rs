//! Conversation history handling.
//!
//! History is owned by the caller and passed in with every message; this
//! module only trims and renders it.

use serde::{Deserialize, Serialize};

/// One user message and the assistant reply that followed it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// What the user said.
    #[serde(default)]
    pub user: String,
    /// What the assistant answered.
    #[serde(default)]
    pub assistant: String,
}

impl ConversationTurn {
    /// Create a turn from a user message and its reply.
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }

    /// Character count of both sides of the turn.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.user.chars().count() + self.assistant.chars().count()
    }
}

/// Drop the oldest turns until the combined character count of the rest is
/// within `max_chars`. Order of the kept turns is preserved.
#[must_use]
pub fn truncate_history_by_chars(history: &[ConversationTurn], max_chars: usize) -> &[ConversationTurn] {
    let mut total: usize = history.iter().map(ConversationTurn::char_len).sum();
    let mut start = 0;
    while start < history.len() && total > max_chars {
        total -= history[start].char_len();
        start += 1;
    }
    &history[start..]
}

/// Render turns as alternating `User:` / `Assistant:` lines.
#[must_use]
pub fn render_history(history: &[ConversationTurn]) -> String {
    let mut out = String::new();
    for turn in history {
        out.push_str(&format!("User: {}\nAssistant: {}\n", turn.user, turn.assistant));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(user: &str, assistant: &str) -> ConversationTurn {
        ConversationTurn::new(user, assistant)
    }

    #[test]
    fn under_budget_keeps_everything() {
        let history = vec![turn("hi", "hello"), turn("plan", "ok")];
        assert_eq!(truncate_history_by_chars(&history, 4000), history.as_slice());
    }

    #[test]
    fn drops_oldest_first() {
        let history = vec![
            turn("aaaaa", "aaaaa"),
            turn("bbbbb", "bbbbb"),
            turn("ccccc", "ccccc"),
        ];
        let kept = truncate_history_by_chars(&history, 20);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].user, "bbbbb");
        assert_eq!(kept[1].user, "ccccc");
    }

    #[test]
    fn exact_budget_is_kept() {
        let history = vec![turn("12345", "12345")];
        assert_eq!(truncate_history_by_chars(&history, 10).len(), 1);
        assert!(truncate_history_by_chars(&history, 9).is_empty());
    }

    #[test]
    fn counts_chars_not_bytes() {
        let history = vec![turn("héllo", "wörld")];
        assert_eq!(history[0].char_len(), 10);
        assert_eq!(truncate_history_by_chars(&history, 10).len(), 1);
    }

    #[test]
    fn empty_history_renders_empty() {
        assert!(render_history(&[]).is_empty());
        assert!(truncate_history_by_chars(&[], 0).is_empty());
    }

    #[test]
    fn render_alternates_roles() {
        let rendered = render_history(&[turn("add essay", "Done!")]);
        assert_eq!(rendered, "User: add essay\nAssistant: Done!\n");
    }
}
