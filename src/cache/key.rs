//! Deterministic cache keys for (message, recent history) pairs.

use sha2::{Digest, Sha256};

use crate::conversation::ConversationTurn;

/// SHA-256 hex digest of the message plus the last `turns` history turns.
///
/// The hashed text is `message || user->assistant::user->assistant...`, so
/// the same message in a different recent context gets a different key
/// while turns older than the window do not affect it.
#[must_use]
pub fn history_cache_key(message: &str, history: &[ConversationTurn], turns: usize) -> String {
    let recent = &history[history.len().saturating_sub(turns)..];
    let joined = recent
        .iter()
        .map(|t| format!("{}->{}", t.user, t.assistant))
        .collect::<Vec<_>>()
        .join("::");

    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    hasher.update(b"||");
    hasher.update(joined.as_bytes());
    let digest = hasher.finalize();
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(n: usize) -> Vec<ConversationTurn> {
        (0..n)
            .map(|i| ConversationTurn::new(format!("u{i}"), format!("a{i}")))
            .collect()
    }

    #[test]
    fn key_is_deterministic() {
        let history = turns(3);
        assert_eq!(
            history_cache_key("list tasks", &history, 6),
            history_cache_key("list tasks", &history, 6)
        );
    }

    #[test]
    fn key_is_sha256_hex() {
        let key = history_cache_key("hi", &[], 6);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn key_differs_by_message() {
        let history = turns(2);
        assert_ne!(
            history_cache_key("list tasks", &history, 6),
            history_cache_key("make a plan", &history, 6)
        );
    }

    #[test]
    fn key_differs_by_recent_history() {
        let mut other = turns(2);
        other[1].assistant = "something else".into();
        assert_ne!(
            history_cache_key("list tasks", &turns(2), 6),
            history_cache_key("list tasks", &other, 6)
        );
    }

    #[test]
    fn turns_outside_window_are_ignored() {
        let long = turns(10);
        let mut changed = long.clone();
        changed[0].user = "ancient".into();
        assert_eq!(
            history_cache_key("plan", &long, 6),
            history_cache_key("plan", &changed, 6)
        );
    }
}
