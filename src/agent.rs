//! The conversational entry point.
//!
//! [`PlannerAgent`] wires the response caches, the model gateway, the reply
//! parser and the dispatcher into one pipeline:
//!
//! ```text
//! (message, history) -> cache lookup -> gateway -> parser -> dispatcher -> cache store
//! ```
//!
//! Caches are constructed by the caller and shared through `Arc`, so several
//! agents (or a server and a CLI) can see the same entries.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::action::{ParsedReply, parse_manual_command, parse_model_reply};
use crate::cache::{RecencyCache, TtlCache, history_cache_key};
use crate::config::ChronoConfig;
use crate::conversation::ConversationTurn;
use crate::dispatcher::{Dispatcher, ProcessResult};
use crate::llm::{GatewayReply, LlmGateway};
use crate::tasks::{JsonTaskStore, TaskStore};

/// History turns folded into the response cache key by default.
pub const DEFAULT_KEY_TURNS: usize = 6;

/// Reply used when the worker running a request dies.
const WORKER_FAILED_REPLY: &str = "Sorry, something went wrong while handling that message. Please try again.";

/// Cache for final replies, keyed by message and recent history.
pub type ResponseCache = TtlCache<String, String>;

/// Cache for raw replies served by the streaming path.
pub type ReplyCache = RecencyCache<String, String>;

/// Message-in, reply-out pipeline over a model and a task store.
pub struct PlannerAgent {
    gateway: LlmGateway,
    dispatcher: Dispatcher,
    responses: Arc<ResponseCache>,
    recent: Arc<ReplyCache>,
    key_turns: usize,
}

impl PlannerAgent {
    /// Assemble an agent from its parts.
    pub fn new(
        gateway: LlmGateway,
        dispatcher: Dispatcher,
        responses: Arc<ResponseCache>,
        recent: Arc<ReplyCache>,
    ) -> Self {
        Self {
            gateway,
            dispatcher,
            responses,
            recent,
            key_turns: DEFAULT_KEY_TURNS,
        }
    }

    /// Number of trailing history turns that make up the cache key.
    #[must_use]
    pub fn with_key_turns(mut self, turns: usize) -> Self {
        self.key_turns = turns;
        self
    }

    /// Build the agent described by `config`: Gemini gateway, JSON task
    /// file and fresh caches.
    pub fn from_config(config: &ChronoConfig) -> Self {
        let store: Arc<dyn TaskStore> = Arc::new(JsonTaskStore::new(&config.store.tasks_path));
        let dispatcher = Dispatcher::new(store, config.planner.clone());
        let responses = Arc::new(ResponseCache::new(Duration::from_secs(
            config.cache.response_ttl_secs,
        )));
        let recent = Arc::new(ReplyCache::new(config.cache.recency_capacity));

        Self::new(LlmGateway::from_config(&config.llm), dispatcher, responses, recent)
            .with_key_turns(config.cache.key_history_turns)
    }

    /// Whether replies come from the model rather than the fallback.
    #[must_use]
    pub fn model_available(&self) -> bool {
        self.gateway.is_available()
    }

    /// The task store actions run against.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TaskStore> {
        self.dispatcher.store()
    }

    /// Handle one message and return the full structured result.
    ///
    /// Never fails; every problem ends up as text in the reply.
    pub fn process(&self, message: &str, history: &[ConversationTurn]) -> ProcessResult {
        self.run(message, history).0
    }

    /// The pipeline proper. The flag is true when the reply came from the
    /// model, directly or through the response cache, and false for
    /// fallback replies.
    fn run(&self, message: &str, history: &[ConversationTurn]) -> (ProcessResult, bool) {
        let key = history_cache_key(message, history, self.key_turns);
        if let Some(reply) = self.responses.get(&key) {
            debug!("response cache hit");
            let mut result = ProcessResult::chat(reply);
            result.cached = true;
            return (result, true);
        }
        debug!("response cache miss");

        let (parsed, from_model) = match self.gateway.complete(message, history) {
            GatewayReply::Model(text) => (parse_model_reply(&text), true),
            GatewayReply::Fallback(fallback) => (manual_or_fallback(message, fallback), false),
        };

        let result = self.dispatcher.dispatch(parsed);
        if from_model && let Err(e) = self.responses.set(key, result.assistant_message.clone()) {
            debug!("response not cached: {e}");
        }
        (result, from_model)
    }

    /// Handle one message and return only the reply text.
    pub fn handle(&self, message: &str, history: &[ConversationTurn]) -> String {
        self.process(message, history).assistant_message
    }

    /// [`handle`](Self::handle) on the blocking thread pool, so async
    /// callers are not stalled by the model round trip.
    pub async fn handle_async(self: Arc<Self>, message: String, history: Vec<ConversationTurn>) -> String {
        match tokio::task::spawn_blocking(move || self.handle(&message, &history)).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("request worker failed: {e}");
                WORKER_FAILED_REPLY.to_owned()
            }
        }
    }

    /// The reply in chunks of at most `chunk_chars` characters.
    ///
    /// Always runs the pipeline, so the response cache and the task store
    /// decide the answer. Model-backed replies are also remembered in the
    /// recency cache, readable through [`recent_reply`](Self::recent_reply).
    pub fn stream_reply(
        &self,
        message: &str,
        history: &[ConversationTurn],
        chunk_chars: usize,
    ) -> std::vec::IntoIter<String> {
        let (result, from_model) = self.run(message, history);
        let reply = result.assistant_message;
        if from_model {
            let key = history_cache_key(message, history, self.key_turns);
            if let Err(e) = self.recent.set(key, reply.clone()) {
                debug!("reply not remembered: {e}");
            }
        }
        chunk_text(&reply, chunk_chars).into_iter()
    }

    /// The last model-backed reply streamed for this message and history.
    #[must_use]
    pub fn recent_reply(&self, message: &str, history: &[ConversationTurn]) -> Option<String> {
        self.recent.get(&history_cache_key(message, history, self.key_turns))
    }
}

fn manual_or_fallback(message: &str, fallback: ParsedReply) -> ParsedReply {
    match parse_manual_command(message) {
        Some(command) => {
            debug!("running manual {} command", command.action.name());
            command
        }
        None => fallback,
    }
}

/// Split `text` into pieces of at most `chunk_chars` characters.
fn chunk_text(text: &str, chunk_chars: usize) -> Vec<String> {
    let size = chunk_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}
