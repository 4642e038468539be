//! Chronoken: a conversational study planner.
//!
//! Free-text requests go to a language model that answers with one of a
//! small set of structured actions; the action runs against a task store
//! and the reply comes back with the results appended.
//!
//! # Architecture
//!
//! - **Tasks**: task records and the [`TaskStore`] contract (JSON file or
//!   in-memory)
//! - **Cache**: a TTL cache for final replies and a bounded recency cache
//!   for the streaming path
//! - **LLM**: prompt assembly and the Gemini client, degrading to a
//!   fallback reply when the model is unreachable
//! - **Action**: tolerant extraction of a typed [`Action`] from model text,
//!   plus the manual command grammar
//! - **Dispatcher**: executes one action and composes the reply
//! - **Planner**: the greedy multi-day study-plan scheduler
//! - **Agent**: [`PlannerAgent`], the pipeline tying it all together

pub mod action;
pub mod agent;
pub mod cache;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod error;
pub mod llm;
pub mod planner;
pub mod tasks;

pub use action::{Action, ParsedReply, parse_model_reply};
pub use agent::PlannerAgent;
pub use config::ChronoConfig;
pub use conversation::ConversationTurn;
pub use dispatcher::{Dispatcher, ProcessResult};
pub use error::{ChronoError, Result};
pub use llm::{LlmGateway, ModelClient};
pub use planner::{Plan, PlanSlot, generate_plan};
pub use tasks::{JsonTaskStore, MemoryTaskStore, Task, TaskStore};
