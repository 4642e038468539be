//! Structured actions: typed records, model-reply parsing and the manual
//! command grammar used while the model is offline.

pub mod commands;
pub mod parser;
pub mod types;

pub use commands::{MANUAL_COMMAND_NOTICE, parse_manual_command};
pub use parser::{ParsedReply, parse_model_reply};
pub use types::{
    Action, CreateTaskParams, DEFAULT_DEADLINE, DEFAULT_ESTIMATED_HOURS, DEFAULT_TITLE, ListTasksParams,
    PlanParams, StatusParam, UpdateStatusParams,
};
