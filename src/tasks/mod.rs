//! Task records and the stores that own them.
//!
//! The planning core only needs the [`TaskStore`] read/write contract;
//! [`JsonTaskStore`] persists to a JSON file and [`MemoryTaskStore`] keeps
//! everything in-process.

pub mod store;
pub mod types;

pub use store::{JsonTaskStore, MemoryTaskStore, TaskStore, next_task_id};
pub use types::{NewTask, Priority, Task, TaskStatus};
