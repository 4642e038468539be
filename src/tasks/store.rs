//! Task persistence.
//!
//! [`TaskStore`] is the read/write contract the dispatcher and scheduler
//! rely on. Read-modify-write sequences are not atomic across concurrent
//! callers: two updates to the same id race and the later write wins.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ChronoError, Result};
use crate::tasks::types::{NewTask, Task, TaskStatus};

/// Read/write access to the task list.
pub trait TaskStore: Send + Sync {
    /// Store a new pending task under the next free id.
    fn create(&self, task: NewTask) -> Result<Task>;

    /// All tasks in store order, optionally restricted to one status.
    fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>>;

    /// Set the status of `task_id`. Returns `false` (and writes nothing)
    /// when no such task exists.
    fn update_status(&self, task_id: u64, status: TaskStatus) -> Result<bool>;

    /// The id the next created task will receive.
    fn next_id(&self) -> Result<u64>;
}

/// Max existing id + 1, or 1 for an empty list.
#[must_use]
pub fn next_task_id(tasks: &[Task]) -> u64 {
    tasks.iter().map(|t| t.id).max().map_or(1, |max| max + 1)
}

fn filter_status(tasks: Vec<Task>, status: Option<TaskStatus>) -> Vec<Task> {
    match status {
        Some(status) => tasks.into_iter().filter(|t| t.status == status).collect(),
        None => tasks,
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Outcome of reading the task file.
#[derive(Debug, Default)]
struct Loaded {
    tasks: Vec<Task>,
    /// Records present in the file that could not be decoded.
    unreadable: usize,
}

/// Tasks persisted as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every task. A missing file is an empty list; so is a file that
    /// is not valid JSON at all, which is logged and left on disk until the
    /// next write replaces it.
    ///
    /// Records are decoded one at a time, so a single malformed record does
    /// not hide the others. Records that still cannot be decoded are counted
    /// in [`Loaded::unreadable`] and block writes.
    fn load(&self) -> Result<Loaded> {
        let bytes = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Loaded::default()),
            Err(e) => {
                return Err(ChronoError::Store(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let value = match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "task file {} is not valid JSON, treating as empty: {e}",
                    self.path.display()
                );
                return Ok(Loaded::default());
            }
        };

        let Value::Array(records) = value else {
            warn!("task file {} does not hold a task list", self.path.display());
            return Ok(Loaded {
                tasks: Vec::new(),
                unreadable: 1,
            });
        };

        let mut loaded = Loaded::default();
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Task>(record) {
                Ok(task) => loaded.tasks.push(task),
                Err(e) => {
                    warn!(
                        "skipping unreadable task record #{index} in {}: {e}",
                        self.path.display()
                    );
                    loaded.unreadable += 1;
                }
            }
        }
        Ok(loaded)
    }

    /// Load for a read-modify-write. Refuses when any record could not be
    /// decoded, since saving would drop it.
    fn load_for_write(&self) -> Result<Vec<Task>> {
        let loaded = self.load()?;
        if loaded.unreadable > 0 {
            return Err(ChronoError::Store(format!(
                "{} holds {} unreadable task records; refusing to overwrite",
                self.path.display(),
                loaded.unreadable
            )));
        }
        Ok(loaded.tasks)
    }

    fn save(&self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChronoError::Store(format!("cannot create task dir: {e}")))?;
        }

        let json = serde_json::to_string_pretty(tasks)?;
        std::fs::write(&self.path, json).map_err(|e| {
            ChronoError::Store(format!("cannot write {}: {e}", self.path.display()))
        })?;

        debug!("saved {} tasks to {}", tasks.len(), self.path.display());
        Ok(())
    }
}

impl TaskStore for JsonTaskStore {
    fn create(&self, task: NewTask) -> Result<Task> {
        let mut tasks = self.load_for_write()?;
        let created = task.into_task(next_task_id(&tasks));
        tasks.push(created.clone());
        self.save(&tasks)?;
        Ok(created)
    }

    fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        Ok(filter_status(self.load()?.tasks, status))
    }

    fn update_status(&self, task_id: u64, status: TaskStatus) -> Result<bool> {
        let mut tasks = self.load_for_write()?;
        let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
            return Ok(false);
        };
        task.status = status;
        self.save(&tasks)?;
        Ok(true)
    }

    fn next_id(&self) -> Result<u64> {
        Ok(next_task_id(&self.load()?.tasks))
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-process task list. Counts writes so callers can verify that a
/// read-only path really left the store alone.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
    writes: AtomicUsize,
}

impl MemoryTaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `tasks`.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of mutations applied since construction.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Snapshot of the current task list.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TaskStore for MemoryTaskStore {
    fn create(&self, task: NewTask) -> Result<Task> {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let created = task.into_task(next_task_id(&tasks));
        tasks.push(created.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        Ok(filter_status(self.snapshot(), status))
    }

    fn update_status(&self, task_id: u64, status: TaskStatus) -> Result<bool> {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
            return Ok(false);
        };
        task.status = status;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn next_id(&self) -> Result<u64> {
        Ok(next_task_id(
            &self.tasks.lock().unwrap_or_else(|e| e.into_inner()),
        ))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::tasks::types::Priority;
    use tempfile::TempDir;

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            deadline: "2099-01-01".into(),
            estimated_hours: 2.0,
            priority: Priority::High,
        }
    }

    fn temp_store() -> (TempDir, JsonTaskStore) {
        let tmp = TempDir::new().expect("tempdir");
        let store = JsonTaskStore::new(tmp.path().join("data").join("tasks.json"));
        (tmp, store)
    }

    #[test]
    fn next_task_id_empty_is_one() {
        assert_eq!(next_task_id(&[]), 1);
    }

    #[test]
    fn next_task_id_uses_max_not_len() {
        let tasks = vec![new_task("a").into_task(4), new_task("b").into_task(2)];
        assert_eq!(next_task_id(&tasks), 5);
    }

    #[test]
    fn missing_file_lists_empty() {
        let (_tmp, store) = temp_store();
        assert!(store.list(None).expect("list").is_empty());
        assert_eq!(store.next_id().expect("next id"), 1);
    }

    #[test]
    fn create_assigns_sequential_ids_and_persists() {
        let (_tmp, store) = temp_store();
        let a = store.create(new_task("Read chapter 3")).expect("create");
        let b = store.create(new_task("Problem set")).expect("create");
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(b.status, TaskStatus::Pending);

        let reopened = JsonTaskStore::new(store.path());
        let tasks = reopened.list(None).expect("list");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "Read chapter 3");
    }

    #[test]
    fn list_filters_by_status() {
        let (_tmp, store) = temp_store();
        store.create(new_task("a")).expect("create");
        store.create(new_task("b")).expect("create");
        assert!(store.update_status(2, TaskStatus::Done).expect("update"));

        let done = store.list(Some(TaskStatus::Done)).expect("list");
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, 2);
        let pending = store.list(Some(TaskStatus::Pending)).expect("list");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, 1);
    }

    #[test]
    fn update_unknown_id_does_not_write() {
        let (_tmp, store) = temp_store();
        let found = store.update_status(999, TaskStatus::Done).expect("update");
        assert!(!found);
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let (_tmp, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        std::fs::write(store.path(), "[{ not json").expect("write");
        assert!(store.list(None).expect("list").is_empty());

        let created = store.create(new_task("fresh start")).expect("create");
        assert_eq!(created.id, 1);
    }

    #[test]
    fn null_deadline_record_is_kept_and_ids_continue() {
        let (_tmp, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        std::fs::write(
            store.path(),
            r#"[{"id": 1, "title": "Thesis", "deadline": null, "estimated_hours": 5,
                 "priority": "high", "status": "pending"},
                {"id": "2", "title": "Lab", "deadline": "2030-02-01", "estimated_hours": "2.5",
                 "priority": "low", "status": "in_progress"}]"#,
        )
        .expect("write");

        let created = store.create(new_task("New")).expect("create");
        assert_eq!(created.id, 3);

        let tasks = store.list(None).expect("list");
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Thesis", "Lab", "New"]);
        assert_eq!(tasks[0].deadline, "2099-12-31");
        assert_eq!(tasks[1].id, 2);
        assert_eq!(tasks[1].status, TaskStatus::InProgress);
    }

    #[test]
    fn unreadable_record_blocks_writes_and_keeps_file() {
        let (_tmp, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        let original = r#"[{"id": 1, "title": "Thesis", "deadline": "2030-01-01", "estimated_hours": 5},
            {"title": "no id here"}]"#;
        std::fs::write(store.path(), original).expect("write");

        let tasks = store.list(None).expect("list");
        assert_eq!(tasks.len(), 1);
        assert_eq!(store.next_id().expect("next id"), 2);

        let err = store.create(new_task("New")).expect_err("create must refuse");
        assert!(matches!(err, ChronoError::Store(_)));
        assert!(store.update_status(1, TaskStatus::Done).is_err());
        assert_eq!(std::fs::read_to_string(store.path()).expect("read"), original);
    }

    #[test]
    fn non_list_json_blocks_writes() {
        let (_tmp, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().expect("parent")).expect("mkdir");
        std::fs::write(store.path(), r#"{"tasks": []}"#).expect("write");
        assert!(store.list(None).expect("list").is_empty());
        assert!(store.create(new_task("New")).is_err());
    }

    #[test]
    fn memory_store_counts_writes() {
        let store = MemoryTaskStore::new();
        store.create(new_task("a")).expect("create");
        assert_eq!(store.write_count(), 1);
        assert!(!store.update_status(42, TaskStatus::Done).expect("update"));
        assert_eq!(store.write_count(), 1);
        assert!(store.update_status(1, TaskStatus::InProgress).expect("update"));
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.snapshot()[0].status, TaskStatus::InProgress);
    }
}
