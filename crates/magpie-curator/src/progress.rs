//! Live status of the in-flight run.
//!
//! A single overwrite-in-place cell, not a log: pollers always see the most
//! recent run's state and nothing older. The orchestrator owns the writes;
//! everyone else reads snapshots through the handle.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Sentinel task covering session acquisition, before any profile work.
pub const TASK_INITIALIZING: &str = "initializing";

/// Sentinel task covering selection and persistence, after all profiles.
pub const TASK_DONE: &str = "done";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Done,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// One profile's (or sentinel's) entry within a run.
#[derive(Debug, Clone, Serialize)]
pub struct TaskEntry {
    pub handle: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunProgress {
    pub status: ProgressStatus,
    pub total_profiles: usize,
    pub tasks: Vec<TaskEntry>,
    pub curated_count: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunProgress {
    fn idle() -> Self {
        Self {
            status: ProgressStatus::Idle,
            total_profiles: 0,
            tasks: Vec::new(),
            curated_count: 0,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }
}

/// Cloneable handle to the process-wide progress cell.
#[derive(Clone)]
pub struct ProgressHandle {
    inner: Arc<Mutex<RunProgress>>,
}

impl Default for ProgressHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RunProgress::idle())),
        }
    }

    /// Starts tracking a fresh run: one pending task per profile handle,
    /// bracketed by the two sentinel tasks, with the leading sentinel
    /// already marked processing.
    pub fn init(&self, handles: &[String]) {
        let mut tasks = Vec::with_capacity(handles.len() + 2);
        tasks.push(TaskEntry {
            handle: TASK_INITIALIZING.to_owned(),
            status: TaskStatus::Processing,
            message: None,
        });
        for handle in handles {
            tasks.push(TaskEntry {
                handle: handle.clone(),
                status: TaskStatus::Pending,
                message: None,
            });
        }
        tasks.push(TaskEntry {
            handle: TASK_DONE.to_owned(),
            status: TaskStatus::Pending,
            message: None,
        });

        *self.lock() = RunProgress {
            status: ProgressStatus::Running,
            total_profiles: handles.len(),
            tasks,
            curated_count: 0,
            started_at: Some(Utc::now()),
            finished_at: None,
            error: None,
        };
    }

    /// Updates the task matching `handle`. Unknown handles are a no-op, not
    /// an error.
    pub fn update_task(&self, handle: &str, status: TaskStatus, message: Option<String>) {
        let mut progress = self.lock();
        if let Some(task) = progress.tasks.iter_mut().find(|t| t.handle == handle) {
            task.status = status;
            if message.is_some() {
                task.message = message;
            }
        }
    }

    pub fn increment_curated(&self, count: usize) {
        self.lock().curated_count += count;
    }

    /// Marks the run terminal: failed when `error` is present, completed
    /// otherwise.
    pub fn complete(&self, error: Option<String>) {
        let mut progress = self.lock();
        progress.status = if error.is_some() {
            ProgressStatus::Failed
        } else {
            ProgressStatus::Completed
        };
        progress.finished_at = Some(Utc::now());
        if error.is_some() {
            progress.error = error;
        }
    }

    /// Returns the cell to idle. Callers do this after they have shown the
    /// terminal state.
    pub fn reset(&self) {
        *self.lock() = RunProgress::idle();
    }

    #[must_use]
    pub fn snapshot(&self) -> RunProgress {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RunProgress> {
        // Poisoning only follows a panic elsewhere; the cell stays usable.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn starts_idle() {
        let progress = ProgressHandle::new();
        assert_eq!(progress.snapshot().status, ProgressStatus::Idle);
        assert!(progress.snapshot().tasks.is_empty());
    }

    #[test]
    fn init_brackets_profiles_with_sentinels() {
        let progress = ProgressHandle::new();
        progress.init(&handles(&["a", "b"]));

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.status, ProgressStatus::Running);
        assert_eq!(snapshot.total_profiles, 2);
        assert_eq!(snapshot.tasks.len(), 4);
        assert_eq!(snapshot.tasks[0].handle, TASK_INITIALIZING);
        assert_eq!(snapshot.tasks[0].status, TaskStatus::Processing);
        assert_eq!(snapshot.tasks[1].handle, "a");
        assert_eq!(snapshot.tasks[1].status, TaskStatus::Pending);
        assert_eq!(snapshot.tasks[2].handle, "b");
        assert_eq!(snapshot.tasks[2].status, TaskStatus::Pending);
        assert_eq!(snapshot.tasks[3].handle, TASK_DONE);
        assert_eq!(snapshot.tasks[3].status, TaskStatus::Pending);
        assert!(snapshot.started_at.is_some());
    }

    #[test]
    fn update_task_mutates_only_the_matching_entry() {
        let progress = ProgressHandle::new();
        progress.init(&handles(&["a", "b"]));
        progress.update_task("a", TaskStatus::Done, Some("Found 3 candidates".into()));

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.tasks[1].status, TaskStatus::Done);
        assert_eq!(snapshot.tasks[1].message.as_deref(), Some("Found 3 candidates"));
        assert_eq!(snapshot.tasks[2].status, TaskStatus::Pending);
    }

    #[test]
    fn update_task_with_unknown_handle_is_a_noop() {
        let progress = ProgressHandle::new();
        progress.init(&handles(&["a", "b"]));
        let before = progress.snapshot();

        progress.update_task("c", TaskStatus::Done, None);

        let after = progress.snapshot();
        for (b, a) in before.tasks.iter().zip(after.tasks.iter()) {
            assert_eq!(b.status, a.status, "task {} changed", b.handle);
        }
    }

    #[test]
    fn update_without_message_keeps_previous_message() {
        let progress = ProgressHandle::new();
        progress.init(&handles(&["a"]));
        progress.update_task("a", TaskStatus::Failed, Some("feed missing".into()));
        progress.update_task("a", TaskStatus::Done, None);

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.tasks[1].message.as_deref(), Some("feed missing"));
    }

    #[test]
    fn complete_without_error_is_completed() {
        let progress = ProgressHandle::new();
        progress.init(&handles(&["a"]));
        progress.complete(None);

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.status, ProgressStatus::Completed);
        assert!(snapshot.finished_at.is_some());
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn complete_with_error_is_failed() {
        let progress = ProgressHandle::new();
        progress.init(&handles(&["a"]));
        progress.complete(Some("browser crashed".into()));

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.status, ProgressStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("browser crashed"));
    }

    #[test]
    fn increment_accumulates() {
        let progress = ProgressHandle::new();
        progress.init(&handles(&["a"]));
        progress.increment_curated(4);
        progress.increment_curated(2);
        assert_eq!(progress.snapshot().curated_count, 6);
    }

    #[test]
    fn reset_returns_to_idle_from_any_state() {
        let progress = ProgressHandle::new();
        progress.init(&handles(&["a"]));
        progress.complete(Some("boom".into()));
        progress.reset();

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.status, ProgressStatus::Idle);
        assert!(snapshot.tasks.is_empty());
        assert_eq!(snapshot.curated_count, 0);
        assert!(snapshot.error.is_none());
    }
}
