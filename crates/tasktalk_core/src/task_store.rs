use crate::due::normalize_due;
use crate::error::AppError;
use crate::model::{Task, TaskDraft};
use crate::storage::json_store::{self, TaskState};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How a task is picked for completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(u64),
    /// Case-insensitive substring of the description.
    Fragment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompleteOutcome {
    Completed(Task),
    AlreadyCompleted(Task),
    NotFound,
}

impl CompleteOutcome {
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// The in-memory task list, flushed to disk after every mutation.
#[derive(Debug)]
pub struct TaskStore {
    path: Option<PathBuf>,
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Loads the store at `path`, starting empty when the file is missing or unreadable.
    pub fn open(path: &Path) -> Self {
        let tasks = match json_store::load_state(path) {
            Ok(state) => state.tasks,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "task store unreadable, starting empty"
                );
                Vec::new()
            }
        };
        debug!(path = %path.display(), count = tasks.len(), "task store loaded");

        Self {
            path: Some(path.to_path_buf()),
            tasks,
        }
    }

    /// A store without a backing file; `flush` does nothing.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tasks: Vec::new(),
        }
    }

    /// `None` once the largest id in the store is `u64::MAX`.
    pub fn next_id(&self) -> Option<u64> {
        self.tasks
            .iter()
            .map(|task| task.id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn list_by_category(&self, category: &str) -> Vec<&Task> {
        let wanted = category.trim();
        self.tasks
            .iter()
            .filter(|task| {
                task.category
                    .as_deref()
                    .is_some_and(|value| value.trim().eq_ignore_ascii_case(wanted))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Appends a new task and flushes.
    ///
    /// A failed flush leaves the task in memory and returns the error.
    pub fn add(&mut self, draft: TaskDraft) -> Result<Task, AppError> {
        let description = draft.description.trim();
        if description.is_empty() {
            return Err(AppError::invalid_input("description is required"));
        }
        let id = self
            .next_id()
            .ok_or_else(|| AppError::invalid_data("task id space exhausted"))?;

        let task = Task {
            id,
            description: description.to_string(),
            due_date: draft.due_date.as_deref().and_then(normalize_due),
            completed: false,
            category: draft
                .category
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        };

        self.tasks.push(task.clone());
        debug!(id = task.id, "task added");
        self.flush()?;

        Ok(task)
    }

    /// Marks the first task matching `selector` as completed.
    ///
    /// Writes only when a task actually transitions to completed.
    pub fn complete(&mut self, selector: &Selector) -> Result<CompleteOutcome, AppError> {
        let position = match selector {
            Selector::Id(id) => self.tasks.iter().position(|task| task.id == *id),
            Selector::Fragment(fragment) => {
                let needle = fragment.trim().to_lowercase();
                if needle.is_empty() {
                    None
                } else {
                    self.tasks
                        .iter()
                        .position(|task| task.description.to_lowercase().contains(&needle))
                }
            }
        };

        let Some(index) = position else {
            return Ok(CompleteOutcome::NotFound);
        };

        let task = &mut self.tasks[index];
        if task.completed {
            return Ok(CompleteOutcome::AlreadyCompleted(task.clone()));
        }

        task.completed = true;
        let completed = task.clone();
        debug!(id = completed.id, "task completed");
        self.flush()?;

        Ok(CompleteOutcome::Completed(completed))
    }

    /// Writes the whole in-memory state to the backing file.
    pub fn flush(&self) -> Result<(), AppError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let state = TaskState {
            tasks: self.tasks.clone(),
        };
        json_store::save_state(path, &state).inspect_err(|err| {
            warn!(path = %path.display(), error = %err, "failed to flush task store");
        })
    }
}
