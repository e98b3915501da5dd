//! In-memory task list for one session.
//!
//! Insertion order is display order. Duplicates are allowed; every entry gets
//! its own [`TaskId`] so callers that hold an id can remove exactly the entry
//! they added.

use tracing::debug;

use crate::task::{Task, TaskId};

#[derive(Debug, Clone)]
struct Entry {
    id: TaskId,
    task: Task,
}

/// Ordered, session-scoped collection of tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    entries: Vec<Entry>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(tasks: Vec<Task>) -> Self {
        let mut store = Self::new();
        store.replace_all(tasks);
        store
    }

    /// Append a task and return the handle for the new entry.
    pub fn add_in_list(&mut self, task: Task) -> TaskId {
        let id = TaskId::new();
        debug!(%id, task = %task.task, "task added");
        self.entries.push(Entry { id, task });
        id
    }

    /// Remove the first entry structurally equal to `task`.
    ///
    /// Returns `false` and leaves the list untouched when nothing matches.
    pub fn remove_from_list(&mut self, task: &Task) -> bool {
        match self.entries.iter().position(|entry| entry.task == *task) {
            Some(idx) => {
                let entry = self.entries.remove(idx);
                debug!(id = %entry.id, task = %entry.task.task, "task removed");
                true
            }
            None => false,
        }
    }

    /// Remove the entry with the given handle.
    pub fn remove_by_id(&mut self, id: TaskId) -> Option<Task> {
        let idx = self.entries.iter().position(|entry| entry.id == id)?;
        let entry = self.entries.remove(idx);
        debug!(%id, task = %entry.task.task, "task removed");
        Some(entry.task)
    }

    /// Ordered snapshot of every task, as persisted.
    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.entries.iter().map(|entry| entry.task.clone()).collect()
    }

    /// Replace the whole list in one step, returning the new handles in order.
    pub fn replace_all(&mut self, tasks: Vec<Task>) -> Vec<TaskId> {
        self.entries = tasks
            .into_iter()
            .map(|task| Entry {
                id: TaskId::new(),
                task,
            })
            .collect();
        debug!(count = self.entries.len(), "task list replaced");
        self.entries.iter().map(|entry| entry.id).collect()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.task)
    }

    pub fn contains_id(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.entries.iter().map(|entry| (entry.id, &entry.task))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
