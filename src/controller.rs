//! Form controller: wires save/edit/delete on rendered forms to the task
//! store and its persisted copy.
//!
//! Every handler runs to completion before returning, so the store and the
//! persisted entry agree between two user actions. The one exception is
//! edit, which only touches memory until the next save or delete.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::form::{Form, FormField, FormId, FormState};
use crate::storage::{KeyValueStorage, PersistenceAdapter};
use crate::store::TaskStore;
use crate::task::{Task, TaskId};

/// Prompt shown before a form is deleted
pub const DEFAULT_CONFIRM_MESSAGE: &str = "Delete for sure?";

/// Blocking yes/no prompt.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Result of a form action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Task added to the store and persisted; form is now committed.
    Saved(TaskId),
    /// Task taken out of the store; form is now editable.
    Editing,
    /// Form removed and the list persisted.
    Deleted,
    /// Delete declined at the prompt.
    Cancelled,
    /// Inputs did not form a valid task.
    Rejected,
    /// Action not offered in the form's current state.
    Unchanged,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Saved(_) => "saved",
            Outcome::Editing => "editing",
            Outcome::Deleted => "deleted",
            Outcome::Cancelled => "cancelled",
            Outcome::Rejected => "rejected",
            Outcome::Unchanged => "unchanged",
        }
    }
}

/// Owns the session's task store, its persistence, and the rendered forms.
#[derive(Debug)]
pub struct FormController<S> {
    store: TaskStore,
    persistence: PersistenceAdapter<S>,
    forms: Vec<Form>,
    next_form: u64,
    confirm_message: String,
}

impl<S: KeyValueStorage> FormController<S> {
    pub fn new(persistence: PersistenceAdapter<S>) -> Self {
        Self {
            store: TaskStore::new(),
            persistence,
            forms: Vec::new(),
            next_form: 1,
            confirm_message: DEFAULT_CONFIRM_MESSAGE.to_string(),
        }
    }

    pub fn with_confirm_message(mut self, message: impl Into<String>) -> Self {
        self.confirm_message = message.into();
        self
    }

    pub fn confirm_message(&self) -> &str {
        &self.confirm_message
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn persistence(&self) -> &PersistenceAdapter<S> {
        &self.persistence
    }

    /// Rendered forms in display order.
    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    pub fn form(&self, id: FormId) -> Option<&Form> {
        self.forms.iter().find(|form| form.id() == id)
    }

    /// First committed form showing exactly `task`.
    pub fn find_committed(&self, task: &Task) -> Option<FormId> {
        self.forms
            .iter()
            .find(|form| {
                form.state() == FormState::Committed && form.fields().to_task().as_ref() == Some(task)
            })
            .map(Form::id)
    }

    /// Append a blank, editable form.
    pub fn create_form(&mut self) -> FormId {
        let id = self.allocate_form_id();
        self.forms.push(Form::new(id));
        debug!(form = %id, "form created");
        id
    }

    /// Append a committed form showing a task already held by the store.
    pub fn render(&mut self, task: &Task, task_id: TaskId) -> FormId {
        let id = self.allocate_form_id();
        self.forms.push(Form::committed(id, task, task_id));
        id
    }

    /// Remove every rendered form. The store is left alone.
    pub fn clear_forms(&mut self) {
        self.forms.clear();
    }

    /// Update one input of a form. Returns `false` if the inputs are disabled.
    pub fn set_field(
        &mut self,
        id: FormId,
        field: FormField,
        value: impl Into<String>,
    ) -> Result<bool> {
        let accepted = self.form_mut(id)?.set_field(field, value);
        if !accepted {
            debug!(form = %id, field = field.name(), "input ignored: form is committed");
        }
        Ok(accepted)
    }

    /// Save click: commit the form's task and persist the whole list.
    pub fn save(&mut self, id: FormId) -> Result<Outcome> {
        let form = self.form_ref(id)?;
        let Some(next) = form.state().on_save() else {
            return Ok(Outcome::Unchanged);
        };
        let Some(task) = form.fields().to_task() else {
            debug!(form = %id, "save rejected: invalid fields");
            return Ok(Outcome::Rejected);
        };

        let task_id = self.store.add_in_list(task);
        if let Err(err) = self.persist() {
            self.store.remove_by_id(task_id);
            return Err(err);
        }

        let form = self.form_mut(id)?;
        form.set_task_id(Some(task_id));
        form.set_state(next);
        info!(form = %id, task = %task_id, "task saved");
        Ok(Outcome::Saved(task_id))
    }

    /// Edit click: take the form's task out of the store and unlock the inputs.
    ///
    /// Nothing is persisted here; the stored copy still holds the task until
    /// the next save or delete rewrites the list.
    pub fn edit(&mut self, id: FormId) -> Result<Outcome> {
        let form = self.form_ref(id)?;
        let Some(next) = form.state().on_edit() else {
            return Ok(Outcome::Unchanged);
        };
        let Some(task) = form.fields().to_task() else {
            debug!(form = %id, "edit rejected: invalid fields");
            return Ok(Outcome::Rejected);
        };
        let task_id = form.task_id();

        let removed = match task_id {
            Some(task_id) => self.store.remove_by_id(task_id).is_some(),
            None => false,
        };
        if !removed {
            self.store.remove_from_list(&task);
        }

        let form = self.form_mut(id)?;
        form.set_task_id(None);
        form.set_state(next);
        debug!(form = %id, "form unlocked for editing");
        Ok(Outcome::Editing)
    }

    /// Delete click: after confirmation, drop the form and its task, then
    /// persist. Declining leaves everything untouched.
    pub fn delete<C>(&mut self, id: FormId, confirm: &mut C) -> Result<Outcome>
    where
        C: Confirm + ?Sized,
    {
        let idx = self.form_index(id)?;
        if !confirm.confirm(&self.confirm_message) {
            debug!(form = %id, "delete cancelled");
            return Ok(Outcome::Cancelled);
        }

        // Write the shortened list first so a failed write leaves memory as is.
        let task_id = self.forms[idx].task_id();
        let remaining: Vec<Task> = self
            .store
            .iter()
            .filter(|(entry_id, _)| Some(*entry_id) != task_id)
            .map(|(_, task)| task.clone())
            .collect();
        self.persistence.store(&remaining)?;

        self.forms.remove(idx);
        if let Some(task_id) = task_id {
            self.store.remove_by_id(task_id);
        }
        info!(form = %id, "form deleted");
        Ok(Outcome::Deleted)
    }

    /// Write the current list to storage.
    pub fn persist(&mut self) -> Result<()> {
        let tasks = self.store.get_all_tasks();
        self.persistence.store(&tasks)
    }

    pub(crate) fn load_persisted(&self) -> Result<Vec<Task>> {
        self.persistence.load()
    }

    pub(crate) fn replace_store(&mut self, tasks: Vec<Task>) -> Vec<TaskId> {
        self.store.replace_all(tasks)
    }

    fn allocate_form_id(&mut self) -> FormId {
        let id = FormId(self.next_form);
        self.next_form += 1;
        id
    }

    fn form_index(&self, id: FormId) -> Result<usize> {
        self.forms
            .iter()
            .position(|form| form.id() == id)
            .ok_or_else(|| Error::FormNotFound(id.to_string()))
    }

    fn form_ref(&self, id: FormId) -> Result<&Form> {
        let idx = self.form_index(id)?;
        Ok(&self.forms[idx])
    }

    fn form_mut(&mut self, id: FormId) -> Result<&mut Form> {
        let idx = self.form_index(id)?;
        Ok(&mut self.forms[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::task::Priority;
    use std::cell::Cell;
    use std::rc::Rc;

    fn controller() -> FormController<MemoryStorage> {
        FormController::new(PersistenceAdapter::new(MemoryStorage::new()))
    }

    fn fill(
        controller: &mut FormController<MemoryStorage>,
        id: FormId,
        task: &str,
        due: &str,
        priority: &str,
    ) {
        controller.set_field(id, FormField::Task, task).unwrap();
        controller.set_field(id, FormField::DueDate, due).unwrap();
        controller.set_field(id, FormField::Priority, priority).unwrap();
    }

    fn yes(_: &str) -> bool {
        true
    }

    fn no(_: &str) -> bool {
        false
    }

    #[test]
    fn save_commits_and_persists() {
        let mut controller = controller();
        let id = controller.create_form();
        fill(&mut controller, id, "Clean", "2024-02-02T09:00", "Low");

        let outcome = controller.save(id).unwrap();

        assert!(matches!(outcome, Outcome::Saved(_)));
        assert_eq!(controller.store().len(), 1);
        assert_eq!(
            controller.persistence().raw().unwrap().as_deref(),
            Some(r#"[{"task":"Clean","dueDate":"2024-02-02T09:00","priority":"Low"}]"#)
        );
        let form = controller.form(id).unwrap();
        assert_eq!(form.state(), FormState::Committed);
        assert!(form.view().edit_visible);
        assert!(!form.view().save_visible);
    }

    #[test]
    fn invalid_priority_is_a_noop() {
        let mut controller = controller();
        let id = controller.create_form();
        fill(&mut controller, id, "Clean", "2024-02-02T09:00", "Urgent");

        assert_eq!(controller.save(id).unwrap(), Outcome::Rejected);
        assert!(controller.store().is_empty());
        assert!(controller.persistence().raw().unwrap().is_none());
        assert_eq!(controller.form(id).unwrap().state(), FormState::Editable);
    }

    #[test]
    fn save_is_only_offered_while_editable() {
        let mut controller = controller();
        let id = controller.create_form();
        fill(&mut controller, id, "Clean", "2024-02-02T09:00", "Low");
        controller.save(id).unwrap();

        assert_eq!(controller.save(id).unwrap(), Outcome::Unchanged);
        assert_eq!(controller.store().len(), 1);
    }

    #[test]
    fn edit_removes_from_store_without_persisting() {
        let mut controller = controller();
        let id = controller.create_form();
        fill(&mut controller, id, "Clean", "2024-02-02T09:00", "Low");
        controller.save(id).unwrap();
        let persisted = controller.persistence().raw().unwrap();

        assert_eq!(controller.edit(id).unwrap(), Outcome::Editing);

        assert!(controller.store().is_empty());
        assert_eq!(controller.persistence().raw().unwrap(), persisted);
        let form = controller.form(id).unwrap();
        assert_eq!(form.state(), FormState::Editable);
        assert!(form.task_id().is_none());
        assert!(form.view().fields_enabled);
    }

    #[test]
    fn edit_then_save_replaces_task() {
        let mut controller = controller();
        let id = controller.create_form();
        fill(&mut controller, id, "Clean", "2024-02-02T09:00", "Low");
        controller.save(id).unwrap();

        controller.edit(id).unwrap();
        controller.set_field(id, FormField::Priority, "High").unwrap();
        controller.save(id).unwrap();

        assert_eq!(
            controller.store().get_all_tasks(),
            vec![Task::new("Clean", "2024-02-02T09:00", Priority::High)]
        );
    }

    #[test]
    fn edit_targets_own_entry_among_duplicates() {
        let mut controller = controller();
        let first = controller.create_form();
        fill(&mut controller, first, "Same", "2024-01-01T10:00", "Normal");
        controller.save(first).unwrap();
        let second = controller.create_form();
        fill(&mut controller, second, "Same", "2024-01-01T10:00", "Normal");
        let Outcome::Saved(second_task) = controller.save(second).unwrap() else {
            panic!("expected save");
        };

        controller.edit(first).unwrap();

        assert_eq!(controller.store().len(), 1);
        assert!(controller.store().contains_id(second_task));
    }

    #[test]
    fn declined_delete_leaves_everything_untouched() {
        let mut controller = controller();
        let id = controller.create_form();
        fill(&mut controller, id, "Clean", "2024-02-02T09:00", "Low");
        controller.save(id).unwrap();
        let tasks = controller.store().get_all_tasks();
        let persisted = controller.persistence().raw().unwrap();

        let mut prompts = Vec::new();
        let outcome = controller
            .delete(id, &mut |message: &str| {
                prompts.push(message.to_string());
                false
            })
            .unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(prompts, vec![DEFAULT_CONFIRM_MESSAGE.to_string()]);
        assert_eq!(controller.store().get_all_tasks(), tasks);
        assert_eq!(controller.persistence().raw().unwrap(), persisted);
        assert!(controller.form(id).is_some());
    }

    #[test]
    fn confirmed_delete_removes_form_and_task() {
        let mut controller = controller();
        let keep = controller.create_form();
        fill(&mut controller, keep, "Keep", "2024-01-01T10:00", "High");
        controller.save(keep).unwrap();
        let doomed = controller.create_form();
        fill(&mut controller, doomed, "Drop", "2024-01-01T10:00", "Low");
        controller.save(doomed).unwrap();

        assert_eq!(controller.delete(doomed, &mut yes).unwrap(), Outcome::Deleted);

        assert!(controller.form(doomed).is_none());
        assert_eq!(controller.forms().len(), 1);
        assert_eq!(
            controller.persistence().load().unwrap(),
            vec![Task::new("Keep", "2024-01-01T10:00", Priority::High)]
        );
    }

    #[test]
    fn deleting_unsaved_form_persists_current_list() {
        let mut controller = controller();
        let saved = controller.create_form();
        fill(&mut controller, saved, "Keep", "2024-01-01T10:00", "High");
        controller.save(saved).unwrap();
        let draft = controller.create_form();
        fill(&mut controller, draft, "Keep", "2024-01-01T10:00", "High");

        controller.delete(draft, &mut yes).unwrap();

        assert_eq!(controller.store().len(), 1);
        assert_eq!(controller.persistence().load().unwrap().len(), 1);
    }

    #[test]
    fn unknown_form_is_an_error() {
        let mut controller = controller();
        let id = controller.create_form();
        controller.delete(id, &mut yes).unwrap();

        assert!(matches!(controller.save(id), Err(Error::FormNotFound(_))));
        assert!(matches!(controller.delete(id, &mut no), Err(Error::FormNotFound(_))));
    }

    struct ReadOnlyStorage;

    impl KeyValueStorage for ReadOnlyStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::OperationFailed("read-only".to_string()))
        }

        fn remove_item(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_persist_rolls_back_save() {
        let mut controller = FormController::new(PersistenceAdapter::new(ReadOnlyStorage));
        let id = controller.create_form();
        controller.set_field(id, FormField::Task, "Clean").unwrap();
        controller
            .set_field(id, FormField::DueDate, "2024-02-02T09:00")
            .unwrap();
        controller.set_field(id, FormField::Priority, "Low").unwrap();

        assert!(controller.save(id).is_err());
        assert!(controller.store().is_empty());
        assert_eq!(controller.form(id).unwrap().state(), FormState::Editable);
    }

    #[test]
    fn failed_persist_keeps_deleted_form() {
        let fail_writes = Rc::new(Cell::new(false));
        let backend = FlakyStorage {
            item: Some(
                r#"[{"task":"Clean","dueDate":"2024-02-02T09:00","priority":"Low"}]"#.to_string(),
            ),
            fail_writes: Rc::clone(&fail_writes),
        };
        let mut controller = FormController::new(PersistenceAdapter::new(backend));
        crate::loader::bootstrap(&mut controller).unwrap();
        fail_writes.set(true);
        let id = controller.forms()[0].id();

        assert!(controller.delete(id, &mut yes).is_err());
        assert_eq!(controller.forms().len(), 1);
        assert_eq!(controller.form(id).unwrap().state(), FormState::Committed);
        assert_eq!(
            controller.store().get_all_tasks(),
            vec![Task::new("Clean", "2024-02-02T09:00", Priority::Low)]
        );
        assert_eq!(controller.persistence().load().unwrap().len(), 1);

        fail_writes.set(false);
        assert_eq!(controller.delete(id, &mut yes).unwrap(), Outcome::Deleted);
        assert!(controller.store().is_empty());
        assert_eq!(controller.persistence().raw().unwrap().as_deref(), Some("[]"));
    }

    struct FlakyStorage {
        item: Option<String>,
        fail_writes: Rc<Cell<bool>>,
    }

    impl KeyValueStorage for FlakyStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Ok(self.item.clone())
        }

        fn set_item(&mut self, _key: &str, value: &str) -> Result<()> {
            if self.fail_writes.get() {
                return Err(Error::OperationFailed("disk full".to_string()));
            }
            self.item = Some(value.to_string());
            Ok(())
        }

        fn remove_item(&mut self, _key: &str) -> Result<()> {
            self.item = None;
            Ok(())
        }
    }
}
