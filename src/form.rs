//! Per-task form model.
//!
//! A form is a mutable copy of one task's fields plus a two-state machine:
//!
//! ```text
//!            save (valid fields)
//! Editable ----------------------> Committed
//!    ^                                 |
//!    +-------- edit (valid fields) ----+
//! ```
//!
//! Rendering layers never toggle inputs or buttons directly. They ask the
//! state for its [`FormView`] and draw that.

use std::fmt;

use crate::task::{Priority, Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormState {
    /// Inputs enabled, save visible, edit hidden.
    Editable,
    /// Inputs disabled, edit visible, save hidden.
    Committed,
}

/// What a rendering layer should show for a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormView {
    pub fields_enabled: bool,
    pub save_visible: bool,
    pub edit_visible: bool,
    pub delete_visible: bool,
}

impl FormState {
    pub fn view(self) -> FormView {
        match self {
            FormState::Editable => FormView {
                fields_enabled: true,
                save_visible: true,
                edit_visible: false,
                delete_visible: true,
            },
            FormState::Committed => FormView {
                fields_enabled: false,
                save_visible: false,
                edit_visible: true,
                delete_visible: true,
            },
        }
    }

    /// State after a save click, if save is offered in this state.
    pub fn on_save(self) -> Option<FormState> {
        match self {
            FormState::Editable => Some(FormState::Committed),
            FormState::Committed => None,
        }
    }

    /// State after an edit click, if edit is offered in this state.
    pub fn on_edit(self) -> Option<FormState> {
        match self {
            FormState::Committed => Some(FormState::Editable),
            FormState::Editable => None,
        }
    }
}

/// Named inputs of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Task,
    DueDate,
    Priority,
}

impl FormField {
    pub const ALL: [FormField; 3] = [FormField::Task, FormField::DueDate, FormField::Priority];

    /// Input name as exposed to form-data extraction.
    pub fn name(self) -> &'static str {
        match self {
            FormField::Task => "task",
            FormField::DueDate => "dueDate",
            FormField::Priority => "priority",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            FormField::Task => "Task",
            FormField::DueDate => "Due Date",
            FormField::Priority => "Priority",
        }
    }
}

/// Raw input values; an empty string is an unset input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub task: String,
    pub due_date: String,
    pub priority: String,
}

impl FormFields {
    pub fn from_task(task: &Task) -> Self {
        Self {
            task: task.task.clone(),
            due_date: task.due_date.clone(),
            priority: task.priority.as_str().to_string(),
        }
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Task => &self.task,
            FormField::DueDate => &self.due_date,
            FormField::Priority => &self.priority,
        }
    }

    pub fn get_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Task => &mut self.task,
            FormField::DueDate => &mut self.due_date,
            FormField::Priority => &mut self.priority,
        }
    }

    /// Selected priority, if the input holds one of the three literals.
    pub fn priority(&self) -> Option<Priority> {
        Priority::parse(&self.priority)
    }

    /// Coerce the inputs into a task; `None` when any of them is invalid.
    pub fn to_task(&self) -> Option<Task> {
        Task::from_form_values(
            Some(self.task.as_str()),
            Some(self.due_date.as_str()),
            Some(self.priority.as_str()),
        )
    }
}

/// Handle of a rendered form inside a controller's container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormId(pub(crate) u64);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "form-{}", self.0)
    }
}

/// One rendered form.
#[derive(Debug, Clone)]
pub struct Form {
    id: FormId,
    state: FormState,
    fields: FormFields,
    task_id: Option<TaskId>,
}

impl Form {
    pub(crate) fn new(id: FormId) -> Self {
        Self {
            id,
            state: FormState::Editable,
            fields: FormFields::default(),
            task_id: None,
        }
    }

    pub(crate) fn committed(id: FormId, task: &Task, task_id: TaskId) -> Self {
        Self {
            id,
            state: FormState::Committed,
            fields: FormFields::from_task(task),
            task_id: Some(task_id),
        }
    }

    pub fn id(&self) -> FormId {
        self.id
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn view(&self) -> FormView {
        self.state.view()
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    /// Store entry this form committed, if any.
    pub fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Update an input. Ignored while the inputs are disabled.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) -> bool {
        if !self.view().fields_enabled {
            return false;
        }
        *self.fields.get_mut(field) = value.into();
        true
    }

    pub(crate) fn set_state(&mut self, state: FormState) {
        self.state = state;
    }

    pub(crate) fn set_task_id(&mut self, task_id: Option<TaskId>) {
        self.task_id = task_id;
    }
}
