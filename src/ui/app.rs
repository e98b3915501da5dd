use std::io::{self, IsTerminal};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::cli::Session;
use crate::controller::{FormController, Outcome};
use crate::error::{Error, Result};
use crate::form::{FormField, FormId, FormState};
use crate::storage::KeyValueStorage;
use crate::task::Priority;

use super::view;

const EVENT_POLL_MS: u64 = 120;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatusKind {
    Error,
    Info,
}

pub(crate) struct DeleteConfirmState {
    pub(crate) form: FormId,
    pub(crate) message: String,
    pub(crate) title: String,
}

pub struct AppState<S> {
    pub(crate) controller: FormController<S>,
    pub(crate) selected: Option<usize>,
    /// Input being typed into; `None` means keys are commands.
    pub(crate) active_field: Option<FormField>,
    pub(crate) delete_confirm: Option<DeleteConfirmState>,
    pub(crate) show_help: bool,
    pub(crate) highlight_overdue: bool,
    status: Option<(String, StatusKind)>,
}

/// Open the stored list and run the terminal UI until the user quits.
pub fn run(session: &Session) -> Result<()> {
    if !io::stdout().is_terminal() {
        return Err(Error::OperationFailed(
            "the terminal UI needs an interactive terminal; try `tasklist list`".to_string(),
        ));
    }
    let controller = session.open()?;
    let mut app = AppState::new(controller, session.config.ui.highlight_overdue);
    run_terminal(&mut app)
}

fn run_terminal<S: KeyValueStorage>(app: &mut AppState<S>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop<S: KeyValueStorage>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState<S>,
) -> Result<()> {
    let mut dirty = true;
    loop {
        if dirty {
            let now = Local::now().naive_local();
            terminal.draw(|frame| view::render(frame, app, now))?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    if app.handle_key(key) {
                        break;
                    }
                    dirty = true;
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }
    }
    Ok(())
}

impl<S: KeyValueStorage> AppState<S> {
    pub(crate) fn new(controller: FormController<S>, highlight_overdue: bool) -> Self {
        let selected = if controller.forms().is_empty() {
            None
        } else {
            Some(0)
        };
        Self {
            controller,
            selected,
            active_field: None,
            delete_confirm: None,
            show_help: false,
            highlight_overdue,
            status: None,
        }
    }

    pub(crate) fn selected_form(&self) -> Option<FormId> {
        self.selected
            .and_then(|idx| self.controller.forms().get(idx))
            .map(|form| form.id())
    }

    pub(crate) fn status_line(&self) -> Option<(&str, StatusKind)> {
        self.status
            .as_ref()
            .map(|(message, kind)| (message.as_str(), *kind))
    }

    pub(crate) fn footer_hint(&self) -> &'static str {
        if self.delete_confirm.is_some() {
            return "y confirm delete  n/esc cancel";
        }
        if self.active_field.is_some() {
            return "type to edit  tab next field  [/] priority  enter save  esc done";
        }
        "n new  j/k move  tab fields  s save  e edit  d delete  ? help  q quit"
    }

    pub(crate) fn count_summary(&self, now: NaiveDateTime) -> String {
        let forms = self.controller.forms();
        let editing = forms
            .iter()
            .filter(|form| form.state() == FormState::Editable)
            .count();
        let overdue = self
            .controller
            .store()
            .iter()
            .filter(|(_, task)| task.is_overdue(now))
            .count();
        format!(
            "{} forms  {} stored  {} editing  {} overdue",
            forms.len(),
            self.controller.store().len(),
            editing,
            overdue
        )
    }

    fn set_info(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), StatusKind::Info));
    }

    fn set_error(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), StatusKind::Error));
    }

    /// Returns `true` when the app should exit.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if let Some(confirm) = self.delete_confirm.take() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.finish_delete(confirm.form, true),
                KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                    self.finish_delete(confirm.form, false)
                }
                _ => self.delete_confirm = Some(confirm),
            }
            return false;
        }

        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc
            ) {
                self.show_help = false;
            }
            return false;
        }

        if self.active_field.is_some() {
            self.handle_input_key(key);
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('n') => {
                self.controller.create_form();
                self.selected = Some(self.controller.forms().len() - 1);
                self.active_field = Some(FormField::Task);
                self.set_info("new form");
            }
            KeyCode::Tab => self.focus_field(FormField::Task),
            KeyCode::Char('[') => self.cycle_priority(false),
            KeyCode::Char(']') => self.cycle_priority(true),
            KeyCode::Char('s') | KeyCode::Enter => self.save_selected(),
            KeyCode::Char('e') => self.edit_selected(),
            KeyCode::Char('d') => self.request_delete(),
            _ => {}
        }
        false
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let Some(field) = self.active_field else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.active_field = None,
            KeyCode::Tab => self.active_field = Some(next_field(field)),
            KeyCode::BackTab => self.active_field = Some(prev_field(field)),
            KeyCode::Enter => {
                self.active_field = None;
                self.save_selected();
            }
            KeyCode::Char('[') if field == FormField::Priority => self.cycle_priority(false),
            KeyCode::Char(']') if field == FormField::Priority => self.cycle_priority(true),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.update_field(field, |value| value.clear());
            }
            KeyCode::Backspace => self.update_field(field, |value| {
                value.pop();
            }),
            KeyCode::Char(ch) => self.update_field(field, |value| value.push(ch)),
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.controller.forms().len();
        if len == 0 {
            self.selected = None;
            return;
        }
        let current = self.selected.unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.selected = Some(next as usize);
    }

    fn focus_field(&mut self, field: FormField) {
        let Some(id) = self.selected_form() else {
            return;
        };
        match self.controller.form(id) {
            Some(form) if form.view().fields_enabled => self.active_field = Some(field),
            Some(_) => self.set_info("form is committed; press e to edit"),
            None => {}
        }
    }

    fn update_field(&mut self, field: FormField, apply: impl FnOnce(&mut String)) {
        let Some(id) = self.selected_form() else {
            return;
        };
        let Some(form) = self.controller.form(id) else {
            return;
        };
        let mut value = form.fields().get(field).to_string();
        apply(&mut value);
        match self.controller.set_field(id, field, value) {
            Ok(true) => {}
            Ok(false) => self.active_field = None,
            Err(err) => self.set_error(err.to_string()),
        }
    }

    fn cycle_priority(&mut self, forward: bool) {
        let Some(id) = self.selected_form() else {
            return;
        };
        let Some(form) = self.controller.form(id) else {
            return;
        };
        if !form.view().fields_enabled {
            return;
        }
        let next = match form.fields().priority() {
            Some(current) if forward => current.cycle_next(),
            Some(current) => current.cycle_prev(),
            None => Priority::Normal,
        };
        self.update_field(FormField::Priority, |value| {
            *value = next.as_str().to_string();
        });
    }

    fn save_selected(&mut self) {
        let Some(id) = self.selected_form() else {
            return;
        };
        match self.controller.save(id) {
            Ok(Outcome::Saved(_)) => {
                self.active_field = None;
                self.set_info("saved");
            }
            Ok(Outcome::Rejected) => {
                self.set_info("task, due date and priority (High/Normal/Low) are required")
            }
            Ok(_) => {}
            Err(err) => self.set_error(err.to_string()),
        }
    }

    fn edit_selected(&mut self) {
        let Some(id) = self.selected_form() else {
            return;
        };
        match self.controller.edit(id) {
            Ok(Outcome::Editing) => {
                self.active_field = Some(FormField::Task);
                self.set_info("editing; save to store the task again");
            }
            Ok(_) => {}
            Err(err) => self.set_error(err.to_string()),
        }
    }

    fn request_delete(&mut self) {
        let Some(id) = self.selected_form() else {
            return;
        };
        let title = self
            .controller
            .form(id)
            .map(|form| form.fields().task.clone())
            .unwrap_or_default();
        self.delete_confirm = Some(DeleteConfirmState {
            form: id,
            message: self.controller.confirm_message().to_string(),
            title,
        });
    }

    fn finish_delete(&mut self, id: FormId, answer: bool) {
        match self.controller.delete(id, &mut |_: &str| answer) {
            Ok(Outcome::Deleted) => {
                self.active_field = None;
                self.move_selection(0);
                self.set_info("deleted");
            }
            Ok(_) => self.set_info("cancelled"),
            Err(err) => self.set_error(err.to_string()),
        }
    }
}

fn next_field(field: FormField) -> FormField {
    match field {
        FormField::Task => FormField::DueDate,
        FormField::DueDate => FormField::Priority,
        FormField::Priority => FormField::Task,
    }
}

fn prev_field(field: FormField) -> FormField {
    match field {
        FormField::Task => FormField::Priority,
        FormField::DueDate => FormField::Task,
        FormField::Priority => FormField::DueDate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;
    use crate::storage::{MemoryStorage, PersistenceAdapter, TASKS_KEY};

    const ONE_TASK: &str = r#"[{"task":"Clean","dueDate":"2024-02-02T09:00","priority":"Low"}]"#;

    fn app_with(raw: Option<&str>) -> AppState<MemoryStorage> {
        let backend = match raw {
            Some(raw) => MemoryStorage::with_item(TASKS_KEY, raw),
            None => MemoryStorage::new(),
        };
        let mut controller = FormController::new(PersistenceAdapter::new(backend));
        loader::bootstrap(&mut controller).expect("bootstrap");
        AppState::new(controller, true)
    }

    fn press(app: &mut AppState<MemoryStorage>, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut AppState<MemoryStorage>, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn stored(app: &AppState<MemoryStorage>) -> Option<String> {
        app.controller.persistence().raw().expect("raw")
    }

    #[test]
    fn new_form_typed_and_saved() {
        let mut app = app_with(None);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.active_field, Some(FormField::Task));

        type_text(&mut app, "Buy milk");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2024-01-01T10:00");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(']'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.active_field, None);
        assert_eq!(
            stored(&app).as_deref(),
            Some(r#"[{"task":"Buy milk","dueDate":"2024-01-01T10:00","priority":"Normal"}]"#)
        );
        let form = &app.controller.forms()[0];
        assert_eq!(form.state(), FormState::Committed);
    }

    #[test]
    fn incomplete_form_is_not_saved() {
        let mut app = app_with(None);
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "No date");
        press(&mut app, KeyCode::Enter);

        assert_eq!(stored(&app), None);
        assert_eq!(app.controller.forms()[0].state(), FormState::Editable);
        assert!(matches!(app.status_line(), Some((_, StatusKind::Info))));
    }

    #[test]
    fn command_keys_do_not_type_into_committed_form() {
        let mut app = app_with(Some(ONE_TASK));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.active_field, None);
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.controller.forms()[0].fields().priority, "Low");
    }

    #[test]
    fn edit_then_resave_moves_task_to_end() {
        let raw = r#"[{"task":"A","dueDate":"2024-01-01T10:00","priority":"High"},{"task":"B","dueDate":"2024-01-02T10:00","priority":"Low"}]"#;
        let mut app = app_with(Some(raw));

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.active_field, Some(FormField::Task));
        assert_eq!(app.controller.store().len(), 1);
        type_text(&mut app, "2");
        press(&mut app, KeyCode::Enter);

        assert_eq!(
            stored(&app).as_deref(),
            Some(r#"[{"task":"B","dueDate":"2024-01-02T10:00","priority":"Low"},{"task":"A2","dueDate":"2024-01-01T10:00","priority":"High"}]"#)
        );
    }

    #[test]
    fn delete_declined_keeps_everything() {
        let mut app = app_with(Some(ONE_TASK));
        press(&mut app, KeyCode::Char('d'));
        assert!(app.delete_confirm.is_some());
        assert_eq!(app.footer_hint(), "y confirm delete  n/esc cancel");

        press(&mut app, KeyCode::Char('n'));
        assert!(app.delete_confirm.is_none());
        assert_eq!(app.controller.forms().len(), 1);
        assert_eq!(stored(&app).as_deref(), Some(ONE_TASK));
    }

    #[test]
    fn delete_confirmed_removes_and_persists() {
        let mut app = app_with(Some(ONE_TASK));
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('x'));
        assert!(app.delete_confirm.is_some());
        press(&mut app, KeyCode::Char('y'));

        assert!(app.controller.forms().is_empty());
        assert_eq!(app.selected, None);
        assert_eq!(stored(&app).as_deref(), Some("[]"));
    }

    #[test]
    fn selection_is_clamped() {
        let mut app = app_with(Some(ONE_TASK));
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.selected, Some(0));
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.selected, Some(0));
    }

    #[test]
    fn help_and_quit() {
        let mut app = app_with(None);
        assert!(!press(&mut app, KeyCode::Char('?')));
        assert!(app.show_help);
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn ctrl_u_clears_field() {
        let mut app = app_with(None);
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "typo");
        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(app.controller.forms()[0].fields().task, "");
    }
}
