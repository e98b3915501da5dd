use tasklist::controller::{FormController, Outcome};
use tasklist::form::{FormField, FormState};
use tasklist::loader;
use tasklist::storage::{FileStorage, KeyValueStorage, MemoryStorage, PersistenceAdapter, TASKS_KEY};
use tasklist::store::TaskStore;
use tasklist::task::{Priority, Task};
use tempfile::TempDir;

fn milk() -> Task {
    Task::new("Buy milk", "2024-01-01T10:00", Priority::High)
}

fn clean() -> Task {
    Task::new("Clean", "2024-02-02T09:00", Priority::Low)
}

fn session(raw: Option<&str>) -> FormController<MemoryStorage> {
    let backend = match raw {
        Some(raw) => MemoryStorage::with_item(TASKS_KEY, raw),
        None => MemoryStorage::new(),
    };
    let mut controller = FormController::new(PersistenceAdapter::new(backend));
    loader::bootstrap(&mut controller).expect("bootstrap");
    controller
}

fn stored(controller: &FormController<MemoryStorage>) -> Option<String> {
    controller
        .persistence()
        .backend()
        .get_item(TASKS_KEY)
        .expect("get_item")
}

#[test]
fn persisted_list_round_trips_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let tasks = vec![milk(), clean(), clean()];

    let mut writer = PersistenceAdapter::new(FileStorage::new(temp.path()));
    writer.store(&tasks)?;

    let reader = PersistenceAdapter::new(FileStorage::new(temp.path()));
    assert_eq!(reader.load()?, tasks);
    Ok(())
}

#[test]
fn add_appends_last() {
    let mut store = TaskStore::from_vec(vec![milk()]);
    store.add_in_list(clean());
    assert_eq!(store.get_all_tasks(), vec![milk(), clean()]);
}

#[test]
fn remove_takes_first_match_or_nothing() {
    let mut store = TaskStore::from_vec(vec![clean(), milk(), clean()]);
    assert!(store.remove_from_list(&clean()));
    assert_eq!(store.get_all_tasks(), vec![milk(), clean()]);

    let other = Task::new("Clean", "2024-02-02T09:00", Priority::High);
    assert!(!store.remove_from_list(&other));
    assert_eq!(store.get_all_tasks(), vec![milk(), clean()]);
}

#[test]
fn invalid_priority_blocks_save() {
    let mut controller = session(None);
    let form = controller.create_form();
    controller.set_field(form, FormField::Task, "x").unwrap();
    controller
        .set_field(form, FormField::DueDate, "2024-01-01T10:00")
        .unwrap();
    controller
        .set_field(form, FormField::Priority, "Urgent")
        .unwrap();

    assert_eq!(controller.save(form).unwrap(), Outcome::Rejected);
    assert!(controller.store().is_empty());
    assert_eq!(stored(&controller), None);
    assert_eq!(
        controller.form(form).unwrap().state(),
        FormState::Editable
    );
}

#[test]
fn bootstrap_renders_committed_forms() {
    let controller = session(Some(
        r#"[{"task":"Buy milk","dueDate":"2024-01-01T10:00","priority":"High"}]"#,
    ));

    assert_eq!(controller.store().get_all_tasks(), vec![milk()]);
    let form = &controller.forms()[0];
    assert_eq!(form.state(), FormState::Committed);
    let view = form.view();
    assert!(!view.fields_enabled);
    assert!(view.edit_visible);
    assert!(!view.save_visible);
}

#[test]
fn fresh_session_is_empty() {
    let controller = session(None);
    assert!(controller.forms().is_empty());
    assert!(controller.store().is_empty());
    assert_eq!(stored(&controller), None);
}

#[test]
fn create_and_save_persists_exact_list() {
    let mut controller = session(None);
    let form = controller.create_form();
    controller.set_field(form, FormField::Task, "Clean").unwrap();
    controller
        .set_field(form, FormField::DueDate, "2024-02-02T09:00")
        .unwrap();
    controller.set_field(form, FormField::Priority, "Low").unwrap();

    assert!(matches!(controller.save(form).unwrap(), Outcome::Saved(_)));
    assert_eq!(
        stored(&controller).as_deref(),
        Some(r#"[{"task":"Clean","dueDate":"2024-02-02T09:00","priority":"Low"}]"#)
    );
    let view = controller.form(form).unwrap().view();
    assert!(!view.fields_enabled);
    assert!(view.edit_visible);
}

#[test]
fn declined_delete_changes_nothing() {
    let raw = r#"[{"task":"Buy milk","dueDate":"2024-01-01T10:00","priority":"High"}]"#;
    let mut controller = session(Some(raw));
    let form = controller.forms()[0].id();

    let mut asked = Vec::new();
    let outcome = controller
        .delete(form, &mut |message: &str| {
            asked.push(message.to_string());
            false
        })
        .unwrap();

    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(asked, vec!["Delete for sure?".to_string()]);
    assert_eq!(controller.forms().len(), 1);
    assert_eq!(controller.store().get_all_tasks(), vec![milk()]);
    assert_eq!(stored(&controller).as_deref(), Some(raw));
}

#[test]
fn edit_then_reload_loses_nothing_until_next_write() {
    let raw = r#"[{"task":"Buy milk","dueDate":"2024-01-01T10:00","priority":"High"}]"#;
    let mut controller = session(Some(raw));
    let form = controller.forms()[0].id();

    assert_eq!(controller.edit(form).unwrap(), Outcome::Editing);
    assert!(controller.store().is_empty());
    assert_eq!(stored(&controller).as_deref(), Some(raw));

    loader::bootstrap(&mut controller).unwrap();
    assert_eq!(controller.store().get_all_tasks(), vec![milk()]);
    assert_eq!(controller.forms().len(), 1);
}
