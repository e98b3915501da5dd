//! Startup: rebuild the session from storage.

use tracing::info;

use crate::controller::FormController;
use crate::error::Result;
use crate::storage::KeyValueStorage;

/// Clear rendered forms, load the stored list, replace the store contents
/// with it, and render one committed form per task in stored order.
///
/// Safe to call repeatedly: the store is replaced, not appended to. If the
/// stored entry cannot be loaded, nothing is changed.
pub fn bootstrap<S: KeyValueStorage>(controller: &mut FormController<S>) -> Result<usize> {
    let tasks = controller.load_persisted()?;

    controller.clear_forms();
    let ids = controller.replace_store(tasks.clone());
    for (task, task_id) in tasks.iter().zip(ids) {
        controller.render(task, task_id);
    }

    info!(count = tasks.len(), "session restored");
    Ok(tasks.len())
}
