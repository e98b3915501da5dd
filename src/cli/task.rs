//! tasklist task command implementations.

use std::io::{self, BufRead, Write};

use chrono::Local;
use serde::Serialize;

use crate::cli::Session;
use crate::controller::{Confirm, Outcome};
use crate::error::{Error, Result};
use crate::form::FormField;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{Priority, Task};

pub struct ListOptions {
    pub session: Session,
    pub json: bool,
    pub quiet: bool,
}

pub struct AddOptions {
    pub task: String,
    pub due: String,
    pub priority: String,
    pub session: Session,
    pub json: bool,
    pub quiet: bool,
}

pub struct RmOptions {
    pub task: String,
    pub due: String,
    pub priority: String,
    pub yes: bool,
    pub session: Session,
    pub json: bool,
    pub quiet: bool,
}

pub struct ClearOptions {
    pub yes: bool,
    pub session: Session,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct TaskListOutput {
    count: usize,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct TaskChangeOutput {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    task: Option<Task>,
    count: usize,
}

/// Reads a yes/no answer from stdin. Anything but `y`/`yes` declines,
/// including end of input.
pub(crate) struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{message} [y/N] ");
        let _ = stderr.flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let tasks = options.session.persistence().load()?;
    let now = Local::now().naive_local();

    let mut human = HumanOutput::new(match tasks.len() {
        0 => "No tasks".to_string(),
        1 => "1 task".to_string(),
        n => format!("{n} tasks"),
    });
    for task in &tasks {
        human.push_detail(describe(task));
    }
    if options.session.config.ui.highlight_overdue {
        let overdue = tasks.iter().filter(|task| task.is_overdue(now)).count();
        if overdue > 0 {
            human.push_warning(format!("{overdue} overdue"));
        }
    }

    let output = TaskListOutput {
        count: tasks.len(),
        tasks,
    };
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "list",
        &output,
        Some(&human),
    )
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut controller = options.session.open()?;

    let form = controller.create_form();
    controller.set_field(form, FormField::Task, options.task)?;
    controller.set_field(form, FormField::DueDate, options.due)?;
    controller.set_field(form, FormField::Priority, options.priority)?;

    let outcome = controller.save(form)?;
    let Outcome::Saved(task_id) = outcome else {
        return Err(invalid_fields());
    };
    let task = controller.store().get(task_id).cloned();

    let mut human = HumanOutput::new("Task saved");
    if let Some(task) = task.as_ref() {
        human.push_summary("Task", describe(task));
    }
    human.push_summary("Stored", controller.store().len().to_string());

    let output = TaskChangeOutput {
        outcome: outcome.label(),
        task,
        count: controller.store().len(),
    };
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "add",
        &output,
        Some(&human),
    )
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let priority: Priority = options.priority.parse()?;
    let Some(target) = Task::from_form_values(
        Some(options.task.as_str()),
        Some(options.due.as_str()),
        Some(priority.as_str()),
    ) else {
        return Err(invalid_fields());
    };

    let mut controller = options.session.open()?;
    let form = controller.find_committed(&target).ok_or_else(|| {
        Error::InvalidArgument(format!("no stored task matches {}", describe(&target)))
    })?;

    let outcome = if options.yes {
        controller.delete(form, &mut |_: &str| true)?
    } else {
        controller.delete(form, &mut StdinConfirm)?
    };

    let header = match outcome {
        Outcome::Deleted => "Task deleted",
        _ => "Delete cancelled",
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("Task", describe(&target));
    human.push_summary("Stored", controller.store().len().to_string());

    let output = TaskChangeOutput {
        outcome: outcome.label(),
        task: Some(target),
        count: controller.store().len(),
    };
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "rm",
        &output,
        Some(&human),
    )
}

pub fn run_clear(options: ClearOptions) -> Result<()> {
    let mut persistence = options.session.persistence();
    let confirmed = options.yes || StdinConfirm.confirm("Remove every stored task?");

    if confirmed {
        persistence.clear()?;
    }

    let human = HumanOutput::new(if confirmed {
        "Stored tasks cleared"
    } else {
        "Clear cancelled"
    });

    #[derive(Serialize)]
    struct ClearOutput {
        cleared: bool,
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "clear",
        &ClearOutput { cleared: confirmed },
        Some(&human),
    )
}

fn describe(task: &Task) -> String {
    format!("{} ({}, due {})", task.task, task.priority, task.due_date)
}

fn invalid_fields() -> Error {
    let priorities: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();
    Error::InvalidArgument(format!(
        "task and due date are required and priority must be one of {}",
        priorities.join("|")
    ))
}
