//! Command-line interface for tasklist
//!
//! This module defines the CLI structure using clap derive macros.
//! Task commands live in `task`; `ui` hands over to the terminal UI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::{self, Config};
use crate::controller::FormController;
use crate::error::Result;
use crate::loader;
use crate::storage::{FileStorage, PersistenceAdapter};

mod task;

/// tasklist - a task list with per-task forms
///
/// Tasks are kept in a local JSON store and edited through forms that are
/// either editable or committed.
#[derive(Parser, Debug)]
#[command(name = "tasklist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the stored task list
    #[arg(long, global = true, env = "TASKLIST_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to a tasklist.toml (defaults to the one in the data directory)
    #[arg(long, global = true, env = "TASKLIST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive terminal UI (default)
    Ui,

    /// List stored tasks in order
    List,

    /// Create a task through a new form and save it
    Add {
        /// Task label
        task: String,

        /// Due date, e.g. 2024-02-02T09:00
        #[arg(long)]
        due: String,

        /// Priority: High, Normal or Low
        #[arg(long, default_value = "Normal")]
        priority: String,
    },

    /// Delete the first task with exactly these fields
    Rm {
        /// Task label
        task: String,

        /// Due date as stored
        #[arg(long)]
        due: String,

        /// Priority as stored
        #[arg(long)]
        priority: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove the stored task list entirely
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Resolved configuration and data directory for one invocation
#[derive(Debug, Clone)]
pub struct Session {
    pub config: Config,
    pub data_dir: PathBuf,
}

impl Session {
    /// Resolve config and data directory: flags first, then config, then
    /// the platform default.
    pub fn resolve(data_dir: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path.as_deref() {
            Some(path) => Config::load(path)?,
            None => {
                let probe = data_dir.clone().unwrap_or_else(config::default_data_dir);
                Config::load_from_dir(&probe)
            }
        };
        let data_dir = data_dir
            .or_else(|| config.storage.dir.clone())
            .unwrap_or_else(config::default_data_dir);
        debug!(data_dir = %data_dir.display(), "session resolved");
        Ok(Self { config, data_dir })
    }

    /// Persistence adapter over the on-disk store
    pub fn persistence(&self) -> PersistenceAdapter<FileStorage> {
        let backend =
            FileStorage::new(&self.data_dir).with_lock_timeout(self.config.storage.lock_timeout_ms);
        PersistenceAdapter::new(backend)
            .with_key(self.config.storage.key.clone())
            .with_corrupt_policy(self.config.storage.on_corrupt)
    }

    /// Controller with the stored list already loaded and rendered
    pub fn open(&self) -> Result<FormController<FileStorage>> {
        let mut controller = FormController::new(self.persistence())
            .with_confirm_message(self.config.ui.confirm_message.clone());
        loader::bootstrap(&mut controller)?;
        Ok(controller)
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let session = Session::resolve(self.data_dir, self.config)?;
        match self.command.unwrap_or(Commands::Ui) {
            Commands::Ui => crate::ui::run(&session),
            Commands::List => task::run_list(task::ListOptions {
                session,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Add {
                task,
                due,
                priority,
            } => task::run_add(task::AddOptions {
                task,
                due,
                priority,
                session,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Rm {
                task,
                due,
                priority,
                yes,
            } => task::run_rm(task::RmOptions {
                task,
                due,
                priority,
                yes,
                session,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Clear { yes } => task::run_clear(task::ClearOptions {
                yes,
                session,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}
