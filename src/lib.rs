//! tasklist - task list with per-task forms
//!
//! Every task is shown through a form that is either editable or committed.
//! Saving a form appends its task to an in-memory store and rewrites the
//! whole list to a string-keyed storage backend; loading renders one
//! committed form per stored task.
//!
//! # Module Organization
//!
//! - `task`: task record, priority and session ids
//! - `store`: ordered in-memory task list
//! - `storage`: key-value backends and the JSON persistence adapter
//! - `form`: form fields and the editable/committed state machine
//! - `controller`: save, edit and delete handlers over forms
//! - `loader`: startup load of the stored list into forms
//! - `config`: `tasklist.toml` loading
//! - `lock`: file locking and atomic writes
//! - `output`: human and JSON command output
//! - `cli`: command-line interface using clap
//! - `ui`: terminal UI

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod loader;
pub mod lock;
pub mod output;
pub mod storage;
pub mod store;
pub mod task;
pub mod ui;

pub use error::{Error, Result};
