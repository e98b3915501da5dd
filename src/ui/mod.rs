//! Terminal UI over the form controller.

mod app;
mod view;

pub use app::run;
