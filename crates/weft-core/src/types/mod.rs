//! Data model for linked tool programs.

mod program;
mod reference;
mod tool;

pub use program::{Program, ToolSet};
pub use reference::split_arg;
pub use tool::{ArgumentProperty, ArgumentSchema, Parameters, Repo, Tool, ToolSource};
