//! Weft Core - shared types for the weft tool runtime.
//!
//! This crate provides the data model used by every weft component: the
//! [`Tool`] and [`Program`] records produced by the loader, the provenance
//! types attached to them, and the logging macros shared across crates.

pub mod logging;
pub mod system;
pub mod types;

pub use types::{
    ArgumentProperty, ArgumentSchema, Parameters, Program, Repo, Tool, ToolSet, ToolSource,
    split_arg,
};
