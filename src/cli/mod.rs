//! Command-line interface for the `cmdx` binary

pub mod args;
pub mod commands;
pub mod render;

pub use args::*;
pub use commands::*;
