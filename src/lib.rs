//! # Command Engine
//!
//! Reversible command objects with a lifecycle state machine, an undo/redo ledger and an invoker
//! that runs commands synchronously or on a bounded worker pool.
//!
//! This crate provides functionality to:
//! - Wrap a forward and reverse action in [`adapter::base::BaseCommand`], which enforces the
//!   CREATED/EXECUTED/UNDONE/... transitions, timing and error classification
//! - Track undoable and redoable commands in a bounded [`adapter::history::CommandHistory`]
//! - Run commands through [`adapter::invoker::CommandInvoker`], fanning lifecycle events out to
//!   listeners and keeping an append-only audit log with statistics
//! - Build the bundled fixture commands by type tag through [`adapter::factory::CommandFactory`]

pub mod adapter;
pub mod cli;
pub mod config;
pub mod domain;
pub mod port;

pub use adapter::{
    base::BaseCommand,
    factory::{CommandFactory, CommandKind},
    history::CommandHistory,
    invoker::CommandInvoker,
    pool::WorkerPool
};
pub use config::EngineConfig;
pub use domain::{error::CommandError, result::CommandResult, status::CommandStatus, value::Parameters};
pub use port::command::{Command, CommandBody, SharedCommand};
