//! Adapters - the engine's implementations of its ports
//!
//! [`base::BaseCommand`] drives a body through the lifecycle, [`history::CommandHistory`] keeps the
//! undo/redo ledger and [`invoker::CommandInvoker`] runs commands, fans out notifications and keeps
//! the append-only audit trail.

pub mod base;
pub mod factory;
pub mod fixture;
pub mod history;
pub mod invoker;
pub mod listener;
pub mod pool;

#[cfg(test)]
pub(crate) mod testing;
