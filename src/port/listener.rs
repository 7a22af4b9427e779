//! Observer contract for command lifecycle notifications
//!
//! Every callback returns a `Result`. A failing listener is recorded by the bus and never affects
//! the command or the other listeners.

use thiserror::Error;

use crate::{
    domain::{error::CommandError, event::CommandEvent, result::CommandResult},
    port::command::SharedCommand
};

/// Failure reported by a listener callback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    #[error("listener rejected notification: {0}")]
    Rejected(String),

    #[error("listener panicked: {0}")]
    Panicked(String)
}

/// Observer of command lifecycle events. Every callback defaults to a no-op.
pub trait CommandListener: Send + Sync {
    /// Name used when reporting failures
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn on_execution_started(&self, _command: &SharedCommand) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_execution_completed(&self, _command: &SharedCommand, _result: &CommandResult) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_execution_failed(&self, _command: &SharedCommand, _error: &CommandError) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_execution_cancelled(&self, _command: &SharedCommand) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_undo_started(&self, _command: &SharedCommand) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_undo_completed(&self, _command: &SharedCommand, _result: &CommandResult) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_undo_failed(&self, _command: &SharedCommand, _error: &CommandError) -> Result<(), ListenerError> {
        Ok(())
    }
}

impl CommandEvent<'_> {
    /// Route this event to the matching callback of `listener`
    pub fn deliver_to(&self, listener: &dyn CommandListener) -> Result<(), ListenerError> {
        match *self {
            CommandEvent::ExecutionStarted { command } => listener.on_execution_started(command),
            CommandEvent::ExecutionCompleted { command, result } => listener.on_execution_completed(command, result),
            CommandEvent::ExecutionFailed { command, error } => listener.on_execution_failed(command, error),
            CommandEvent::ExecutionCancelled { command } => listener.on_execution_cancelled(command),
            CommandEvent::UndoStarted { command } => listener.on_undo_started(command),
            CommandEvent::UndoCompleted { command, result } => listener.on_undo_completed(command, result),
            CommandEvent::UndoFailed { command, error } => listener.on_undo_failed(command, error)
        }
    }
}
