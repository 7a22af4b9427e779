//! Lifecycle notifications fanned out to listeners

use std::fmt::{self, Display};

use crate::{
    domain::{error::CommandError, result::CommandResult},
    port::command::SharedCommand
};

/// A single lifecycle notification about one command
#[derive(Debug, Clone, Copy)]
pub enum CommandEvent<'a> {
    ExecutionStarted { command: &'a SharedCommand },
    ExecutionCompleted { command: &'a SharedCommand, result: &'a CommandResult },
    ExecutionFailed { command: &'a SharedCommand, error: &'a CommandError },
    ExecutionCancelled { command: &'a SharedCommand },
    UndoStarted { command: &'a SharedCommand },
    UndoCompleted { command: &'a SharedCommand, result: &'a CommandResult },
    UndoFailed { command: &'a SharedCommand, error: &'a CommandError }
}

impl<'a> CommandEvent<'a> {
    /// Event type identifier
    pub fn event_type(&self) -> &'static str {
        match self {
            CommandEvent::ExecutionStarted { .. } => "ExecutionStarted",
            CommandEvent::ExecutionCompleted { .. } => "ExecutionCompleted",
            CommandEvent::ExecutionFailed { .. } => "ExecutionFailed",
            CommandEvent::ExecutionCancelled { .. } => "ExecutionCancelled",
            CommandEvent::UndoStarted { .. } => "UndoStarted",
            CommandEvent::UndoCompleted { .. } => "UndoCompleted",
            CommandEvent::UndoFailed { .. } => "UndoFailed"
        }
    }

    /// The command this event is about
    pub fn command(&self) -> &'a SharedCommand {
        match *self {
            CommandEvent::ExecutionStarted { command }
            | CommandEvent::ExecutionCompleted { command, .. }
            | CommandEvent::ExecutionFailed { command, .. }
            | CommandEvent::ExecutionCancelled { command }
            | CommandEvent::UndoStarted { command }
            | CommandEvent::UndoCompleted { command, .. }
            | CommandEvent::UndoFailed { command, .. } => command
        }
    }
}

impl Display for CommandEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.event_type(), self.command().name())
    }
}
