use std::{
    error::Error as StdError,
    fmt::{self, Display},
    sync::Arc
};

use thiserror::Error;

use crate::domain::status::CommandStatus;

/// Shared, cloneable cause kept behind an execution or undo failure
pub type ErrorSource = Arc<dyn StdError + Send + Sync + 'static>;

/// Lifecycle operation a state conflict refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Execute,
    Undo,
    Validate
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Execute => f.write_str("executed"),
            Operation::Undo => f.write_str("undone"),
            Operation::Validate => f.write_str("validated")
        }
    }
}

/// Error types for the command engine
#[derive(Error, Debug, Clone)]
pub enum CommandError {
    /// The current status forbids the requested operation
    #[error("[{command}] command cannot be {operation} while {status}")]
    StateConflict { command: String, operation: Operation, status: CommandStatus },

    /// Bad input, raised before any side effect runs
    #[error("[{command}] {message} (field: {field})")]
    Validation { command: String, field: String, message: String },

    /// Any other failure from a command body
    #[error("[{command}] command execution failed: {source}")]
    Execution {
        command: String,
        status:  CommandStatus,
        #[source]
        source:  ErrorSource
    },

    /// Any failure from a command's reverse body
    #[error("[{command}] command undo failed: {source}")]
    Undo {
        command: String,
        status:  CommandStatus,
        #[source]
        source:  ErrorSource
    },

    /// Caller-contract violation
    #[error("{0}")]
    Precondition(String),

    /// The command was cancelled while its body was running
    #[error("[{command}] command was cancelled")]
    Cancelled { command: String },

    /// The worker pool failed to produce a result
    #[error("worker pool failure: {0}")]
    Runtime(String),

    /// The worker pool no longer accepts work
    #[error("worker pool has been shut down")]
    PoolShutdown,

    /// A typed view of a result payload was requested with the wrong type
    #[error("{key} is not of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// The factory does not know the requested type identifier
    #[error("unsupported command type: {0}")]
    UnsupportedCommandType(String)
}

impl CommandError {
    pub fn validation(command: impl Into<String>, field: impl Into<String>, message: impl Into<String>) -> Self {
        CommandError::Validation { command: command.into(), field: field.into(), message: message.into() }
    }

    pub fn state_conflict(command: impl Into<String>, operation: Operation, status: CommandStatus) -> Self {
        CommandError::StateConflict { command: command.into(), operation, status }
    }

    pub fn execution(command: impl Into<String>, status: CommandStatus, source: anyhow::Error) -> Self {
        CommandError::Execution { command: command.into(), status, source: into_source(source) }
    }

    pub fn undo(command: impl Into<String>, status: CommandStatus, source: anyhow::Error) -> Self {
        CommandError::Undo { command: command.into(), status, source: into_source(source) }
    }

    /// Name of the command the error refers to, when there is one
    pub fn command_name(&self) -> Option<&str> {
        match self {
            CommandError::StateConflict { command, .. }
            | CommandError::Validation { command, .. }
            | CommandError::Execution { command, .. }
            | CommandError::Undo { command, .. }
            | CommandError::Cancelled { command } => Some(command),
            _ => None
        }
    }

    /// Status of the command when the error was raised
    pub fn status(&self) -> Option<CommandStatus> {
        match self {
            CommandError::StateConflict { status, .. }
            | CommandError::Execution { status, .. }
            | CommandError::Undo { status, .. } => Some(*status),
            CommandError::Cancelled { .. } => Some(CommandStatus::Cancelled),
            _ => None
        }
    }

    /// Offending field of a validation error
    pub fn field(&self) -> Option<&str> {
        match self {
            CommandError::Validation { field, .. } => Some(field),
            _ => None
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CommandError::Validation { .. })
    }

    pub fn is_state_conflict(&self) -> bool {
        matches!(self, CommandError::StateConflict { .. })
    }
}

fn into_source(error: anyhow::Error) -> ErrorSource {
    let boxed: Box<dyn StdError + Send + Sync + 'static> = error.into();
    Arc::from(boxed)
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_messages_carry_command_context() {
        let conflict = CommandError::state_conflict("GenerateTestData", Operation::Execute, CommandStatus::Executed);
        assert_eq!(conflict.to_string(), "[GenerateTestData] command cannot be executed while EXECUTED");
        assert_eq!(conflict.status(), Some(CommandStatus::Executed));

        let validation = CommandError::validation("DeleteTestData", "confirmDelete", "deletion not confirmed");
        assert_eq!(validation.to_string(), "[DeleteTestData] deletion not confirmed (field: confirmDelete)");
        assert_eq!(validation.command_name(), Some("DeleteTestData"));
        assert_eq!(validation.status(), None);
    }

    #[test]
    fn test_execution_error_keeps_the_cause() {
        let error = CommandError::execution("Writer", CommandStatus::Failed, anyhow::anyhow!("disk full"));

        assert_eq!(error.to_string(), "[Writer] command execution failed: disk full");
        assert_eq!(error.source().map(|e| e.to_string()), Some("disk full".to_string()));
        assert!(!error.is_validation());

        let cloned = error.clone();
        assert_eq!(cloned.status(), Some(CommandStatus::Failed));
    }

    #[test]
    fn test_precondition_has_no_command_context() {
        let error = CommandError::Precondition("no command in history to undo".to_string());
        assert_eq!(error.command_name(), None);
        assert_eq!(error.field(), None);
    }
}
