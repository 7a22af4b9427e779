//! Command lifecycle state machine
//!
//! Every command starts in [`CommandStatus::Created`]. The predicates on this type are the only
//! admissibility checks the engine consults before running, undoing or cancelling a command, so a
//! command can cycle `Created -> Executed -> Undone -> Executed -> ...` for as long as callers keep
//! alternating execute and undo.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a single command instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatus {
    /// Created but never run
    #[default]
    Created,
    /// Body is currently running
    Executing,
    /// Body completed successfully
    Executed,
    /// Body or validation failed
    Failed,
    /// Reverse body is currently running
    Undoing,
    /// Reverse body completed successfully
    Undone,
    /// Reverse body failed
    UndoFailed,
    /// Cancelled by the invoker before a result existed
    Cancelled
}

impl CommandStatus {
    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Created => "CREATED",
            CommandStatus::Executing => "EXECUTING",
            CommandStatus::Executed => "EXECUTED",
            CommandStatus::Failed => "FAILED",
            CommandStatus::Undoing => "UNDOING",
            CommandStatus::Undone => "UNDONE",
            CommandStatus::UndoFailed => "UNDO_FAILED",
            CommandStatus::Cancelled => "CANCELLED"
        }
    }

    /// Human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            CommandStatus::Created => "Created",
            CommandStatus::Executing => "Executing",
            CommandStatus::Executed => "Executed",
            CommandStatus::Failed => "Failed",
            CommandStatus::Undoing => "Undoing",
            CommandStatus::Undone => "Undone",
            CommandStatus::UndoFailed => "Undo failed",
            CommandStatus::Cancelled => "Cancelled"
        }
    }

    /// A command may run from scratch or be re-run after an undo
    pub fn can_execute(&self) -> bool {
        matches!(self, CommandStatus::Created | CommandStatus::Undone)
    }

    /// Only a successfully executed command may be undone
    pub fn can_undo(&self) -> bool {
        matches!(self, CommandStatus::Executed)
    }

    /// Cancellation only applies before or during execution
    pub fn can_cancel(&self) -> bool {
        matches!(self, CommandStatus::Created | CommandStatus::Executing)
    }

    pub fn is_executing(&self) -> bool {
        matches!(self, CommandStatus::Executing)
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, CommandStatus::Executed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CommandStatus::Failed | CommandStatus::UndoFailed)
    }

    pub fn is_undoing(&self) -> bool {
        matches!(self, CommandStatus::Undoing)
    }

    pub fn is_undone(&self) -> bool {
        matches!(self, CommandStatus::Undone)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CommandStatus::Cancelled)
    }

    /// Diagnostic only; never used to gate transitions
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            CommandStatus::Executed
                | CommandStatus::Failed
                | CommandStatus::Undone
                | CommandStatus::UndoFailed
                | CommandStatus::Cancelled
        )
    }
}

impl Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CommandStatus; 8] = [
        CommandStatus::Created,
        CommandStatus::Executing,
        CommandStatus::Executed,
        CommandStatus::Failed,
        CommandStatus::Undoing,
        CommandStatus::Undone,
        CommandStatus::UndoFailed,
        CommandStatus::Cancelled
    ];

    #[test]
    fn test_execute_allowed_from_created_and_undone_only() {
        let allowed: Vec<_> = ALL.iter().filter(|s| s.can_execute()).collect();
        assert_eq!(allowed, vec![&CommandStatus::Created, &CommandStatus::Undone]);
    }

    #[test]
    fn test_undo_allowed_from_executed_only() {
        let allowed: Vec<_> = ALL.iter().filter(|s| s.can_undo()).collect();
        assert_eq!(allowed, vec![&CommandStatus::Executed]);
    }

    #[test]
    fn test_cancel_allowed_before_a_result_exists() {
        let allowed: Vec<_> = ALL.iter().filter(|s| s.can_cancel()).collect();
        assert_eq!(allowed, vec![&CommandStatus::Created, &CommandStatus::Executing]);
    }

    #[test]
    fn test_failed_and_final_sets() {
        assert!(CommandStatus::Failed.is_failed());
        assert!(CommandStatus::UndoFailed.is_failed());
        assert!(!CommandStatus::Cancelled.is_failed());

        let finals: Vec<_> = ALL.iter().filter(|s| s.is_final()).collect();
        assert_eq!(finals.len(), 5);
        assert!(!CommandStatus::Created.is_final());
        assert!(!CommandStatus::Executing.is_final());
        assert!(!CommandStatus::Undoing.is_final());
    }

    #[test]
    fn test_display_uses_canonical_name() {
        assert_eq!(CommandStatus::UndoFailed.to_string(), "UNDO_FAILED");
        assert_eq!(CommandStatus::default(), CommandStatus::Created);
        assert_eq!(serde_json::to_string(&CommandStatus::UndoFailed).unwrap(), "\"UNDO_FAILED\"");
    }
}
