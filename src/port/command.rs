//! Command contract
//!
//! Two seams live here:
//! - [`Command`] is what callers, the history ledger and the invoker see: an operation object with
//!   its own lifecycle state, driven through `execute`/`undo`.
//! - [`CommandBody`] is what a concrete operation implements: the forward and reverse actions plus
//!   optional validation and estimation hooks. [`crate::adapter::base::BaseCommand`] wraps a body
//!   with the state machine, timing and error translation.

use std::{
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant}
};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::domain::{error::CommandError, result::CommandResult, status::CommandStatus, value::Parameters};

/// Shared handle to a command. History and invoker hold clones of this, never copies of the command.
pub type SharedCommand = Arc<dyn Command>;

/// Default estimate returned by [`CommandBody::estimated_execution_time`], in milliseconds
pub const DEFAULT_ESTIMATED_EXECUTION_TIME_MS: u64 = 1000;

/// Operation object with its own lifecycle
pub trait Command: Debug + Send + Sync {
    /// Run the operation. Fails with a state conflict unless [`Command::can_execute`] holds.
    fn execute(&self) -> Result<CommandResult, CommandError>;

    /// Reverse the operation. Fails with a state conflict unless [`Command::can_undo`] holds.
    fn undo(&self) -> Result<CommandResult, CommandError>;

    /// Check parameters without running anything
    ///
    /// Never waits on a running attempt; fails with a state conflict instead.
    fn validate(&self) -> Result<(), CommandError>;

    /// Stable identifier
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Category tag
    fn command_type(&self) -> &str;

    /// Copy of the parameter bag
    fn parameters(&self) -> Parameters;

    /// Replace the parameter bag with a copy of `parameters`
    fn set_parameters(&self, parameters: Parameters);

    fn status(&self) -> CommandStatus;

    /// Direct status override; bypasses the execute/undo template
    fn set_status(&self, status: CommandStatus);

    /// Atomically move to CANCELLED if the current status allows it and signal the body
    ///
    /// Returns false, without touching anything, when the status forbids cancellation.
    fn cancel(&self) -> bool;

    fn created_at(&self) -> DateTime<Utc>;

    /// Set on every successful execute or undo
    fn last_executed_at(&self) -> Option<DateTime<Utc>>;

    /// Duration of the latest attempt in milliseconds, success or failure
    fn actual_execution_time(&self) -> u64;

    /// Pure estimate used for scheduling hints, never for correctness
    fn estimated_execution_time(&self) -> u64;

    fn can_execute(&self) -> bool {
        self.status().can_execute()
    }

    fn can_undo(&self) -> bool {
        self.status().can_undo()
    }

    fn can_cancel(&self) -> bool {
        self.status().can_cancel()
    }

    /// One-line summary for logs
    fn info(&self) -> String {
        format!(
            "Command{{name='{}', type='{}', status={}, createdAt={}, lastExecutedAt={}, executionTime={}ms}}",
            self.name(),
            self.command_type(),
            self.status(),
            self.created_at().format("%Y-%m-%d %H:%M:%S%.3f"),
            self.last_executed_at()
                .map(|at| at.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
                .unwrap_or_else(|| "never".to_string()),
            self.actual_execution_time()
        )
    }
}

/// Everything a body may look at while it runs
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Name of the command running the body
    pub command_name: String,
    /// Snapshot of the parameters taken when the attempt started
    pub parameters:   Parameters,
    /// Tripped when the invoker cancels the command mid-flight
    pub cancellation: CancellationToken,
    started_at:       Instant
}

impl CommandContext {
    pub fn new(command_name: impl Into<String>, parameters: Parameters, cancellation: CancellationToken) -> Self {
        Self { command_name: command_name.into(), parameters, cancellation, started_at: Instant::now() }
    }

    /// Milliseconds since the attempt started
    pub fn elapsed_ms(&self) -> u64 {
        duration_ms(self.started_at.elapsed())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fail with [`CommandError::Cancelled`] once the token has been tripped
    pub fn ensure_not_cancelled(&self) -> Result<(), CommandError> {
        if self.is_cancelled() {
            return Err(CommandError::Cancelled { command: self.command_name.clone() });
        }
        Ok(())
    }
}

/// Forward and reverse actions of a concrete operation
///
/// Bodies are invoked only under the state machine's protection. Return a validation
/// [`CommandError`] (inside the `anyhow::Error`) to have it surface unchanged from `execute`; any
/// other error is wrapped as an execution failure.
pub trait CommandBody: Send + 'static {
    /// Perform the operation
    fn perform(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult>;

    /// Reverse the operation
    fn reverse(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult>;

    /// Runs before every execute; the body never runs if this fails
    fn validate(&self, _command_name: &str, _parameters: &Parameters) -> Result<(), CommandError> {
        Ok(())
    }

    fn estimated_execution_time(&self, _parameters: &Parameters) -> u64 {
        DEFAULT_ESTIMATED_EXECUTION_TIME_MS
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
