//! Template-method wrapper that turns a [`CommandBody`] into a full [`Command`]
//!
//! Execution flow for every attempt:
//! 1. Check the status admits the operation, else fail with a state conflict
//! 2. Move to EXECUTING (or UNDOING) and snapshot the parameters
//! 3. Run the validation hook (execute only), then the body
//! 4. Settle the terminal status and stamp timing, whatever the outcome

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError}
};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{Level, event};

use crate::{
    domain::{
        constant::command,
        error::{CommandError, Operation},
        result::CommandResult,
        status::CommandStatus,
        value::{FromValue, Parameters, Value}
    },
    port::command::{Command, CommandBody, CommandContext, DEFAULT_ESTIMATED_EXECUTION_TIME_MS, SharedCommand}
};

/// Mutable lifecycle bookkeeping, guarded separately from the body so `cancel` never waits on it
#[derive(Debug)]
struct CommandState {
    status:                CommandStatus,
    parameters:            Parameters,
    last_executed_at:      Option<DateTime<Utc>>,
    actual_execution_time: u64,
    estimate:              u64,
    cancellation:          CancellationToken
}

/// Outcome of settling an attempt against the current status
enum Settled {
    Applied,
    Cancelled
}

pub struct BaseCommand<B: CommandBody> {
    name:         String,
    description:  String,
    command_type: String,
    created_at:   DateTime<Utc>,
    state:        Mutex<CommandState>,
    body:         Mutex<B>
}

impl<B: CommandBody> BaseCommand<B> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        command_type: impl Into<String>,
        body: B
    ) -> Self {
        Self {
            name:         name.into(),
            description:  description.into(),
            command_type: command_type.into(),
            created_at:   Utc::now(),
            state:        Mutex::new(CommandState {
                status:                CommandStatus::Created,
                parameters:            Parameters::new(),
                last_executed_at:      None,
                actual_execution_time: 0,
                estimate:              DEFAULT_ESTIMATED_EXECUTION_TIME_MS,
                cancellation:          CancellationToken::new()
            }),
            body:         Mutex::new(body)
        }
    }

    pub fn with_parameters(self, parameters: Parameters) -> Self {
        self.set_parameters(parameters);
        self
    }

    pub fn into_shared(self) -> SharedCommand {
        Arc::new(self)
    }

    /// Value for `key`, falling back to `default` when missing or mistyped
    pub fn parameter_or<T: FromValue>(&self, key: &str, default: T) -> T {
        self.state().parameters.get_or(key, default)
    }

    /// Value for `key`; missing or mistyped entries fail with a validation error
    pub fn required_parameter<T: FromValue>(&self, key: &str) -> Result<T, CommandError> {
        self.state().parameters.require(&self.name, key)
    }

    pub fn set_parameter(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.state().parameters.insert(key, value);
    }

    pub fn has_parameter(&self, key: &str) -> bool {
        self.state().parameters.contains(key)
    }

    fn state(&self) -> MutexGuard<'_, CommandState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn body(&self) -> MutexGuard<'_, B> {
        self.body.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The body, or `None` while an attempt holds it
    fn idle_body(&self) -> Option<MutexGuard<'_, B>> {
        match self.body.try_lock() {
            Ok(body) => Some(body),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None
        }
    }

    /// Check admissibility, move to the running status and build the attempt context
    fn begin(&self, operation: Operation) -> Result<CommandContext, CommandError> {
        let mut state = self.state();

        let (admitted, running) = match operation {
            Operation::Execute => (state.status.can_execute(), CommandStatus::Executing),
            Operation::Undo => (state.status.can_undo(), CommandStatus::Undoing),
            Operation::Validate => return Err(CommandError::state_conflict(&self.name, operation, state.status))
        };
        if !admitted {
            event!(Level::DEBUG, event = command::STATE_CONFLICT, command = %self.name,
                operation = %operation, status = %state.status);
            return Err(CommandError::state_conflict(&self.name, operation, state.status));
        }

        if state.cancellation.is_cancelled() {
            state.cancellation = CancellationToken::new();
        }
        state.status = running;

        Ok(CommandContext::new(&self.name, state.parameters.clone(), state.cancellation.clone()))
    }

    /// Record the terminal status of an attempt unless a cancel overrode it while the body ran
    fn settle(&self, context: &CommandContext, next: CommandStatus, success: bool) -> Settled {
        let mut state = self.state();
        state.actual_execution_time = context.elapsed_ms();

        if state.status.is_cancelled() {
            event!(Level::WARN, event = command::CANCELLED_WHILE_RUNNING, command = %self.name,
                discarded = %next, elapsed_ms = state.actual_execution_time);
            return Settled::Cancelled;
        }

        state.status = next;
        if success {
            state.last_executed_at = Some(Utc::now());
        }
        Settled::Applied
    }

    fn cancelled(&self) -> CommandError {
        CommandError::Cancelled { command: self.name.clone() }
    }
}

impl<B: CommandBody> Command for BaseCommand<B> {
    fn execute(&self) -> Result<CommandResult, CommandError> {
        let context = self.begin(Operation::Execute)?;
        event!(Level::DEBUG, event = command::EXECUTION_STARTED, command = %self.name);

        let mut body = self.body();

        let checked = run_guarded(|| {
            let estimate = body.estimated_execution_time(&context.parameters);
            self.state().estimate = estimate;
            Ok(body.validate(&self.name, &context.parameters))
        })
        .unwrap_or_else(|panic| Err(CommandError::execution(&self.name, CommandStatus::Failed, panic)));
        if let Err(error) = checked {
            event!(Level::WARN, event = command::VALIDATION_FAILED, command = %self.name, error = %error);
            return match self.settle(&context, CommandStatus::Failed, false) {
                Settled::Applied => Err(error),
                Settled::Cancelled => Err(self.cancelled())
            };
        }

        let outcome = run_guarded(|| body.perform(&context));
        drop(body);

        match outcome {
            Ok(result) => match self.settle(&context, CommandStatus::Executed, true) {
                Settled::Applied => {
                    event!(Level::INFO, event = command::EXECUTION_SUCCEEDED, command = %self.name,
                        elapsed_ms = context.elapsed_ms());
                    Ok(result)
                }
                Settled::Cancelled => Err(self.cancelled())
            },
            Err(error) => match self.settle(&context, CommandStatus::Failed, false) {
                Settled::Applied => {
                    let error = match error.downcast::<CommandError>() {
                        Ok(validation) if validation.is_validation() => validation,
                        Ok(other) => CommandError::execution(&self.name, CommandStatus::Failed, other.into()),
                        Err(other) => CommandError::execution(&self.name, CommandStatus::Failed, other)
                    };
                    event!(Level::ERROR, event = command::EXECUTION_FAILED, command = %self.name, error = %error);
                    Err(error)
                }
                Settled::Cancelled => Err(self.cancelled())
            }
        }
    }

    fn undo(&self) -> Result<CommandResult, CommandError> {
        let context = self.begin(Operation::Undo)?;
        event!(Level::DEBUG, event = command::UNDO_STARTED, command = %self.name);

        let outcome = {
            let mut body = self.body();
            run_guarded(|| body.reverse(&context))
        };

        match outcome {
            Ok(result) => match self.settle(&context, CommandStatus::Undone, true) {
                Settled::Applied => {
                    event!(Level::INFO, event = command::UNDO_SUCCEEDED, command = %self.name,
                        elapsed_ms = context.elapsed_ms());
                    Ok(result)
                }
                Settled::Cancelled => Err(self.cancelled())
            },
            Err(error) => match self.settle(&context, CommandStatus::UndoFailed, false) {
                Settled::Applied => {
                    let error = CommandError::undo(&self.name, CommandStatus::UndoFailed, error);
                    event!(Level::ERROR, event = command::UNDO_FAILED, command = %self.name, error = %error);
                    Err(error)
                }
                Settled::Cancelled => Err(self.cancelled())
            }
        }
    }

    /// Fails with a state conflict instead of waiting while an attempt is running
    fn validate(&self) -> Result<(), CommandError> {
        let parameters = self.parameters();
        match self.idle_body() {
            Some(body) => body.validate(&self.name, &parameters),
            None => Err(CommandError::state_conflict(&self.name, Operation::Validate, self.status()))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn command_type(&self) -> &str {
        &self.command_type
    }

    fn parameters(&self) -> Parameters {
        self.state().parameters.clone()
    }

    fn set_parameters(&self, parameters: Parameters) {
        self.state().parameters = parameters;
    }

    fn status(&self) -> CommandStatus {
        self.state().status
    }

    fn set_status(&self, status: CommandStatus) {
        self.state().status = status;
    }

    fn cancel(&self) -> bool {
        let mut state = self.state();
        if !state.status.can_cancel() {
            return false;
        }

        let was_running = state.status.is_executing();
        state.status = CommandStatus::Cancelled;
        state.cancellation.cancel();
        event!(Level::INFO, event = command::CANCELLED, command = %self.name, was_running = was_running);
        true
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn last_executed_at(&self) -> Option<DateTime<Utc>> {
        self.state().last_executed_at
    }

    fn actual_execution_time(&self) -> u64 {
        self.state().actual_execution_time
    }

    /// While an attempt is running this is the estimate taken when it started
    fn estimated_execution_time(&self) -> u64 {
        let parameters = self.parameters();
        match self.idle_body() {
            Some(body) => {
                let estimate = body.estimated_execution_time(&parameters);
                self.state().estimate = estimate;
                estimate
            }
            None => self.state().estimate
        }
    }
}

impl<B: CommandBody> fmt::Debug for BaseCommand<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("BaseCommand")
            .field("name", &self.name)
            .field("command_type", &self.command_type)
            .field("status", &state.status)
            .field("created_at", &self.created_at)
            .field("last_executed_at", &state.last_executed_at)
            .finish_non_exhaustive()
    }
}

/// Run a body hook, turning a panic into an ordinary error
fn run_guarded<T>(body: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    panic::catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|payload| Err(anyhow::anyhow!("command body panicked: {}", panic_message(payload.as_ref()))))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
