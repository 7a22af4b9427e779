//! Execution facade
//!
//! The invoker runs commands on the caller's thread or on its worker pool, keeps an append-only
//! audit log of every successful execution and fans lifecycle events out to listeners. The audit
//! log is unrelated to [`crate::adapter::history::CommandHistory`]; both only share command
//! references.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError}
};

use tracing::{Level, event};

use crate::{
    adapter::{
        listener::{DeliveryReport, ListenerBus, ListenerFailure, SharedListener},
        pool::{CompletableExecution, PendingExecution, WorkerPool}
    },
    domain::{
        constant::invoker,
        error::{CommandError, Operation},
        event::CommandEvent,
        result::CommandResult,
        statistics::InvokerStatistics
    },
    port::command::SharedCommand
};

/// Listener failures kept for inspection; older entries are dropped first
const RECORDED_LISTENER_FAILURES: usize = 256;

struct InvokerCore {
    history:   Mutex<Vec<SharedCommand>>,
    listeners: ListenerBus,
    failures:  Mutex<VecDeque<ListenerFailure>>
}

impl InvokerCore {
    fn history(&self) -> MutexGuard<'_, Vec<SharedCommand>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, notification: CommandEvent<'_>) {
        let DeliveryReport { failures, .. } = self.listeners.publish(notification);
        if failures.is_empty() {
            return;
        }

        let mut recorded = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        recorded.extend(failures);
        while recorded.len() > RECORDED_LISTENER_FAILURES {
            recorded.pop_front();
        }
    }

    fn execute(&self, command: &SharedCommand) -> Result<CommandResult, CommandError> {
        event!(Level::DEBUG, event = invoker::COMMAND_SUBMITTED, command = %command.name());
        self.notify(CommandEvent::ExecutionStarted { command });

        match command.execute() {
            Ok(result) => {
                self.history().push(command.clone());
                event!(Level::INFO, event = invoker::COMMAND_COMPLETED, command = %command.name(),
                    elapsed_ms = command.actual_execution_time());
                self.notify(CommandEvent::ExecutionCompleted { command, result: &result });
                Ok(result)
            }
            Err(error) => {
                event!(Level::WARN, event = invoker::COMMAND_FAILED, command = %command.name(), error = %error);
                self.notify(CommandEvent::ExecutionFailed { command, error: &error });
                Err(error)
            }
        }
    }

    fn undo(&self, command: &SharedCommand) -> Result<CommandResult, CommandError> {
        if !command.can_undo() {
            return Err(CommandError::state_conflict(command.name(), Operation::Undo, command.status()));
        }

        self.notify(CommandEvent::UndoStarted { command });

        match command.undo() {
            Ok(result) => {
                event!(Level::INFO, event = invoker::UNDO_COMPLETED, command = %command.name(),
                    elapsed_ms = command.actual_execution_time());
                self.notify(CommandEvent::UndoCompleted { command, result: &result });
                Ok(result)
            }
            Err(error) => {
                event!(Level::WARN, event = invoker::UNDO_FAILED, command = %command.name(), error = %error);
                self.notify(CommandEvent::UndoFailed { command, error: &error });
                Err(error)
            }
        }
    }
}

/// Runs commands synchronously or on a worker pool and keeps an audit log of executions
#[derive(Clone)]
pub struct CommandInvoker {
    core: Arc<InvokerCore>,
    pool: WorkerPool
}

impl CommandInvoker {
    pub fn new(pool: WorkerPool) -> Self {
        Self {
            core: Arc::new(InvokerCore {
                history:   Mutex::new(Vec::new()),
                listeners: ListenerBus::new(),
                failures:  Mutex::new(VecDeque::new())
            }),
            pool
        }
    }

    /// Execute on the calling thread
    ///
    /// On success the command is appended to the audit log before listeners hear about it. On
    /// failure the log is left alone and the command's error is returned unchanged.
    pub fn execute(&self, command: &SharedCommand) -> Result<CommandResult, CommandError> {
        self.core.execute(command)
    }

    /// Execute on the worker pool; the handle can be awaited or waited on from a plain thread
    pub fn execute_async(&self, command: SharedCommand) -> Result<PendingExecution<CommandResult>, CommandError> {
        let core = self.core.clone();
        self.pool.submit_pending(move || core.execute(&command))
    }

    /// Execute on the worker pool through a handle that supports continuations
    pub fn execute_completable(
        &self,
        command: SharedCommand
    ) -> Result<CompletableExecution<CommandResult>, CommandError> {
        let core = self.core.clone();
        self.pool.submit(move || core.execute(&command))
    }

    /// Undo on the calling thread; fails with a state conflict unless the command can be undone
    pub fn undo(&self, command: &SharedCommand) -> Result<CommandResult, CommandError> {
        self.core.undo(command)
    }

    /// Undo the most recent entry of the audit log, whatever its current status
    pub fn undo_last(&self) -> Result<CommandResult, CommandError> {
        let last = self
            .core
            .history()
            .last()
            .cloned()
            .ok_or_else(|| CommandError::Precondition("nothing to undo: command history is empty".to_string()))?;

        self.core.undo(&last)
    }

    /// Mark a command CANCELLED and notify listeners
    ///
    /// Returns false, with no notification, when the command's status forbids cancellation. A body
    /// that is already running keeps running; it can observe the cancellation through its context.
    pub fn cancel(&self, command: &SharedCommand) -> bool {
        if !command.cancel() {
            event!(Level::DEBUG, event = invoker::CANCEL_REJECTED, command = %command.name(),
                status = %command.status());
            return false;
        }

        self.core.notify(CommandEvent::ExecutionCancelled { command });
        true
    }

    pub fn add_listener(&self, listener: SharedListener) {
        self.core.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &SharedListener) -> bool {
        self.core.listeners.remove(listener)
    }

    /// Listener failures captured during notification, oldest first
    pub fn listener_failures(&self) -> Vec<ListenerFailure> {
        self.core.failures.lock().unwrap_or_else(PoisonError::into_inner).iter().cloned().collect()
    }

    /// Copy of the audit log, oldest first
    pub fn command_history(&self) -> Vec<SharedCommand> {
        self.core.history().clone()
    }

    pub fn clear_history(&self) {
        self.core.history().clear();
        event!(Level::DEBUG, event = invoker::HISTORY_CLEARED);
    }

    pub fn statistics(&self) -> InvokerStatistics {
        let commands = self.command_history();
        InvokerStatistics::new(&commands)
    }

    /// Stop accepting asynchronous work; in-flight executions finish normally
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }

    pub fn is_shutdown(&self) -> bool {
        self.pool.is_shutdown()
    }

    pub fn worker_pool_size(&self) -> usize {
        self.pool.size()
    }
}
