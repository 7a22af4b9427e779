//! Listener fan-out
//!
//! The bus delivers every event to each registered listener in registration order. Each delivery
//! produces its own `Result`; a panic inside a callback is caught and recorded the same way, so one
//! misbehaving listener never blocks the others or the command outcome.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, PoisonError, RwLock}
};

use tracing::{Level, event};

use crate::{
    adapter::base::panic_message,
    domain::{constant, error::CommandError, event::CommandEvent, result::CommandResult},
    port::{
        command::SharedCommand,
        listener::{CommandListener, ListenerError}
    }
};

pub type SharedListener = Arc<dyn CommandListener>;

/// One listener that failed to handle an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    pub listener: String,
    pub error:    ListenerError
}

/// Outcome of publishing one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failures:  Vec<ListenerFailure>
}

impl DeliveryReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default)]
pub struct ListenerBus {
    listeners: RwLock<Vec<SharedListener>>
}

impl ListenerBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: SharedListener) {
        event!(Level::DEBUG, event = constant::listener::LISTENER_ADDED, listener = %listener.name());
        self.listeners.write().unwrap_or_else(PoisonError::into_inner).push(listener);
    }

    /// Remove a listener by identity; returns whether it was registered
    pub fn remove(&self, listener: &SharedListener) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|registered| !Arc::ptr_eq(registered, listener));

        let removed = listeners.len() != before;
        if removed {
            event!(Level::DEBUG, event = constant::listener::LISTENER_REMOVED, listener = %listener.name());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `notification` to a snapshot of the registered listeners
    pub fn publish(&self, notification: CommandEvent<'_>) -> DeliveryReport {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner).clone();
        let mut report = DeliveryReport::default();

        for listener in &listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| notification.deliver_to(listener.as_ref())))
                .unwrap_or_else(|payload| Err(ListenerError::Panicked(panic_message(payload.as_ref()))));

            match outcome {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    event!(Level::WARN, event = constant::listener::DELIVERY_FAILED, listener = %listener.name(),
                        notification = %notification, error = %error);
                    report.failures.push(ListenerFailure { listener: listener.name().to_string(), error });
                }
            }
        }

        report
    }
}

/// Listener that mirrors every notification into the tracing stream
#[derive(Debug, Default)]
pub struct LoggingListener;

impl LoggingListener {
    fn log(&self, kind: &str, command: &SharedCommand) {
        event!(Level::INFO, event = constant::listener::NOTIFICATION, notification = kind, command = %command.name(),
            status = %command.status(), elapsed_ms = command.actual_execution_time());
    }
}

impl CommandListener for LoggingListener {
    fn name(&self) -> &str {
        "LoggingListener"
    }

    fn on_execution_started(&self, command: &SharedCommand) -> Result<(), ListenerError> {
        self.log("ExecutionStarted", command);
        Ok(())
    }

    fn on_execution_completed(&self, command: &SharedCommand, _result: &CommandResult) -> Result<(), ListenerError> {
        self.log("ExecutionCompleted", command);
        Ok(())
    }

    fn on_execution_failed(&self, command: &SharedCommand, error: &CommandError) -> Result<(), ListenerError> {
        event!(Level::WARN, event = constant::listener::NOTIFICATION, notification = "ExecutionFailed",
            command = %command.name(), error = %error);
        Ok(())
    }

    fn on_execution_cancelled(&self, command: &SharedCommand) -> Result<(), ListenerError> {
        self.log("ExecutionCancelled", command);
        Ok(())
    }

    fn on_undo_started(&self, command: &SharedCommand) -> Result<(), ListenerError> {
        self.log("UndoStarted", command);
        Ok(())
    }

    fn on_undo_completed(&self, command: &SharedCommand, _result: &CommandResult) -> Result<(), ListenerError> {
        self.log("UndoCompleted", command);
        Ok(())
    }

    fn on_undo_failed(&self, command: &SharedCommand, error: &CommandError) -> Result<(), ListenerError> {
        event!(Level::WARN, event = constant::listener::NOTIFICATION, notification = "UndoFailed",
            command = %command.name(), error = %error);
        Ok(())
    }
}
