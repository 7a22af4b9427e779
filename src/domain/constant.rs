//! Domain Events - Structured event names for tracing

/// Per-command lifecycle events
pub mod command {
    pub const EXECUTION_STARTED: &str = "command.execution_started";
    pub const EXECUTION_SUCCEEDED: &str = "command.execution_succeeded";
    pub const EXECUTION_FAILED: &str = "command.execution_failed";
    pub const VALIDATION_FAILED: &str = "command.validation_failed";
    pub const UNDO_STARTED: &str = "command.undo_started";
    pub const UNDO_SUCCEEDED: &str = "command.undo_succeeded";
    pub const UNDO_FAILED: &str = "command.undo_failed";
    pub const STATE_CONFLICT: &str = "command.state_conflict";
    pub const CANCELLED: &str = "command.cancelled";
    pub const CANCELLED_WHILE_RUNNING: &str = "command.cancelled_while_running";
}

/// Undo/redo ledger events
pub mod history {
    pub const COMMAND_RECORDED: &str = "history.command_recorded";
    pub const COMMAND_EVICTED: &str = "history.command_evicted";
    pub const COMMAND_UNDONE: &str = "history.command_undone";
    pub const COMMAND_REDONE: &str = "history.command_redone";
    pub const CLEARED: &str = "history.cleared";
}

/// Invoker events
pub mod invoker {
    pub const COMMAND_SUBMITTED: &str = "invoker.command_submitted";
    pub const COMMAND_COMPLETED: &str = "invoker.command_completed";
    pub const COMMAND_FAILED: &str = "invoker.command_failed";
    pub const UNDO_COMPLETED: &str = "invoker.undo_completed";
    pub const UNDO_FAILED: &str = "invoker.undo_failed";
    pub const CANCEL_REJECTED: &str = "invoker.cancel_rejected";
    pub const HISTORY_CLEARED: &str = "invoker.history_cleared";
}

/// Worker pool events
pub mod pool {
    pub const POOL_STARTED: &str = "pool.started";
    pub const JOB_SUBMITTED: &str = "pool.job_submitted";
    pub const JOB_REJECTED: &str = "pool.job_rejected";
    pub const JOB_ABORTED: &str = "pool.job_aborted";
    pub const POOL_SHUTDOWN: &str = "pool.shutdown";
}

/// Listener fan-out events
pub mod listener {
    pub const LISTENER_ADDED: &str = "listener.added";
    pub const LISTENER_REMOVED: &str = "listener.removed";
    pub const DELIVERY_FAILED: &str = "listener.delivery_failed";
    pub const NOTIFICATION: &str = "listener.notification";
}

/// Factory events
pub mod factory {
    pub const COMMAND_CREATED: &str = "factory.command_created";
    pub const UNSUPPORTED_TYPE: &str = "factory.unsupported_type";
}

/// Fixture data events
pub mod fixture {
    pub const RECORDS_GENERATED: &str = "fixture.records_generated";
    pub const RECORDS_DELETED: &str = "fixture.records_deleted";
    pub const RECORDS_RESTORED: &str = "fixture.records_restored";
    pub const RECORDS_VALIDATED: &str = "fixture.records_validated";
}
