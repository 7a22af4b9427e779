//! Aggregate projections over tracked commands
//!
//! Statistics are recomputed from the command references on every request and hold no state of
//! their own.

use std::{
    collections::{BTreeMap, VecDeque},
    fmt::{self, Display}
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::port::command::SharedCommand;

/// Figures shared by both statistics views
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandAggregate {
    pub commands_by_name:       BTreeMap<String, usize>,
    pub commands_by_type:       BTreeMap<String, usize>,
    /// Sum of `actual_execution_time` in milliseconds
    pub total_execution_time:   u64,
    /// `total_execution_time / count`, zero for an empty set
    pub average_execution_time: f64,
    /// Earliest `created_at`
    pub first_command_time:     Option<DateTime<Utc>>,
    /// Latest `last_executed_at`
    pub last_command_time:      Option<DateTime<Utc>>
}

impl CommandAggregate {
    pub fn from_commands<'a>(commands: impl IntoIterator<Item = &'a SharedCommand>) -> Self {
        let mut aggregate = CommandAggregate::default();
        let mut count = 0usize;

        for command in commands {
            count += 1;
            *aggregate.commands_by_name.entry(command.name().to_string()).or_default() += 1;
            *aggregate.commands_by_type.entry(command.command_type().to_string()).or_default() += 1;
            aggregate.total_execution_time = aggregate.total_execution_time.saturating_add(command.actual_execution_time());

            let created_at = command.created_at();
            if aggregate.first_command_time.is_none_or(|first| created_at < first) {
                aggregate.first_command_time = Some(created_at);
            }
            if let Some(executed_at) = command.last_executed_at()
                && aggregate.last_command_time.is_none_or(|last| executed_at > last)
            {
                aggregate.last_command_time = Some(executed_at);
            }
        }

        aggregate.average_execution_time =
            if count > 0 { aggregate.total_execution_time as f64 / count as f64 } else { 0.0 };
        aggregate
    }
}

/// Snapshot of a [`crate::adapter::history::CommandHistory`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStatistics {
    pub total_commands:    usize,
    pub executed_commands: usize,
    pub undone_commands:   usize,
    #[serde(flatten)]
    pub aggregate:         CommandAggregate
}

impl HistoryStatistics {
    pub fn new(executed: &VecDeque<SharedCommand>, undone: &[SharedCommand]) -> Self {
        Self {
            total_commands:    executed.len() + undone.len(),
            executed_commands: executed.len(),
            undone_commands:   undone.len(),
            aggregate:         CommandAggregate::from_commands(executed.iter().chain(undone.iter()))
        }
    }
}

impl Display for HistoryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HistoryStatistics{{total={}, executed={}, undone={}, avgTime={:.2}ms}}",
            self.total_commands, self.executed_commands, self.undone_commands, self.aggregate.average_execution_time
        )
    }
}

/// Snapshot of an invoker's flat execution history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvokerStatistics {
    pub total_commands:      usize,
    pub successful_commands: usize,
    pub failed_commands:     usize,
    pub cancelled_commands:  usize,
    #[serde(flatten)]
    pub aggregate:           CommandAggregate
}

impl InvokerStatistics {
    pub fn new(commands: &[SharedCommand]) -> Self {
        let count = |predicate: fn(&SharedCommand) -> bool| commands.iter().filter(|c| predicate(c)).count();

        Self {
            total_commands:      commands.len(),
            successful_commands: count(|c| c.status().is_executed()),
            failed_commands:     count(|c| c.status().is_failed()),
            cancelled_commands:  count(|c| c.status().is_cancelled()),
            aggregate:           CommandAggregate::from_commands(commands)
        }
    }
}

impl Display for InvokerStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CommandStatistics{{total={}, successful={}, failed={}, cancelled={}, avgTime={:.2}ms}}",
            self.total_commands,
            self.successful_commands,
            self.failed_commands,
            self.cancelled_commands,
            self.aggregate.average_execution_time
        )
    }
}
