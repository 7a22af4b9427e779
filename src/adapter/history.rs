//! Bounded undo/redo ledger
//!
//! The ledger only tracks which bucket a command belongs to. It never calls `execute` or `undo`
//! itself, and it never fails: misuse degrades to `None` or an empty list.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::{Level, event};

use crate::{
    domain::{constant::history, statistics::HistoryStatistics},
    port::command::SharedCommand
};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug)]
pub struct CommandHistory {
    executed:         VecDeque<SharedCommand>,
    undone:           Vec<SharedCommand>,
    max_history_size: usize,
    created_at:       DateTime<Utc>
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl CommandHistory {
    pub fn new(max_history_size: usize) -> Self {
        Self { executed: VecDeque::new(), undone: Vec::new(), max_history_size, created_at: Utc::now() }
    }

    /// Record a forward action. Clears the redo side and evicts the oldest entry past capacity.
    pub fn add_executed_command(&mut self, command: SharedCommand) {
        event!(Level::DEBUG, event = history::COMMAND_RECORDED, command = %command.name());
        self.executed.push_back(command);
        self.undone.clear();

        while self.executed.len() > self.max_history_size {
            if let Some(evicted) = self.executed.pop_front() {
                event!(Level::DEBUG, event = history::COMMAND_EVICTED, command = %evicted.name());
            }
        }
    }

    /// Move the most recent executed command to the undone side
    pub fn undo_last_command(&mut self) -> Option<SharedCommand> {
        let command = self.executed.pop_back()?;
        event!(Level::DEBUG, event = history::COMMAND_UNDONE, command = %command.name());
        self.undone.push(command.clone());
        Some(command)
    }

    /// Move the most recent undone command back to the executed side
    pub fn redo_last_command(&mut self) -> Option<SharedCommand> {
        let command = self.undone.pop()?;
        event!(Level::DEBUG, event = history::COMMAND_REDONE, command = %command.name());
        self.executed.push_back(command.clone());
        Some(command)
    }

    pub fn can_undo(&self) -> bool {
        !self.executed.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn last_executed_command(&self) -> Option<SharedCommand> {
        self.executed.back().cloned()
    }

    pub fn last_undone_command(&self) -> Option<SharedCommand> {
        self.undone.last().cloned()
    }

    pub fn executed_commands(&self) -> Vec<SharedCommand> {
        self.executed.iter().cloned().collect()
    }

    pub fn undone_commands(&self) -> Vec<SharedCommand> {
        self.undone.clone()
    }

    /// Executed commands followed by undone commands
    pub fn all_commands(&self) -> Vec<SharedCommand> {
        self.executed.iter().chain(self.undone.iter()).cloned().collect()
    }

    pub fn find_commands_by_name(&self, name: &str) -> Vec<SharedCommand> {
        if name.trim().is_empty() {
            return Vec::new();
        }
        self.matching(|command| command.name() == name)
    }

    pub fn find_commands_by_type(&self, command_type: &str) -> Vec<SharedCommand> {
        if command_type.trim().is_empty() {
            return Vec::new();
        }
        self.matching(|command| command.command_type() == command_type)
    }

    /// Commands whose `last_executed_at` falls within `[start, end]`
    pub fn find_commands_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<SharedCommand> {
        self.matching(|command| command.last_executed_at().is_some_and(|at| at >= start && at <= end))
    }

    pub fn statistics(&self) -> HistoryStatistics {
        HistoryStatistics::new(&self.executed, &self.undone)
    }

    pub fn clear(&mut self) {
        self.executed.clear();
        self.undone.clear();
        event!(Level::DEBUG, event = history::CLEARED);
    }

    pub fn clear_undone_commands(&mut self) {
        self.undone.clear();
    }

    /// Commands on both sides
    pub fn len(&self) -> usize {
        self.executed.len() + self.undone.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn matching(&self, predicate: impl Fn(&SharedCommand) -> bool) -> Vec<SharedCommand> {
        self.executed.iter().chain(self.undone.iter()).filter(|command| predicate(command)).cloned().collect()
    }
}
