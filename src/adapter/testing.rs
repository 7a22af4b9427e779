//! Command doubles shared by the adapter tests

use std::{thread, time::Duration};

use crate::{
    adapter::base::BaseCommand,
    domain::{result::CommandResult, value::Value},
    port::command::{CommandBody, CommandContext, SharedCommand}
};

pub struct Noop;

impl CommandBody for Noop {
    fn perform(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult> {
        thread::sleep(Duration::from_millis(1));
        Ok(CommandResult::success("done", Value::Int(1), context.elapsed_ms()))
    }

    fn reverse(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult> {
        Ok(CommandResult::success("reverted", None, context.elapsed_ms()))
    }
}

pub struct Failing(pub &'static str);

impl CommandBody for Failing {
    fn perform(&mut self, _context: &CommandContext) -> anyhow::Result<CommandResult> {
        anyhow::bail!(self.0)
    }

    fn reverse(&mut self, _context: &CommandContext) -> anyhow::Result<CommandResult> {
        anyhow::bail!(self.0)
    }
}

pub fn noop() -> SharedCommand {
    named("Noop", "TEST")
}

pub fn named(name: &str, command_type: &str) -> SharedCommand {
    BaseCommand::new(name, "test double", command_type, Noop).into_shared()
}

pub fn failing(message: &'static str) -> SharedCommand {
    BaseCommand::new("Failing", "always fails", "TEST", Failing(message)).into_shared()
}
