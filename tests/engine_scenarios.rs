use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering}
};

use command_engine::{
    BaseCommand, Command, CommandBody, CommandError, CommandFactory, CommandHistory, CommandInvoker, CommandResult,
    CommandStatus, Parameters, SharedCommand, WorkerPool,
    adapter::fixture::{delete, generate, store::InMemoryFixtureStore},
    domain::value::Value,
    port::{command::CommandContext, fixture::FixtureStore}
};

/// Adds `step` to a shared counter, subtracts it on undo
struct Counter {
    total: Arc<AtomicI64>,
    step:  i64
}

impl CommandBody for Counter {
    fn perform(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult> {
        let total = self.total.fetch_add(self.step, Ordering::SeqCst) + self.step;
        Ok(CommandResult::success("added", Value::Int(total), context.elapsed_ms()))
    }

    fn reverse(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult> {
        let total = self.total.fetch_sub(self.step, Ordering::SeqCst) - self.step;
        Ok(CommandResult::success("subtracted", Value::Int(total), context.elapsed_ms()))
    }
}

fn counter(name: &str, total: &Arc<AtomicI64>) -> SharedCommand {
    BaseCommand::new(name, "adds to a counter", "COUNTER", Counter { total: total.clone(), step: 1 }).into_shared()
}

fn fixture_factory() -> (Arc<InMemoryFixtureStore>, CommandFactory) {
    let store = Arc::new(InMemoryFixtureStore::new());
    (store.clone(), CommandFactory::new(store))
}

#[test]
fn test_fresh_command_state() {
    let total = Arc::new(AtomicI64::new(0));
    let command = counter("Fresh", &total);

    assert_eq!(command.status(), CommandStatus::Created);
    assert!(command.can_execute());
    assert!(!command.can_undo());
    assert!(command.last_executed_at().is_none());
    assert_eq!(command.actual_execution_time(), 0);
}

#[test]
fn test_second_execute_conflicts_without_touching_timing() {
    let total = Arc::new(AtomicI64::new(0));
    let command = counter("Twice", &total);

    command.execute().unwrap();
    let executed_at = command.last_executed_at();
    let elapsed = command.actual_execution_time();

    let error = command.execute().unwrap_err();

    assert!(error.is_state_conflict());
    assert_eq!(command.last_executed_at(), executed_at);
    assert_eq!(command.actual_execution_time(), elapsed);
    assert_eq!(total.load(Ordering::SeqCst), 1);
}

#[test]
fn test_execute_undo_execute_round_trip() {
    let total = Arc::new(AtomicI64::new(0));
    let command = counter("RoundTrip", &total);

    command.execute().unwrap();
    command.undo().unwrap();
    assert_eq!(command.status(), CommandStatus::Undone);
    command.execute().unwrap();

    assert_eq!(command.status(), CommandStatus::Executed);
    assert_eq!(total.load(Ordering::SeqCst), 1);
}

#[test]
fn test_adding_a_command_always_clears_redo() {
    let total = Arc::new(AtomicI64::new(0));
    let mut history = CommandHistory::new(10);

    for round in 0..4 {
        history.add_executed_command(counter(&format!("C{}", round), &total));
        history.add_executed_command(counter(&format!("D{}", round), &total));
        history.undo_last_command();
        if round % 2 == 0 {
            history.undo_last_command();
            history.redo_last_command();
        }
        assert!(history.can_redo());

        history.add_executed_command(counter(&format!("E{}", round), &total));

        assert!(history.undone_commands().is_empty());
    }
}

#[test]
fn test_history_evicts_oldest_beyond_capacity() {
    let total = Arc::new(AtomicI64::new(0));
    let mut history = CommandHistory::new(3);
    let first = counter("First", &total);
    history.add_executed_command(first.clone());

    for index in 0..3 {
        history.add_executed_command(counter(&format!("Next{}", index), &total));
    }

    let executed = history.executed_commands();
    assert_eq!(executed.len(), 3);
    assert!(!executed.iter().any(|command| Arc::ptr_eq(command, &first)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_only_applies_before_completion() {
    let total = Arc::new(AtomicI64::new(0));
    let invoker = CommandInvoker::new(WorkerPool::current(2).unwrap());

    let executed = counter("Executed", &total);
    invoker.execute(&executed).unwrap();
    assert!(!invoker.cancel(&executed));
    assert_eq!(executed.status(), CommandStatus::Executed);

    let pending = counter("Pending", &total);
    assert!(invoker.cancel(&pending));
    assert_eq!(pending.status(), CommandStatus::Cancelled);
    assert!(pending.execute().unwrap_err().is_state_conflict());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_undo_last_requires_history() {
    let total = Arc::new(AtomicI64::new(0));
    let invoker = CommandInvoker::new(WorkerPool::current(2).unwrap());

    let error = invoker.undo_last().unwrap_err();
    assert!(matches!(&error, CommandError::Precondition(message) if message.contains("nothing to undo")));

    let command = counter("Only", &total);
    invoker.execute(&command).unwrap();
    invoker.undo_last().unwrap();

    assert_eq!(command.status(), CommandStatus::Undone);
    assert_eq!(total.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_statistics_sum_and_average() {
    let total = Arc::new(AtomicI64::new(0));
    let invoker = CommandInvoker::new(WorkerPool::current(3).unwrap());

    let empty = invoker.statistics();
    assert_eq!(empty.total_commands, 0);
    assert_eq!(empty.aggregate.average_execution_time, 0.0);

    invoker.execute(&counter("A", &total)).unwrap();
    invoker.execute_async(counter("B", &total)).unwrap().await.unwrap();
    invoker.execute_completable(counter("C", &total)).unwrap().await.unwrap();

    let statistics = invoker.statistics();
    let history = invoker.command_history();
    let sum: u64 = history.iter().map(|command| command.actual_execution_time()).sum();

    assert_eq!(statistics.total_commands, 3);
    assert_eq!(statistics.successful_commands, 3);
    assert_eq!(statistics.aggregate.total_execution_time, sum);
    assert_eq!(statistics.aggregate.average_execution_time, sum as f64 / 3.0);
}

#[test]
fn test_generate_three_hundred_records_then_undo() {
    let (store, factory) = fixture_factory();
    let command = factory
        .create_command("GENERATE_TEST_DATA", Some(Parameters::new().with(generate::param::COUNT, 300)))
        .unwrap();

    let result = command.execute().unwrap();

    assert!(result.is_success());
    assert_eq!(result.data_as::<i64>().unwrap(), Some(300));
    assert_eq!(result.metadata_as::<i64>("generatedCount").unwrap(), Some(300));
    assert_eq!(store.count().unwrap(), 300);

    let undone = command.undo().unwrap();

    assert_eq!(undone.data_as::<i64>().unwrap(), Some(300));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_delete_requires_confirmation() {
    let (store, factory) = fixture_factory();
    factory.generate_test_data(20).execute().unwrap();
    let command = factory.create_command("DELETE_TEST_DATA", Some(Parameters::new())).unwrap();

    let error = command.execute().unwrap_err();

    assert!(error.is_validation());
    assert_eq!(error.field(), Some(delete::param::CONFIRM_DELETE));
    assert_eq!(store.count().unwrap(), 20);
}
