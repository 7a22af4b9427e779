//! CLI command handlers

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;

use crate::{
    adapter::{
        factory::CommandFactory,
        fixture::generate::GenerateConfig,
        history::CommandHistory,
        invoker::CommandInvoker
    },
    cli::{
        RunArgs,
        render::{self, command_table, history_statistics_table, invoker_statistics_table}
    },
    config,
    domain::value::Parameters,
    port::fixture::FixtureStore
};

/// Handle the init command - write the default configuration file
pub fn handle_init_command() -> Result<()> {
    let path = config::init_config().context("Failed to initialize configuration")?;
    println!("Configuration file: {}", path.display());
    Ok(())
}

pub fn handle_types_command(factory: &CommandFactory) {
    println!("Supported command types:");
    for command_type in factory.supported_command_types() {
        println!("  • {}", command_type);
    }
}

/// Handle the run command - build one command, run it, optionally undo it
pub async fn handle_run_command(
    invoker: &CommandInvoker,
    factory: &CommandFactory,
    store: &Arc<dyn FixtureStore>,
    args: &RunArgs
) -> Result<()> {
    if args.fixtures > 0 {
        seed_fixtures(store, args.fixtures)?;
    }

    let parameters: Parameters = args.parameters.iter().cloned().collect();
    let parameters = (!parameters.is_empty()).then_some(parameters);
    let command = factory.create_command(&args.command_type, parameters)?;

    let result = if args.background {
        invoker.execute_completable(command.clone())?.await?
    } else {
        invoker.execute(&command)?
    };
    println!("{}", render::render_result(&result, args.json)?);

    if args.undo {
        let undone = invoker.undo(&command)?;
        println!("{}", render::render_result(&undone, args.json)?);
    }

    if !args.json {
        println!("{}", command_table(&invoker.command_history()));
    }
    Ok(())
}

/// Handle the demo command - walk a generated batch through the whole lifecycle
pub async fn handle_demo_command(
    invoker: &CommandInvoker,
    factory: &CommandFactory,
    history_capacity: usize,
    count: usize,
    json: bool
) -> Result<()> {
    let mut history = CommandHistory::new(history_capacity);

    let generate = factory.generate_test_data(count);
    println!("{}", render::render_result(&invoker.execute(&generate)?, json)?);
    history.add_executed_command(generate);

    let validate = factory.validate_test_data();
    let validated = invoker.execute_async(validate.clone())?.await?;
    println!("{}", render::render_result(&validated, json)?);
    history.add_executed_command(validate);

    let clear = factory.clear_test_data();
    println!("{}", render::render_result(&invoker.execute(&clear)?, json)?);
    history.add_executed_command(clear);

    println!("{}", render::render_result(&invoker.undo_last()?, json)?);
    history.undo_last_command();

    if json {
        println!("{}", render::render_json(&invoker.statistics())?);
        println!("{}", render::render_json(&history.statistics())?);
    } else {
        println!("{}", command_table(&invoker.command_history()));
        println!("{}", invoker_statistics_table(&invoker.statistics()));
        println!("{}", history_statistics_table(&history.statistics()));
        println!("{}", history.statistics());
    }
    Ok(())
}

fn seed_fixtures(store: &Arc<dyn FixtureStore>, count: usize) -> Result<()> {
    let config = GenerateConfig { count, ..GenerateConfig::default() };
    let records = config.build_records(&mut rand::thread_rng(), Local::now().date_naive());
    store.save_all(records).context("Failed to seed fixture store")?;
    Ok(())
}
