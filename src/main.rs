//! # cmdx
//!
//! Runs the bundled fixture commands through the command engine.
//!
//! ## Usage
//!
//! ```bash
//! # List the command types
//! cmdx types
//!
//! # Generate 50 records, then undo the generation
//! cmdx run GENERATE_TEST_DATA -p count=50 --undo
//!
//! # Seed 100 records and clear them on the worker pool
//! cmdx run CLEAR_TEST_DATA --fixtures 100 --background
//!
//! # Walk a batch through generate, validate, clear and restore
//! cmdx demo --count 300
//! ```
//!
//! Logging goes to stderr; `RUST_LOG` overrides the configured `log_filter`.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use command_engine::{
    adapter::{
        factory::CommandFactory, fixture::store::InMemoryFixtureStore, invoker::CommandInvoker,
        listener::LoggingListener, pool::WorkerPool
    },
    cli::{Cli, Commands, handle_demo_command, handle_init_command, handle_run_command, handle_types_command},
    config,
    port::fixture::FixtureStore
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?
    };
    setup_tracing(&config.log_filter);

    let store: Arc<dyn FixtureStore> = Arc::new(InMemoryFixtureStore::new());
    let factory = CommandFactory::new(store.clone());
    let invoker = CommandInvoker::new(WorkerPool::current(config.worker_pool_size)?);
    invoker.add_listener(Arc::new(LoggingListener));

    let result = match &cli.command {
        Commands::Init => handle_init_command(),
        Commands::Types => {
            handle_types_command(&factory);
            Ok(())
        }
        Commands::Run(args) => handle_run_command(&invoker, &factory, &store, args).await,
        Commands::Demo { count, json } => {
            handle_demo_command(&invoker, &factory, config.history_capacity, *count, *json).await
        }
    };

    invoker.shutdown();
    result
}

fn setup_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();
}
