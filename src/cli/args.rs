//! CLI argument parsing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::value::Value;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file to use instead of the one in the platform config directory
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the default configuration file
    Init,
    /// List the command types that can be run
    Types,
    /// Build a command by type and run it through the invoker
    Run(RunArgs),
    /// Generate, validate, clear and restore a batch of fixtures, then print history and statistics
    Demo {
        /// Number of fixture records to generate
        #[arg(long, default_value_t = 300)]
        count: usize,
        /// Print results as JSON
        #[arg(long)]
        json:  bool
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Command type, e.g. GENERATE_TEST_DATA (case-insensitive)
    pub command_type: String,

    /// Command parameter; repeat for several
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_parameter)]
    pub parameters: Vec<(String, Value)>,

    /// Fixture records to seed the in-memory store with before running
    #[arg(long, default_value_t = 0)]
    pub fixtures: usize,

    /// Undo the command right after it executes
    #[arg(long)]
    pub undo: bool,

    /// Run on the worker pool instead of the calling thread
    #[arg(long)]
    pub background: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool
}

/// Parse `key=value`, typing the value as a bool, number, comma list or text
pub fn parse_parameter(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("parameter name is missing in `{}`", raw));
    }

    Ok((key.to_string(), Value::parse_literal(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameter_types_values() {
        assert_eq!(parse_parameter("count=12").unwrap(), ("count".to_string(), Value::Int(12)));
        assert_eq!(parse_parameter("confirmDelete=true").unwrap(), ("confirmDelete".to_string(), Value::Bool(true)));
        assert_eq!(
            parse_parameter("creditTypes=ISS,IPI").unwrap().1,
            Value::List(vec![Value::Text("ISS".to_string()), Value::Text("IPI".to_string())])
        );
    }

    #[test]
    fn test_parse_parameter_rejects_malformed_input() {
        assert!(parse_parameter("count").is_err());
        assert!(parse_parameter("=5").is_err());
    }

    #[test]
    fn test_run_arguments_parse() {
        let cli = Cli::try_parse_from(["cmdx", "run", "clear_test_data", "-p", "creditType=ISS", "--undo"]).unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.command_type, "clear_test_data");
                assert_eq!(args.parameters, vec![("creditType".to_string(), Value::Text("ISS".to_string()))]);
                assert!(args.undo);
                assert!(!args.background);
            }
            _ => panic!("expected run")
        }
    }
}
