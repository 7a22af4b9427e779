//! Text, JSON and table output for results, histories and statistics

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::{
    domain::{
        result::CommandResult,
        statistics::{CommandAggregate, HistoryStatistics, InvokerStatistics}
    },
    port::command::SharedCommand
};

/// One tracked command as a table row
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct CommandRow {
    #[tabled(rename = "Name")]
    pub name:             String,
    #[tabled(rename = "Type")]
    pub command_type:     String,
    #[tabled(rename = "Status")]
    pub status:           String,
    #[tabled(rename = "Last Executed")]
    pub last_executed_at: String,
    #[tabled(rename = "Time (ms)")]
    pub execution_time:   u64
}

impl From<&SharedCommand> for CommandRow {
    fn from(command: &SharedCommand) -> Self {
        Self {
            name:             command.name().to_string(),
            command_type:     command.command_type().to_string(),
            status:           command.status().to_string(),
            last_executed_at: command
                .last_executed_at()
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
            execution_time:   command.actual_execution_time()
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value:  String
}

impl MetricRow {
    fn new(metric: &str, value: impl ToString) -> Self {
        Self { metric: metric.to_string(), value: value.to_string() }
    }
}

pub fn command_table(commands: &[SharedCommand]) -> String {
    let rows: Vec<CommandRow> = commands.iter().map(CommandRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn invoker_statistics_table(statistics: &InvokerStatistics) -> String {
    let mut rows = vec![
        MetricRow::new("Total", statistics.total_commands),
        MetricRow::new("Successful", statistics.successful_commands),
        MetricRow::new("Failed", statistics.failed_commands),
        MetricRow::new("Cancelled", statistics.cancelled_commands)
    ];
    rows.extend(aggregate_rows(&statistics.aggregate));
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn history_statistics_table(statistics: &HistoryStatistics) -> String {
    let mut rows = vec![
        MetricRow::new("Total", statistics.total_commands),
        MetricRow::new("Executed", statistics.executed_commands),
        MetricRow::new("Undone", statistics.undone_commands)
    ];
    rows.extend(aggregate_rows(&statistics.aggregate));
    Table::new(rows).with(Style::rounded()).to_string()
}

fn aggregate_rows(aggregate: &CommandAggregate) -> Vec<MetricRow> {
    let timestamp = |at: Option<DateTime<Utc>>| {
        at.map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_else(|| "-".to_string())
    };

    let mut rows = vec![
        MetricRow::new("Total Time (ms)", aggregate.total_execution_time),
        MetricRow::new("Average Time (ms)", format!("{:.2}", aggregate.average_execution_time)),
        MetricRow::new("First Command", timestamp(aggregate.first_command_time)),
        MetricRow::new("Last Command", timestamp(aggregate.last_command_time))
    ];
    rows.extend(aggregate.commands_by_type.iter().map(|(kind, count)| MetricRow::new(&format!("Type {}", kind), count)));
    rows
}

/// Render a result as one line of text or as pretty JSON
pub fn render_result(result: &CommandResult, json: bool) -> Result<String> {
    if json {
        serde_json::to_string_pretty(result).context("Failed to serialize command result")
    } else {
        Ok(result.to_string())
    }
}

pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapter::testing::{named, noop},
        domain::value::Value,
        port::command::Command
    };

    #[test]
    fn test_command_table_lists_every_command() {
        let first = noop();
        first.execute().unwrap();
        let second = named("Second", "OTHER");

        let table = command_table(&[first, second]);

        assert!(table.contains("Name"));
        assert!(table.contains("Noop"));
        assert!(table.contains("EXECUTED"));
        assert!(table.contains("Second"));
        assert!(table.contains("CREATED"));
    }

    #[test]
    fn test_statistics_table_includes_counts_by_type() {
        let command = noop();
        command.execute().unwrap();

        let table = invoker_statistics_table(&InvokerStatistics::new(&[command]));

        assert!(table.contains("Successful"));
        assert!(table.contains("Type TEST"));
    }

    #[test]
    fn test_render_result_as_json() {
        let result = CommandResult::success("done", Value::Int(3), 5);

        let json = render_result(&result, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["success"], serde_json::json!(true));
        assert_eq!(parsed["data"], serde_json::json!(3));
        assert_eq!(render_result(&result, false).unwrap(), result.to_string());
    }
}
