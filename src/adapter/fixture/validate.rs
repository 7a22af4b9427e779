use std::sync::Arc;

use tracing::{Level, event};

use crate::{
    domain::{
        constant::fixture,
        result::{CommandResult, Metadata},
        value::{Parameters, Value}
    },
    port::{
        command::{CommandBody, CommandContext, DEFAULT_ESTIMATED_EXECUTION_TIME_MS},
        fixture::FixtureStore
    }
};

pub const NAME: &str = "ValidateTestData";
pub const DESCRIPTION: &str = "Checks stored test data for inconsistent records";
pub const COMMAND_TYPE: &str = "VALIDATE_TEST_DATA";

/// Issues listed in the result metadata; the counts always cover every record
const REPORTED_ISSUES: usize = 20;

/// Read-only scan of stored test records
pub struct ValidateTestData {
    store: Arc<dyn FixtureStore>
}

impl ValidateTestData {
    pub fn new(store: Arc<dyn FixtureStore>) -> Self {
        Self { store }
    }
}

impl CommandBody for ValidateTestData {
    fn perform(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult> {
        let records = self.store.find_test_records()?;

        let mut invalid = 0usize;
        let mut issues = Vec::new();
        for record in &records {
            let problems = record.inconsistencies();
            if !problems.is_empty() {
                invalid += 1;
                issues.extend(problems);
            }
        }
        event!(Level::INFO, event = fixture::RECORDS_VALIDATED, checked = records.len(), invalid = invalid);

        let mut metadata = Metadata::new();
        metadata.insert("checkedCount".to_string(), Value::from(records.len()));
        metadata.insert("invalidCount".to_string(), Value::from(invalid));
        metadata.insert("valid".to_string(), Value::from(invalid == 0));
        metadata.insert("issues".to_string(), Value::from(issues.into_iter().take(REPORTED_ISSUES).collect::<Vec<_>>()));

        let message = if invalid == 0 {
            format!("validated {} test records", records.len())
        } else {
            format!("{} of {} test records are inconsistent", invalid, records.len())
        };

        Ok(CommandResult::success_with_metadata(message, Value::from(records.len()), context.elapsed_ms(), metadata))
    }

    fn reverse(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult> {
        Ok(CommandResult::success("validation cannot be undone", None, context.elapsed_ms()))
    }

    fn estimated_execution_time(&self, _parameters: &Parameters) -> u64 {
        self.store.count().map(|count| count as u64 + 100).unwrap_or(DEFAULT_ESTIMATED_EXECUTION_TIME_MS)
    }
}
