//! Confirmed removal of stored test fixtures, restorable by undo

use std::sync::Arc;

use tracing::{Level, event};

use crate::{
    domain::{
        constant::fixture,
        error::CommandError,
        fixture::{FixtureRecord, TEST_INVOICE_PREFIX, TEST_NUMBER_PREFIX},
        result::{CommandResult, Metadata},
        value::{Parameters, Value}
    },
    port::{
        command::{CommandBody, CommandContext},
        fixture::FixtureStore
    }
};

pub const NAME: &str = "DeleteTestData";
pub const DESCRIPTION: &str = "Removes tax-credit test data";
pub const COMMAND_TYPE: &str = "TEST_DATA_DELETION";

/// Parameter keys understood by the deleter
pub mod param {
    pub const DELETE_ALL: &str = "deleteAll";
    pub const NUMBER_PREFIX: &str = "numberPrefix";
    pub const INVOICE_PREFIX: &str = "invoicePrefix";
    pub const CREDIT_TYPE: &str = "creditType";
    pub const SIMPLIFIED_REGIME: &str = "simplifiedRegime";
    pub const CONFIRM_DELETE: &str = "confirmDelete";
}

/// Estimate for a full sweep, in milliseconds
pub const DELETE_ALL_ESTIMATE_MS: u64 = 2000;
/// Estimate for a filtered sweep, in milliseconds
pub const FILTERED_ESTIMATE_MS: u64 = 500;

/// Typed view of the deleter's parameter bag
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteFilter {
    pub delete_all:        bool,
    pub number_prefix:     String,
    pub invoice_prefix:    String,
    pub credit_type:       Option<String>,
    pub simplified_regime: Option<bool>,
    pub confirmed:         bool
}

impl Default for DeleteFilter {
    fn default() -> Self {
        Self {
            delete_all:        true,
            number_prefix:     TEST_NUMBER_PREFIX.to_string(),
            invoice_prefix:    TEST_INVOICE_PREFIX.to_string(),
            credit_type:       None,
            simplified_regime: None,
            confirmed:         false
        }
    }
}

impl DeleteFilter {
    /// Decode the bag; present keys must have the right type and text values must not be blank
    pub fn from_parameters(command: &str, parameters: &Parameters) -> Result<Self, CommandError> {
        let defaults = Self::default();

        Ok(Self {
            delete_all:        parameters.decode(command, param::DELETE_ALL)?.unwrap_or(defaults.delete_all),
            number_prefix:     non_blank(command, parameters, param::NUMBER_PREFIX)?
                .unwrap_or(defaults.number_prefix),
            invoice_prefix:    non_blank(command, parameters, param::INVOICE_PREFIX)?
                .unwrap_or(defaults.invoice_prefix),
            credit_type:       non_blank(command, parameters, param::CREDIT_TYPE)?,
            simplified_regime: parameters.decode(command, param::SIMPLIFIED_REGIME)?,
            confirmed:         parameters.decode(command, param::CONFIRM_DELETE)?.unwrap_or(defaults.confirmed)
        })
    }

    pub fn matches(&self, record: &FixtureRecord) -> bool {
        record.number.starts_with(&self.number_prefix)
            && record.invoice_number.starts_with(&self.invoice_prefix)
            && self.credit_type.as_ref().is_none_or(|t| &record.credit_type == t)
            && self.simplified_regime.is_none_or(|regime| record.simplified_regime == regime)
    }

    fn metadata(&self, deleted: usize) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("deletedCount".to_string(), Value::from(deleted));
        metadata.insert(param::DELETE_ALL.to_string(), Value::from(self.delete_all));
        metadata.insert(param::NUMBER_PREFIX.to_string(), Value::from(self.number_prefix.clone()));
        metadata.insert(param::INVOICE_PREFIX.to_string(), Value::from(self.invoice_prefix.clone()));
        if let Some(credit_type) = &self.credit_type {
            metadata.insert(param::CREDIT_TYPE.to_string(), Value::from(credit_type.clone()));
        }
        if let Some(regime) = self.simplified_regime {
            metadata.insert(param::SIMPLIFIED_REGIME.to_string(), Value::from(regime));
        }
        metadata
    }
}

fn non_blank(command: &str, parameters: &Parameters, key: &str) -> Result<Option<String>, CommandError> {
    match parameters.decode::<String>(command, key)? {
        Some(value) if value.trim().is_empty() => {
            Err(CommandError::validation(command, key, format!("{} must not be blank", key)))
        }
        other => Ok(other)
    }
}

pub struct DeleteTestData {
    store:   Arc<dyn FixtureStore>,
    deleted: Vec<FixtureRecord>
}

impl DeleteTestData {
    pub fn new(store: Arc<dyn FixtureStore>) -> Self {
        Self { store, deleted: Vec::new() }
    }
}

impl CommandBody for DeleteTestData {
    fn perform(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult> {
        let filter = DeleteFilter::from_parameters(&context.command_name, &context.parameters)?;

        let mut candidates = self.store.find_test_records()?;
        if !filter.delete_all {
            candidates.retain(|record| filter.matches(record));
        }
        if candidates.is_empty() {
            self.deleted.clear();
            return Ok(CommandResult::success("no test records found to delete", Value::Int(0), context.elapsed_ms()));
        }

        context.ensure_not_cancelled()?;
        let deleted = self.store.delete_all(&candidates)?;
        self.deleted = candidates;
        event!(Level::INFO, event = fixture::RECORDS_DELETED, count = deleted, delete_all = filter.delete_all);

        Ok(CommandResult::success_with_metadata(
            format!("deleted {} test records", deleted),
            Value::from(deleted),
            context.elapsed_ms(),
            filter.metadata(deleted)
        ))
    }

    fn reverse(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult> {
        if self.deleted.is_empty() {
            return Ok(CommandResult::success("no deleted data to restore", Value::Int(0), context.elapsed_ms()));
        }

        let restored = self.store.save_all(std::mem::take(&mut self.deleted))?.len();
        event!(Level::INFO, event = fixture::RECORDS_RESTORED, count = restored);

        Ok(CommandResult::success(format!("restored {} test records", restored), Value::from(restored), context.elapsed_ms()))
    }

    /// Deletion must be explicitly confirmed before anything runs
    fn validate(&self, command_name: &str, parameters: &Parameters) -> Result<(), CommandError> {
        let filter = DeleteFilter::from_parameters(command_name, parameters)?;
        if !filter.confirmed {
            return Err(CommandError::validation(
                command_name,
                param::CONFIRM_DELETE,
                "deletion not confirmed; set confirmDelete=true to proceed"
            ));
        }
        Ok(())
    }

    fn estimated_execution_time(&self, parameters: &Parameters) -> u64 {
        if parameters.get_or(param::DELETE_ALL, true) { DELETE_ALL_ESTIMATE_MS } else { FILTERED_ESTIMATE_MS }
    }
}
