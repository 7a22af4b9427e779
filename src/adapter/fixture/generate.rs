//! Random but valid tax-credit fixtures
//!
//! Records are laid out in invoice blocks: credit `n` (1-based) belongs to invoice
//! `(n - 1) / credits_per_invoice + 1`. Undo removes exactly the records the last run created.

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use rand::{Rng, seq::SliceRandom};
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

pub const NAME: &str = "GenerateTestData";
pub const DESCRIPTION: &str = "Generates tax-credit test data";
pub const COMMAND_TYPE: &str = "TEST_DATA_GENERATION";

/// Parameter keys understood by the generator
pub mod param {
    pub const COUNT: &str = "count";
    pub const INVOICE_COUNT: &str = "invoiceCount";
    pub const CREDITS_PER_INVOICE: &str = "creditsPerInvoice";
    pub const CREDIT_TYPES: &str = "creditTypes";
    pub const AMOUNT_MIN: &str = "amountMin";
    pub const AMOUNT_MAX: &str = "amountMax";
    pub const RATE_MIN: &str = "rateMin";
    pub const RATE_MAX: &str = "rateMax";
    pub const DEDUCTION_PERCENT: &str = "deductionPercent";
    pub const DAYS_BACK: &str = "daysBack";
}

pub const DEFAULT_COUNT: usize = 300;
pub const DEFAULT_INVOICE_COUNT: usize = 10;
pub const DEFAULT_CREDITS_PER_INVOICE: usize = 30;
pub const DEFAULT_CREDIT_TYPES: [&str; 7] = ["ISS", "IPI", "ICMS", "PIS", "COFINS", "IR", "CSLL"];
pub const MAX_COUNT: usize = 1_000_000;
/// About a century
pub const MAX_DAYS_BACK: i64 = 36_500;

/// Typed view of the generator's parameter bag
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateConfig {
    /// Total records to create
    pub count:               usize,
    pub invoice_count:       usize,
    pub credits_per_invoice: usize,
    pub credit_types:        Vec<String>,
    pub amount_min:          f64,
    pub amount_max:          f64,
    pub rate_min:            f64,
    pub rate_max:            f64,
    /// Upper bound of the deduction as a fraction of the invoiced amount
    pub deduction_percent:   f64,
    pub days_back:           i64
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            count:               DEFAULT_COUNT,
            invoice_count:       DEFAULT_INVOICE_COUNT,
            credits_per_invoice: DEFAULT_CREDITS_PER_INVOICE,
            credit_types:        DEFAULT_CREDIT_TYPES.iter().map(|t| t.to_string()).collect(),
            amount_min:          1000.0,
            amount_max:          50000.0,
            rate_min:            1.0,
            rate_max:            15.0,
            deduction_percent:   0.3,
            days_back:           365
        }
    }
}

impl GenerateConfig {
    /// Decode the bag; missing keys take defaults, present keys must have the right type and range
    ///
    /// Without an explicit `count` the total is `invoiceCount * creditsPerInvoice`.
    pub fn from_parameters(command: &str, parameters: &Parameters) -> Result<Self, CommandError> {
        let defaults = Self::default();

        let invoice_count = positive(command, parameters, param::INVOICE_COUNT)?.unwrap_or(defaults.invoice_count);
        let credits_per_invoice =
            positive(command, parameters, param::CREDITS_PER_INVOICE)?.unwrap_or(defaults.credits_per_invoice);
        let count = match positive(command, parameters, param::COUNT)? {
            Some(count) => count,
            None => invoice_count.checked_mul(credits_per_invoice).ok_or_else(|| {
                CommandError::validation(command, param::COUNT, "invoiceCount times creditsPerInvoice is too large")
            })?
        };
        if count > MAX_COUNT {
            return Err(CommandError::validation(command, param::COUNT, format!("count must not exceed {}", MAX_COUNT)));
        }

        let credit_types = match parameters.get(param::CREDIT_TYPES) {
            None => defaults.credit_types,
            Some(Value::Text(single)) => vec![single.clone()],
            Some(_) => parameters.require::<Vec<String>>(command, param::CREDIT_TYPES)?
        };
        if credit_types.is_empty() || credit_types.iter().any(|t| t.trim().is_empty()) {
            return Err(CommandError::validation(command, param::CREDIT_TYPES, "credit types must be non-blank"));
        }

        let amount_min = parameters.decode(command, param::AMOUNT_MIN)?.unwrap_or(defaults.amount_min);
        let amount_max: f64 = parameters.decode(command, param::AMOUNT_MAX)?.unwrap_or(defaults.amount_max);
        if !amount_max.is_finite() {
            return Err(CommandError::validation(command, param::AMOUNT_MAX, "maximum amount must be a finite number"));
        }
        if !amount_min.is_finite() || amount_min <= 0.0 || amount_min >= amount_max {
            return Err(CommandError::validation(
                command,
                param::AMOUNT_MIN,
                "minimum amount must be positive and lower than the maximum"
            ));
        }

        let rate_min = parameters.decode(command, param::RATE_MIN)?.unwrap_or(defaults.rate_min);
        let rate_max: f64 = parameters.decode(command, param::RATE_MAX)?.unwrap_or(defaults.rate_max);
        if !rate_max.is_finite() {
            return Err(CommandError::validation(command, param::RATE_MAX, "maximum rate must be a finite number"));
        }
        if !rate_min.is_finite() || rate_min < 0.0 || rate_min >= rate_max || rate_max > 100.0 {
            return Err(CommandError::validation(
                command,
                param::RATE_MIN,
                "minimum rate must be lower than the maximum, both within 0 and 100"
            ));
        }

        let deduction_percent =
            parameters.decode(command, param::DEDUCTION_PERCENT)?.unwrap_or(defaults.deduction_percent);
        if !(0.0..=1.0).contains(&deduction_percent) {
            return Err(CommandError::validation(
                command,
                param::DEDUCTION_PERCENT,
                "deduction percentage must be between 0 and 1"
            ));
        }

        let days_back = parameters.decode::<i64>(command, param::DAYS_BACK)?.unwrap_or(defaults.days_back);
        if !(1..=MAX_DAYS_BACK).contains(&days_back) {
            return Err(CommandError::validation(
                command,
                param::DAYS_BACK,
                format!("days back must be between 1 and {}", MAX_DAYS_BACK)
            ));
        }

        Ok(Self {
            count,
            invoice_count,
            credits_per_invoice,
            credit_types,
            amount_min,
            amount_max,
            rate_min,
            rate_max,
            deduction_percent,
            days_back
        })
    }

    /// Number of invoices the records actually spread over
    pub fn invoices_used(&self) -> usize {
        self.count.div_ceil(self.credits_per_invoice)
    }

    pub fn build_records(&self, rng: &mut impl Rng, today: NaiveDate) -> Vec<FixtureRecord> {
        (0..self.count)
            .map(|index| {
                let invoice = index / self.credits_per_invoice + 1;
                let invoiced = rng.gen_range(self.amount_min..self.amount_max);
                let deduction = invoiced * rng.gen_range(0.0..=self.deduction_percent);
                let credit_type = self.credit_types.choose(&mut *rng).cloned().unwrap_or_default();

                FixtureRecord::new(
                    format!("{}{:06}", TEST_NUMBER_PREFIX, index + 1),
                    format!("{}{:03}", TEST_INVOICE_PREFIX, invoice),
                    today - Duration::days(rng.gen_range(0..self.days_back)),
                    credit_type,
                    rng.gen_range(self.rate_min..self.rate_max),
                    invoiced,
                    deduction,
                    rng.gen_bool(0.5)
                )
            })
            .collect()
    }
}

fn positive(command: &str, parameters: &Parameters, key: &str) -> Result<Option<usize>, CommandError> {
    match parameters.decode::<i64>(command, key)? {
        Some(value) if value <= 0 => {
            Err(CommandError::validation(command, key, format!("{} must be greater than zero", key)))
        }
        Some(value) => Ok(Some(value as usize)),
        None => Ok(None)
    }
}

pub struct GenerateTestData {
    store:     Arc<dyn FixtureStore>,
    generated: Vec<FixtureRecord>
}

impl GenerateTestData {
    pub fn new(store: Arc<dyn FixtureStore>) -> Self {
        Self { store, generated: Vec::new() }
    }
}

impl CommandBody for GenerateTestData {
    fn perform(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult> {
        let config = GenerateConfig::from_parameters(&context.command_name, &context.parameters)?;
        let records = config.build_records(&mut rand::thread_rng(), Local::now().date_naive());
        context.ensure_not_cancelled()?;

        self.generated = self.store.save_all(records)?;
        let generated = self.generated.len();
        event!(Level::INFO, event = fixture::RECORDS_GENERATED, count = generated,
            invoices = config.invoices_used());

        let mut metadata = Metadata::new();
        metadata.insert("generatedCount".to_string(), Value::from(generated));
        metadata.insert("invoiceCount".to_string(), Value::from(config.invoices_used()));
        metadata.insert("creditsPerInvoice".to_string(), Value::from(config.credits_per_invoice));
        metadata.insert("creditTypes".to_string(), Value::from(config.credit_types.clone()));
        metadata.insert(
            "amountRange".to_string(),
            Value::from(format!("{:.2} - {:.2}", config.amount_min, config.amount_max))
        );
        metadata.insert("rateRange".to_string(), Value::from(format!("{:.2}% - {:.2}%", config.rate_min, config.rate_max)));

        Ok(CommandResult::success_with_metadata(
            format!("generated {} test records across {} invoices", generated, config.invoices_used()),
            Value::from(generated),
            context.elapsed_ms(),
            metadata
        ))
    }

    fn reverse(&mut self, context: &CommandContext) -> anyhow::Result<CommandResult> {
        if self.generated.is_empty() {
            return Ok(CommandResult::success("no generated test data to remove", Value::Int(0), context.elapsed_ms()));
        }

        let removed = self.store.delete_all(&self.generated)?;
        self.generated.clear();
        event!(Level::INFO, event = fixture::RECORDS_DELETED, count = removed);

        Ok(CommandResult::success(format!("removed {} test records", removed), Value::from(removed), context.elapsed_ms()))
    }

    fn validate(&self, command_name: &str, parameters: &Parameters) -> Result<(), CommandError> {
        GenerateConfig::from_parameters(command_name, parameters).map(|_| ())
    }

    /// 10 ms per record plus a fixed overhead
    fn estimated_execution_time(&self, parameters: &Parameters) -> u64 {
        let layout = parameters
            .get_or(param::INVOICE_COUNT, DEFAULT_INVOICE_COUNT)
            .saturating_mul(parameters.get_or(param::CREDITS_PER_INVOICE, DEFAULT_CREDITS_PER_INVOICE));
        let count = parameters.get_or(param::COUNT, layout);
        (count as u64).saturating_mul(10).saturating_add(1000)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        adapter::{base::BaseCommand, fixture::store::InMemoryFixtureStore},
        domain::status::CommandStatus,
        port::command::Command
    };

    fn command(store: Arc<InMemoryFixtureStore>, parameters: Parameters) -> BaseCommand<GenerateTestData> {
        BaseCommand::new(NAME, DESCRIPTION, COMMAND_TYPE, GenerateTestData::new(store)).with_parameters(parameters)
    }

    #[test]
    fn test_generate_and_undo_three_hundred() {
        let store = Arc::new(InMemoryFixtureStore::new());
        let generate = command(store.clone(), Parameters::new().with(param::COUNT, 300));

        let result = generate.execute().unwrap();

        assert!(result.is_success());
        assert_eq!(result.data_as::<i64>().unwrap(), Some(300));
        assert_eq!(result.metadata_as::<i64>("generatedCount").unwrap(), Some(300));
        assert_eq!(result.metadata_as::<i64>("invoiceCount").unwrap(), Some(10));
        assert_eq!(store.count().unwrap(), 300);

        let undone = generate.undo().unwrap();

        assert_eq!(undone.data_as::<i64>().unwrap(), Some(300));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_layout_without_count_multiplies() {
        let parameters = Parameters::new().with(param::INVOICE_COUNT, 4).with(param::CREDITS_PER_INVOICE, 5);

        let config = GenerateConfig::from_parameters(NAME, &parameters).unwrap();

        assert_eq!(config.count, 20);
        assert_eq!(config.invoices_used(), 4);
    }

    #[test]
    fn test_records_follow_block_layout_and_ranges() {
        let config = GenerateConfig { count: 7, credits_per_invoice: 3, ..GenerateConfig::default() };
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();

        let records = config.build_records(&mut StdRng::seed_from_u64(7), today);

        assert_eq!(records.len(), 7);
        assert_eq!(records[0].number, "TEST000001");
        assert_eq!(records[2].invoice_number, "TEST_INV001");
        assert_eq!(records[3].invoice_number, "TEST_INV002");
        assert_eq!(records[6].invoice_number, "TEST_INV003");
        for record in &records {
            assert!(record.inconsistencies().is_empty(), "{:?}", record.inconsistencies());
            assert!(record.invoiced_amount >= 1000.0 && record.invoiced_amount <= 50000.0);
            assert!(record.deduction_amount <= record.invoiced_amount * 0.3 + 0.01);
            assert!(record.constituted_on <= today && record.constituted_on > today - Duration::days(365));
        }
    }

    #[test]
    fn test_validation_rejects_bad_ranges() {
        let cases = [
            (Parameters::new().with(param::COUNT, 0), param::COUNT),
            (Parameters::new().with(param::AMOUNT_MIN, 500.0).with(param::AMOUNT_MAX, 100.0), param::AMOUNT_MIN),
            (Parameters::new().with(param::RATE_MIN, 20.0), param::RATE_MIN),
            (Parameters::new().with(param::DEDUCTION_PERCENT, 1.5), param::DEDUCTION_PERCENT),
            (Parameters::new().with(param::DAYS_BACK, -1), param::DAYS_BACK),
            (Parameters::new().with(param::DAYS_BACK, i64::MAX), param::DAYS_BACK),
            (Parameters::new().with(param::COUNT, "many"), param::COUNT),
            (Parameters::new().with(param::COUNT, MAX_COUNT + 1), param::COUNT),
            (Parameters::new().with(param::AMOUNT_MAX, f64::INFINITY), param::AMOUNT_MAX),
            (Parameters::new().with(param::AMOUNT_MIN, f64::NAN), param::AMOUNT_MIN),
            (Parameters::new().with(param::RATE_MAX, f64::NAN), param::RATE_MAX),
            (Parameters::new().with(param::RATE_MIN, f64::NEG_INFINITY), param::RATE_MIN)
        ];

        for (parameters, field) in cases {
            let store = Arc::new(InMemoryFixtureStore::new());
            let error = command(store.clone(), parameters).execute().unwrap_err();
            assert_eq!(error.field(), Some(field));
            assert_eq!(store.count().unwrap(), 0);
        }
    }

    #[test]
    fn test_oversized_layout_fails_validation() {
        let store = Arc::new(InMemoryFixtureStore::new());
        let parameters =
            Parameters::new().with(param::INVOICE_COUNT, 1i64 << 32).with(param::CREDITS_PER_INVOICE, 1i64 << 32);
        let generate = command(store.clone(), parameters);

        assert_eq!(generate.estimated_execution_time(), u64::MAX);
        let error = generate.execute().unwrap_err();

        assert!(error.is_validation());
        assert_eq!(error.field(), Some(param::COUNT));
        assert_eq!(generate.status(), CommandStatus::Failed);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_single_credit_type_literal_is_accepted() {
        let config = GenerateConfig::from_parameters(NAME, &Parameters::new().with(param::CREDIT_TYPES, "ISS")).unwrap();

        assert_eq!(config.credit_types, vec!["ISS".to_string()]);
    }

    #[test]
    fn test_estimate() {
        let store = Arc::new(InMemoryFixtureStore::new());

        assert_eq!(command(store.clone(), Parameters::new()).estimated_execution_time(), 4000);
        assert_eq!(command(store, Parameters::new().with(param::COUNT, 50)).estimated_execution_time(), 1500);
    }

    #[test]
    fn test_undo_before_anything_stored_reports_zero() {
        let mut body = GenerateTestData::new(Arc::new(InMemoryFixtureStore::new()));
        let context = CommandContext::new(NAME, Parameters::new(), Default::default());

        let result = body.reverse(&context).unwrap();

        assert_eq!(result.data_as::<i64>().unwrap(), Some(0));
    }
}
