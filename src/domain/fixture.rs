//! Tax-credit fixture records manipulated by the built-in test-data commands

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix every generated credit number starts with
pub const TEST_NUMBER_PREFIX: &str = "TEST";
/// Prefix every generated invoice number starts with
pub const TEST_INVOICE_PREFIX: &str = "TEST_INV";

/// One tax credit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub id:                Uuid,
    /// Credit number, `TEST000001` for generated rows
    pub number:            String,
    /// Invoice the credit belongs to, `TEST_INV001` for generated rows
    pub invoice_number:    String,
    pub constituted_on:    NaiveDate,
    pub credit_type:       String,
    /// Percentage, e.g. `5.00`
    pub rate:              f64,
    pub invoiced_amount:   f64,
    pub deduction_amount:  f64,
    /// `invoiced_amount - deduction_amount`
    pub calculation_base:  f64,
    /// `calculation_base * rate / 100`
    pub tax_amount:        f64,
    pub simplified_regime: bool
}

impl FixtureRecord {
    /// Build a record, deriving the calculation base and the tax amount
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: impl Into<String>,
        invoice_number: impl Into<String>,
        constituted_on: NaiveDate,
        credit_type: impl Into<String>,
        rate: f64,
        invoiced_amount: f64,
        deduction_amount: f64,
        simplified_regime: bool
    ) -> Self {
        let rate = round_cents(rate);
        let invoiced_amount = round_cents(invoiced_amount);
        let deduction_amount = round_cents(deduction_amount);
        let calculation_base = round_cents(invoiced_amount - deduction_amount);

        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            invoice_number: invoice_number.into(),
            constituted_on,
            credit_type: credit_type.into(),
            rate,
            invoiced_amount,
            deduction_amount,
            calculation_base,
            tax_amount: round_cents(calculation_base * rate / 100.0),
            simplified_regime
        }
    }

    /// Generated rows are recognised by their number prefix
    pub fn is_test_record(&self) -> bool {
        self.number.starts_with(TEST_NUMBER_PREFIX)
    }

    /// Reasons this record is internally inconsistent, empty when it is sound
    pub fn inconsistencies(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.invoiced_amount <= 0.0 {
            problems.push(format!("{}: invoiced amount must be positive", self.number));
        }
        if self.deduction_amount < 0.0 || self.deduction_amount > self.invoiced_amount {
            problems.push(format!("{}: deduction outside [0, invoiced amount]", self.number));
        }
        if !(0.0..=100.0).contains(&self.rate) {
            problems.push(format!("{}: rate {} is not a percentage", self.number, self.rate));
        }
        if (self.calculation_base - round_cents(self.invoiced_amount - self.deduction_amount)).abs() > 0.01 {
            problems.push(format!("{}: calculation base does not match invoiced minus deduction", self.number));
        }
        if (self.tax_amount - round_cents(self.calculation_base * self.rate / 100.0)).abs() > 0.01 {
            problems.push(format!("{}: tax amount does not match base times rate", self.number));
        }
        if self.credit_type.trim().is_empty() {
            problems.push(format!("{}: credit type is blank", self.number));
        }

        problems
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FixtureRecord {
        FixtureRecord::new(
            "TEST000001",
            "TEST_INV001",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "ISS",
            5.0,
            1000.0,
            200.0,
            false
        )
    }

    #[test]
    fn test_new_derives_base_and_tax() {
        let record = sample();

        assert_eq!(record.calculation_base, 800.0);
        assert_eq!(record.tax_amount, 40.0);
        assert!(record.is_test_record());
        assert!(record.inconsistencies().is_empty());
    }

    #[test]
    fn test_inconsistencies_are_reported() {
        let mut record = sample();
        record.deduction_amount = 5000.0;
        record.tax_amount = 1.0;

        let problems = record.inconsistencies();

        assert!(problems.iter().any(|p| p.contains("deduction")));
        assert!(problems.iter().any(|p| p.contains("tax amount")));
    }
}
