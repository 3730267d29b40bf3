use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::importer;

/// One reporting period (typically a month) of credit-card spending.
/// `banks` is keyed against the dataset's bank roster; a bank missing from
/// the map reads as zero.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseRecord {
    pub id: Uuid,
    pub date: String,
    pub banks: HashMap<String, f64>,
    pub total: f64,
    pub family: f64,
    pub rent: f64,
    pub periodic: f64,
    pub extra: f64,
    pub note: String,
}

impl ExpenseRecord {
    pub fn bank_amount(&self, bank: &str) -> f64 {
        self.banks.get(bank).copied().unwrap_or(0.0)
    }

    /// Sum of the per-bank amounts. For manually entered records this equals
    /// `total`; for CSV imports the stored total is read verbatim from its
    /// own column and may disagree. Both values are kept and surfaced.
    pub fn bank_sum(&self) -> f64 {
        self.banks.values().sum()
    }

    /// Stored total differs from the bank sum by more than half a unit.
    pub fn has_discrepancy(&self) -> bool {
        (self.total - self.bank_sum()).abs() > 0.5
    }

    /// Chronological ordering key for the period label.
    pub fn sort_key(&self) -> i64 {
        importer::date_sort_key(&self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn record(date: &str, banks: &[(&str, f64)], total: f64) -> ExpenseRecord {
        ExpenseRecord {
            id: Uuid::new_v4(),
            date: date.to_string(),
            banks: banks.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
            total,
            family: 0.0,
            rent: 0.0,
            periodic: 0.0,
            extra: 0.0,
            note: String::new(),
        }
    }

    #[test]
    fn test_bank_amount_missing_is_zero() {
        let rec = record("22/01", &[("中信", 100.0)], 100.0);
        assert_eq!(rec.bank_amount("中信"), 100.0);
        assert_eq!(rec.bank_amount("國泰"), 0.0);
    }

    #[test]
    fn test_bank_sum_and_discrepancy() {
        let rec = record("22/01", &[("中信", 100.0), ("國泰", 50.0)], 150.0);
        assert_eq!(rec.bank_sum(), 150.0);
        assert!(!rec.has_discrepancy());

        let off = record("22/01", &[("中信", 100.0)], 175.0);
        assert!(off.has_discrepancy());
    }

    #[test]
    fn test_sort_key_orders_periods() {
        let a = record("22/12", &[], 0.0);
        let b = record("2023/01", &[], 0.0);
        assert!(a.sort_key() < b.sort_key());
    }
}
