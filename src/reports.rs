use crate::models::ExpenseRecord;
use crate::store::Dataset;

/// Derived aggregates over the working dataset. Never stored; recomputed
/// from scratch whenever the dataset changes.
#[derive(Debug)]
pub struct Stats {
    pub total_spent: f64,
    pub avg_spent: f64,
    /// Per-bank totals in roster order.
    pub bank_totals: Vec<(String, f64)>,
    /// Record with the largest total; first occurrence wins a tie.
    pub max_month: Option<ExpenseRecord>,
    /// Records whose stored total disagrees with their bank sum.
    pub discrepancies: usize,
}

pub fn compute_stats(data: &Dataset) -> Stats {
    let total_spent: f64 = data.records.iter().map(|r| r.total).sum();
    let avg_spent = if data.records.is_empty() {
        0.0
    } else {
        total_spent / data.records.len() as f64
    };

    let bank_totals = data
        .bank_names
        .iter()
        .map(|bank| {
            let sum = data.records.iter().map(|r| r.bank_amount(bank)).sum();
            (bank.clone(), sum)
        })
        .collect();

    let mut max_month: Option<&ExpenseRecord> = None;
    for rec in &data.records {
        match max_month {
            Some(best) if best.total >= rec.total => {}
            _ => max_month = Some(rec),
        }
    }

    let discrepancies = data.records.iter().filter(|r| r.has_discrepancy()).count();

    Stats {
        total_spent,
        avg_spent,
        bank_totals,
        max_month: max_month.cloned(),
        discrepancies,
    }
}

/// Search filter for the record table: a record matches when the query
/// appears in its date, or case-insensitively in its note.
pub fn matches_query(record: &ExpenseRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    record.date.contains(query)
        || record.note.to_lowercase().contains(&query.to_lowercase())
}

/// Record indices in chronological order (unparseable dates first).
pub fn chronological(data: &Dataset) -> Vec<usize> {
    let mut order: Vec<usize> = (0..data.records.len()).collect();
    order.sort_by_key(|&i| data.records[i].sort_key());
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn record(date: &str, banks: &[(&str, f64)], total: f64, note: &str) -> ExpenseRecord {
        ExpenseRecord {
            id: Uuid::new_v4(),
            date: date.to_string(),
            banks: banks.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
            total,
            family: 0.0,
            rent: 0.0,
            periodic: 0.0,
            extra: 0.0,
            note: note.to_string(),
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            bank_names: vec!["中信".to_string(), "國泰".to_string()],
            records: vec![
                record("22/01", &[("中信", 60.0), ("國泰", 40.0)], 100.0, "january"),
                record("22/02", &[("中信", 300.0)], 300.0, ""),
                record("22/03", &[("國泰", 150.0)], 200.0, "trip"),
            ],
        }
    }

    #[test]
    fn test_stats_aggregation() {
        let stats = compute_stats(&dataset());
        assert_eq!(stats.total_spent, 600.0);
        assert_eq!(stats.avg_spent, 200.0);
        assert_eq!(stats.max_month.as_ref().unwrap().total, 300.0);
        assert_eq!(stats.max_month.unwrap().date, "22/02");
    }

    #[test]
    fn test_bank_totals_in_roster_order() {
        let stats = compute_stats(&dataset());
        assert_eq!(
            stats.bank_totals,
            vec![("中信".to_string(), 360.0), ("國泰".to_string(), 190.0)]
        );
    }

    #[test]
    fn test_max_month_tie_keeps_first() {
        let mut data = dataset();
        data.records[0].total = 300.0;
        let stats = compute_stats(&data);
        assert_eq!(stats.max_month.unwrap().date, "22/01");
    }

    #[test]
    fn test_empty_dataset_stats() {
        let stats = compute_stats(&Dataset::default());
        assert_eq!(stats.total_spent, 0.0);
        assert_eq!(stats.avg_spent, 0.0);
        assert!(stats.max_month.is_none());
        assert!(stats.bank_totals.is_empty());
    }

    #[test]
    fn test_discrepancy_count() {
        let stats = compute_stats(&dataset());
        // 22/03 stores total 200 against a bank sum of 150.
        assert_eq!(stats.discrepancies, 1);
    }

    #[test]
    fn test_matches_query() {
        let rec = record("22/01", &[], 0.0, "Jeju Trip");
        assert!(matches_query(&rec, ""));
        assert!(matches_query(&rec, "22/0"));
        assert!(matches_query(&rec, "trip"));
        assert!(!matches_query(&rec, "hotel"));
    }

    #[test]
    fn test_chronological_order() {
        let data = Dataset {
            bank_names: vec![],
            records: vec![
                record("23/01", &[], 0.0, ""),
                record("garbage", &[], 0.0, ""),
                record("22/12", &[], 0.0, ""),
            ],
        };
        assert_eq!(chronological(&data), vec![1, 2, 0]);
    }
}
