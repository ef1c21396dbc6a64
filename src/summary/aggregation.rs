//! Pure monthly aggregation feeding the summary charts.

use serde::Serialize;
use time::Date;

use crate::backup::TransactionRecord;

/// The income/expense totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// The month key, e.g. "2025-04".
    pub month: String,
    /// The sum of income amounts in the month.
    pub income: f64,
    /// The sum of expense amounts in the month.
    pub expense: f64,
    /// `income - expense` for the month.
    pub balance: f64,
}

/// The "YYYY-MM" grouping key for a date.
pub fn month_key(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// Group `records` by calendar month, accumulating income and expense sums
/// per group.
///
/// Groups appear in the order their month is first seen in the input
/// sequence, not chronologically. The ledger hands the summary its
/// newest-first snapshot, so the chart axis reflects that order.
pub fn monthly_summary(records: &[TransactionRecord]) -> Vec<MonthlySummary> {
    let mut summaries: Vec<MonthlySummary> = Vec::new();

    for record in records {
        let month = month_key(record.date);

        let summary = match summaries.iter_mut().find(|summary| summary.month == month) {
            Some(summary) => summary,
            None => {
                summaries.push(MonthlySummary {
                    month,
                    income: 0.0,
                    expense: 0.0,
                    balance: 0.0,
                });
                summaries.last_mut().expect("just pushed")
            }
        };

        match record.kind {
            crate::transaction::TransactionKind::Income => summary.income += record.amount,
            crate::transaction::TransactionKind::Expense => summary.expense += record.amount,
        }
        summary.balance = summary.income - summary.expense;
    }

    summaries
}

/// The (income, expense) totals of the records that fall in `month`.
///
/// Feeds the pie chart for the selected month.
pub fn month_breakdown(records: &[TransactionRecord], month: &str) -> (f64, f64) {
    records
        .iter()
        .filter(|record| month_key(record.date) == month)
        .fold((0.0, 0.0), |(income, expense), record| match record.kind {
            crate::transaction::TransactionKind::Income => (income + record.amount, expense),
            crate::transaction::TransactionKind::Expense => (income, expense + record.amount),
        })
}

#[cfg(test)]
mod aggregation_tests {
    use time::macros::date;

    use crate::{backup::TransactionRecord, transaction::TransactionKind};

    use super::{MonthlySummary, month_breakdown, month_key, monthly_summary};

    fn record(kind: TransactionKind, amount: f64, date: time::Date) -> TransactionRecord {
        TransactionRecord {
            id: None,
            kind,
            amount,
            description: String::new(),
            date,
            formatted_date: None,
        }
    }

    #[test]
    fn month_key_pads_the_month() {
        assert_eq!(month_key(date!(2025 - 04 - 22)), "2025-04");
        assert_eq!(month_key(date!(2025 - 12 - 01)), "2025-12");
    }

    #[test]
    fn sums_income_and_expense_per_month() {
        let records = vec![
            record(TransactionKind::Income, 1000.0, date!(2025 - 04 - 01)),
            record(TransactionKind::Expense, 300.0, date!(2025 - 04 - 15)),
            record(TransactionKind::Income, 500.0, date!(2025 - 05 - 01)),
        ];

        let summaries = monthly_summary(&records);

        assert_eq!(
            summaries,
            vec![
                MonthlySummary {
                    month: "2025-04".to_owned(),
                    income: 1000.0,
                    expense: 300.0,
                    balance: 700.0,
                },
                MonthlySummary {
                    month: "2025-05".to_owned(),
                    income: 500.0,
                    expense: 0.0,
                    balance: 500.0,
                },
            ]
        );
    }

    #[test]
    fn groups_follow_first_occurrence_order() {
        // A newest-first snapshot: May appears before April, so the May group
        // must come first even though April is chronologically earlier.
        let records = vec![
            record(TransactionKind::Income, 500.0, date!(2025 - 05 - 01)),
            record(TransactionKind::Expense, 300.0, date!(2025 - 04 - 15)),
            record(TransactionKind::Income, 1000.0, date!(2025 - 04 - 01)),
        ];

        let summaries = monthly_summary(&records);

        let months: Vec<&str> = summaries
            .iter()
            .map(|summary| summary.month.as_str())
            .collect();
        assert_eq!(months, vec!["2025-05", "2025-04"]);
    }

    #[test]
    fn empty_input_produces_no_groups() {
        assert!(monthly_summary(&[]).is_empty());
    }

    #[test]
    fn breakdown_filters_to_one_month() {
        let records = vec![
            record(TransactionKind::Income, 1000.0, date!(2025 - 04 - 01)),
            record(TransactionKind::Expense, 300.0, date!(2025 - 04 - 15)),
            record(TransactionKind::Income, 500.0, date!(2025 - 05 - 01)),
        ];

        assert_eq!(month_breakdown(&records, "2025-04"), (1000.0, 300.0));
        assert_eq!(month_breakdown(&records, "2025-05"), (500.0, 0.0));
        assert_eq!(month_breakdown(&records, "2025-06"), (0.0, 0.0));
    }
}
