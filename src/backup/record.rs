//! The file interchange format for exporting and importing the ledger.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::transaction::{Transaction, TransactionKind};

/// One transaction in the interchange file.
///
/// The same shape is used symmetrically for export and import, so a
/// round-trip is loss-free apart from the server reassigning ids. Ownership
/// and creation timestamps are deliberately not part of the format: imports
/// always append to the ledger of the user doing the importing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// The row id the transaction had when it was exported. Ignored on
    /// import, where the database assigns a fresh id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The amount of money earned or spent.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// Cached display string for `date`. Filled in from `date` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_date: Option<String>,
}

impl From<&Transaction> for TransactionRecord {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: Some(transaction.id),
            kind: transaction.kind,
            amount: transaction.amount,
            description: transaction.description.clone(),
            date: transaction.date,
            formatted_date: Some(transaction.formatted_date.clone()),
        }
    }
}
