//! Transaction management for the ledger.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its income/expense kind
//! - Database functions for storing, querying and bulk deleting transactions
//! - The JSON API endpoints for listing, creating and resetting transactions

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;

pub use core::{
    NewTransaction, Transaction, TransactionKind, balance, create_transaction,
    create_transaction_table, delete_transactions, format_display_date, get_transactions,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transactions_endpoint;
pub use list_endpoint::list_transactions_endpoint;
