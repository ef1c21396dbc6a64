//! Export and import of the ledger as JSON files.

mod export;
mod import;
mod record;

pub use export::export_transactions;
pub use import::import_transactions;
pub use record::TransactionRecord;
