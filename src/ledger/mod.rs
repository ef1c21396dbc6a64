//! The ledger page: balance headline, add-transaction form, transaction
//! table, reset and the import/export controls.

mod page;
mod view;

pub use page::{
    LedgerState, create_ledger_transaction_endpoint, get_ledger_page, reset_ledger_endpoint,
};
pub(crate) use view::ledger_content;
