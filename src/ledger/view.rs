//! HTML rendering for the ledger page.

use maud::{Markup, html};

use crate::{
    alert::Alert,
    backup::TransactionRecord,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        format_currency, loading_spinner,
    },
    transaction::{Transaction, TransactionKind, balance},
};

fn amount_class(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Income => "text-green-700 dark:text-green-300",
        TransactionKind::Expense => "text-red-700 dark:text-red-300",
    }
}

fn signed_amount(transaction: &Transaction) -> String {
    match transaction.kind {
        TransactionKind::Income => format_currency(transaction.amount),
        TransactionKind::Expense => format_currency(-transaction.amount),
    }
}

/// Build the link to the summary page, carrying the current transaction list
/// as URL-encoded JSON query data so the summary can recompute its aggregates
/// independently.
fn summary_href(transactions: &[Transaction]) -> String {
    let records: Vec<TransactionRecord> =
        transactions.iter().map(TransactionRecord::from).collect();

    let snapshot = match serde_json::to_string(&records) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            // The summary page falls back to the stored transactions when the
            // snapshot is missing.
            tracing::error!("Could not serialize transaction snapshot: {error}");
            return endpoints::SUMMARY_VIEW.to_owned();
        }
    };

    match serde_urlencoded::to_string([("data", snapshot)]) {
        Ok(query) => format!("{}?{}", endpoints::SUMMARY_VIEW, query),
        Err(error) => {
            tracing::error!("Could not encode transaction snapshot: {error}");
            endpoints::SUMMARY_VIEW.to_owned()
        }
    }
}

fn add_transaction_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::LEDGER_TRANSACTIONS)
            hx-target="#ledger-content"
            hx-target-4xx="#alert-container"
            hx-target-5xx="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="find input, find button"
            class="space-y-4 w-full max-w-md"
        {
            fieldset class="flex gap-4"
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                label class="flex items-center gap-2 text-sm text-gray-900 dark:text-white"
                {
                    input type="radio" name="type" value="income" checked;
                    "Income"
                }

                label class="flex items-center gap-2 text-sm text-gray-900 dark:text-white"
                {
                    input type="radio" name="type" value="expense";
                    "Expense"
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                input
                    type="number"
                    name="amount"
                    id="amount"
                    step="0.01"
                    min="0.01"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                input
                    type="text"
                    name="description"
                    id="description"
                    placeholder="e.g. Groceries"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input
                    type="date"
                    name="date"
                    id="date"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button
                type="submit" id="submit-button"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Add Transaction"
            }
        }
    }
}

fn import_export_controls() -> Markup {
    html! {
        div class="flex flex-wrap items-center gap-4"
        {
            a href=(endpoints::LEDGER_EXPORT) class=(LINK_STYLE) download
            {
                "Export JSON"
            }

            form
                hx-post=(endpoints::LEDGER_IMPORT)
                hx-encoding="multipart/form-data"
                hx-target="#ledger-content"
                hx-target-4xx="#alert-container"
                hx-target-5xx="#alert-container"
                hx-disabled-elt="find input, find button"
                class="flex items-center gap-2"
            {
                input
                    type="file"
                    name="file"
                    accept="application/json"
                    required
                    class="text-sm text-gray-900 dark:text-white";

                button
                    type="submit"
                    class=(LINK_STYLE)
                {
                    "Import JSON"
                }
            }
        }
    }
}

fn transaction_table(transactions: &[Transaction]) -> Markup {
    html! {
        table class="w-full my-2 text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                    th scope="col" class="px-6 py-3 text-right" { "Amount" }
                }
            }

            tbody
            {
                @if transactions.is_empty()
                {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td colspan="3" class="px-6 py-4 text-center"
                        {
                            "No transactions yet."
                        }
                    }
                }

                @for transaction in transactions
                {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (transaction.formatted_date) }
                        td class=(TABLE_CELL_STYLE) { (transaction.description) }
                        td class={ "px-6 py-4 text-right " (amount_class(transaction.kind)) }
                        {
                            (signed_amount(transaction))
                        }
                    }
                }
            }
        }
    }
}

/// The ledger content fragment: balance headline, add-transaction form,
/// transaction table, reset button and the import/export controls.
///
/// The balance is recomputed from `transactions` on every render, never taken
/// from a cache. Each mutating endpoint re-renders this fragment so the
/// client state always reflects the store.
pub(crate) fn ledger_content(transactions: &[Transaction], alert: Option<Alert>) -> Markup {
    let current_balance = balance(transactions);
    let balance_class = if current_balance < 0.0 {
        "text-3xl font-bold text-red-700 dark:text-red-300"
    } else {
        "text-3xl font-bold text-green-700 dark:text-green-300"
    };

    html! {
        @if let Some(alert) = alert
        {
            (alert.into_html())
        }

        section class="space-y-2 text-center"
        {
            h2 class="text-sm uppercase text-gray-500 dark:text-gray-400" { "Balance" }
            p class=(balance_class) { (format_currency(current_balance)) }
        }

        (add_transaction_form())

        section class="rounded bg-gray-50 dark:bg-gray-800 overflow-hidden w-full max-w-2xl"
        {
            (transaction_table(transactions))
        }

        div class="flex flex-wrap items-center gap-4"
        {
            a href=(summary_href(transactions)) class=(LINK_STYLE)
            {
                "Monthly Summary"
            }

            (import_export_controls())

            button
                hx-delete=(endpoints::LEDGER_TRANSACTIONS)
                hx-confirm="Delete all transactions? This cannot be undone."
                hx-target="#ledger-content"
                hx-target-4xx="#alert-container"
                hx-target-5xx="#alert-container"
                class=(BUTTON_DELETE_STYLE)
            {
                "Reset"
            }
        }
    }
}

/// The full ledger page body: header with navigation plus the content
/// fragment.
pub(crate) fn ledger_page(transactions: &[Transaction]) -> Markup {
    html! {
        header class="flex justify-between items-center px-6 py-4"
        {
            h1 class="text-2xl font-semibold text-gray-900 dark:text-white" { "Kakeibo" }

            a href=(endpoints::LOG_OUT_VIEW) class=(LINK_STYLE) { "Log out" }
        }

        main class=(PAGE_CONTAINER_STYLE)
        {
            section id="ledger-content" class="space-y-6 w-full flex flex-col items-center"
            {
                (ledger_content(transactions, None))
            }
        }
    }
}

#[cfg(test)]
mod view_tests {
    use time::macros::{date, datetime};

    use crate::{transaction::{Transaction, TransactionKind}, user::UserId};

    use super::{ledger_content, summary_href};

    fn test_transactions() -> Vec<Transaction> {
        vec![
            Transaction {
                id: 2,
                kind: TransactionKind::Expense,
                amount: 300.0,
                description: "Rent".to_owned(),
                date: date!(2025 - 04 - 15),
                formatted_date: "Tue, 15 Apr 2025".to_owned(),
                user_id: UserId::new(1),
                created_at: datetime!(2025-04-15 09:00:00 UTC),
            },
            Transaction {
                id: 1,
                kind: TransactionKind::Income,
                amount: 1000.0,
                description: "Salary".to_owned(),
                date: date!(2025 - 04 - 01),
                formatted_date: "Tue, 1 Apr 2025".to_owned(),
                user_id: UserId::new(1),
                created_at: datetime!(2025-04-01 09:00:00 UTC),
            },
        ]
    }

    #[test]
    fn content_shows_the_recomputed_balance() {
        let rendered = ledger_content(&test_transactions(), None).into_string();

        assert!(rendered.contains("$700.00"));
    }

    #[test]
    fn content_shows_signed_amounts() {
        let rendered = ledger_content(&test_transactions(), None).into_string();

        assert!(rendered.contains("-$300.00"));
        assert!(rendered.contains("$1,000.00"));
    }

    #[test]
    fn empty_ledger_shows_the_empty_state() {
        let rendered = ledger_content(&[], None).into_string();

        assert!(rendered.contains("No transactions yet."));
        assert!(rendered.contains("$0.00"));
    }

    #[test]
    fn summary_link_carries_the_snapshot() {
        let href = summary_href(&test_transactions());

        assert!(href.starts_with("/summary?data="));

        // The query data must decode back into the same records.
        let query = href.split_once('?').unwrap().1;
        let params: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap();
        let records: Vec<crate::backup::TransactionRecord> =
            serde_json::from_str(&params[0].1).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "Rent");
    }
}
