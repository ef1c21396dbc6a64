//! The ledger page and its htmx fragment endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    html::base,
    ledger::view::{ledger_content, ledger_page},
    transaction::{NewTransaction, TransactionKind, create_transaction, delete_transactions, get_transactions},
    user::UserId,
};

/// The state needed for the ledger page and its fragment endpoints.
#[derive(Clone)]
pub struct LedgerState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the ledger page for the session user.
pub async fn get_ledger_page(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let transactions = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_transactions(user_id, &connection) {
            Ok(transactions) => transactions,
            Err(error) => return error.into_response(),
        }
    };

    let content = ledger_page(&transactions);
    base("Ledger", &[], &content).into_response()
}

/// The form data for creating a transaction from the ledger page.
#[derive(Debug, Deserialize)]
pub struct LedgerTransactionForm {
    /// "income" or "expense", from the radio group.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The value of the transaction in dollars.
    pub amount: f64,
    /// Text detailing the transaction.
    #[serde(default)]
    pub description: Option<String>,
    /// The date when the transaction occurred.
    pub date: Date,
}

/// A route handler for creating a new transaction from the ledger form.
///
/// On success the refreshed ledger content is returned so htmx swaps in the
/// new table and balance. On failure an alert fragment is returned instead
/// and the form inputs are left untouched.
pub async fn create_ledger_transaction_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<LedgerTransactionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_transaction = NewTransaction {
        kind: form.kind,
        amount: form.amount,
        description: form.description,
        date: form.date,
        formatted_date: None,
        user_id,
    };

    if let Err(error) = create_transaction(new_transaction, &connection) {
        return error.into_alert_response();
    }

    match get_transactions(user_id, &connection) {
        Ok(transactions) => ledger_content(&transactions, None).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for the reset button: deletes every transaction owned by
/// the session user and re-renders the (now empty) ledger content.
///
/// The `hx-confirm` dialog on the button is client-side UX only; the handler
/// deletes unconditionally and is idempotent.
pub async fn reset_ledger_endpoint(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = delete_transactions(user_id, &connection) {
        return error.into_alert_response();
    }

    ledger_content(&[], None).into_response()
}

#[cfg(test)]
mod ledger_page_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use axum::{Extension, extract::State, http::header::CONTENT_TYPE};
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        password::PasswordHash,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{NewTransaction, TransactionKind, create_transaction},
        user::{UserId, create_user},
    };

    use super::{LedgerState, get_ledger_page};

    fn get_test_state() -> (LedgerState, UserId) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let user = create_user(
            EmailAddress::from_str("foo@bar.baz").unwrap(),
            PasswordHash::new_unchecked("hunter22"),
            None,
            &connection,
        )
        .unwrap();

        (
            LedgerState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn ledger_page_renders_balance_and_table() {
        let (state, user_id) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                NewTransaction {
                    kind: TransactionKind::Income,
                    amount: 1000.0,
                    description: Some("Salary".to_owned()),
                    date: date!(2025 - 04 - 01),
                    formatted_date: None,
                    user_id,
                },
                &connection,
            )
            .unwrap();
        }

        let response = get_ledger_page(State(state), Extension(user_id)).await;

        assert!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let table_selector = scraper::Selector::parse("#ledger-content table").unwrap();
        assert!(document.select(&table_selector).next().is_some());

        let row_selector = scraper::Selector::parse("tbody tr").unwrap();
        let rows = document.select(&row_selector).collect::<Vec<_>>();
        assert_eq!(rows.len(), 1, "want 1 transaction row, got {}", rows.len());
        let row_text = rows[0].text().collect::<String>();
        assert!(row_text.contains("Salary"));
    }
}
