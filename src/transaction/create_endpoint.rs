//! Defines the endpoint for creating a new transaction.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    transaction::{
        core::{NewTransaction, Transaction, create_transaction},
        list_endpoint::TransactionApiState,
    },
    user::UserId,
};

/// The body of a JSON create-transaction request.
///
/// Every field is optional at the serde level so missing fields produce the
/// documented 400 instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionData {
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The value of the transaction. Must be positive.
    pub amount: Option<f64>,
    /// Text detailing the transaction.
    pub description: Option<String>,
    /// The date when the transaction occurred.
    pub date: Option<Date>,
    /// Cached display string for `date`.
    pub formatted_date: Option<String>,
    /// The ID of the user creating the transaction.
    pub user_id: Option<i64>,
}

/// A route handler for creating a new transaction, returns the created row
/// with its server-assigned id.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionApiState>,
    Extension(session_user): Extension<UserId>,
    Json(data): Json<CreateTransactionData>,
) -> Result<Json<Transaction>, Error> {
    let kind = data
        .kind
        .ok_or(Error::MissingFields)?
        .parse()?;
    let amount = data.amount.ok_or(Error::MissingFields)?;
    let date = data.date.ok_or(Error::MissingFields)?;
    let user_id = data.user_id.ok_or(Error::MissingFields)?;

    if user_id != session_user.as_i64() {
        return Err(Error::UserIdMismatch);
    }

    let new_transaction = NewTransaction {
        kind,
        amount,
        description: data.description,
        date,
        formatted_date: data.formatted_date,
        user_id: session_user,
    };

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    create_transaction(new_transaction, &connection).map(Json)
}

#[cfg(test)]
mod create_endpoint_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use axum::{Router, http::StatusCode, middleware, routing::post};
    use axum_test::TestServer;
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        db::initialize,
        endpoints,
        password::PasswordHash,
        transaction::core::{Transaction, get_transactions},
        user::{UserId, create_user},
    };

    use super::{TransactionApiState, create_transaction_endpoint};

    fn get_test_server() -> (TestServer, TransactionApiState, UserId) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let user = create_user(
            EmailAddress::from_str("foo@bar.baz").unwrap(),
            PasswordHash::new_unchecked("hunter22"),
            None,
            &connection,
        )
        .unwrap();
        let user_id = user.id;

        let state = TransactionApiState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        // Stand-in for the auth guard: inserts the session user extension.
        let app = Router::new()
            .route(endpoints::TRANSACTIONS_API, post(create_transaction_endpoint))
            .layer(middleware::from_fn(move |mut request: axum::extract::Request, next: axum::middleware::Next| {
                request.extensions_mut().insert(user_id);
                async move { next.run(request).await }
            }))
            .with_state(state.clone());

        let server = TestServer::new(app);

        (server, state, user_id)
    }

    fn transaction_count(state: &TransactionApiState, user_id: UserId) -> usize {
        let connection = state.db_connection.lock().unwrap();
        get_transactions(user_id, &connection).unwrap().len()
    }

    #[tokio::test]
    async fn create_returns_the_row_with_server_assigned_id() {
        let (server, _state, user_id) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "type": "expense",
                "amount": 300.0,
                "description": "Groceries",
                "date": "2025-04-15",
                "userId": user_id.as_i64(),
            }))
            .await;

        response.assert_status_ok();
        let transaction: Transaction = response.json();
        assert!(transaction.id > 0);
        assert_eq!(transaction.amount, 300.0);
        assert_eq!(transaction.description, "Groceries");
        assert_eq!(transaction.user_id, user_id);
        assert!(!transaction.formatted_date.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_invalid_type_and_persists_nothing() {
        let (server, state, user_id) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "type": "transfer",
                "amount": 300.0,
                "description": "Groceries",
                "date": "2025-04-15",
                "userId": user_id.as_i64(),
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(transaction_count(&state, user_id), 0);
    }

    #[tokio::test]
    async fn create_rejects_missing_fields() {
        let (server, state, user_id) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "type": "income",
                "userId": user_id.as_i64(),
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(transaction_count(&state, user_id), 0);
    }

    #[tokio::test]
    async fn create_rejects_non_positive_amount(){
        let (server, state, user_id) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "type": "income",
                "amount": -5.0,
                "description": "negative",
                "date": "2025-04-15",
                "userId": user_id.as_i64(),
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(transaction_count(&state, user_id), 0);
    }

    #[tokio::test]
    async fn create_rejects_a_foreign_user_id() {
        let (server, state, user_id) = get_test_server();

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "type": "income",
                "amount": 5.0,
                "description": "not yours",
                "date": "2025-04-15",
                "userId": user_id.as_i64() + 1,
            }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(transaction_count(&state, user_id), 0);
    }
}
