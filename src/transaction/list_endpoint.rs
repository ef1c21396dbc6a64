//! Defines the endpoint for listing a user's transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    transaction::core::{Transaction, get_transactions},
    user::UserId,
};

/// The state needed for the transaction API endpoints.
#[derive(Clone)]
pub struct TransactionApiState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The `userId` query parameter used by the list and delete-all endpoints.
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    /// The ID of the user whose transactions are requested.
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
}

/// Check the caller-supplied `userId` against the session user.
///
/// The query parameter is part of the external interface, but it is never
/// trusted: the id must match the one the auth guard extracted from the
/// session token.
pub(super) fn authorize_user_id(query: &UserIdQuery, session_user: UserId) -> Result<UserId, Error> {
    let requested = query.user_id.ok_or(Error::MissingUserId)?;

    if requested != session_user.as_i64() {
        return Err(Error::UserIdMismatch);
    }

    Ok(session_user)
}

/// A route handler for listing all of a user's transactions, ordered
/// newest-created first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionApiState>,
    Extension(session_user): Extension<UserId>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let user_id = authorize_user_id(&query, session_user)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_transactions(user_id, &connection).map(Json)
}
