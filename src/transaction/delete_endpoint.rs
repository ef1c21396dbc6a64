//! Defines the endpoint for deleting all of a user's transactions.

use axum::{Extension, Json, extract::{Query, State}};
use serde_json::{Value, json};

use crate::{
    Error,
    transaction::{
        core::delete_transactions,
        list_endpoint::{TransactionApiState, UserIdQuery, authorize_user_id},
    },
    user::UserId,
};

/// A route handler for deleting every transaction owned by the user.
///
/// The deletion is permanent; there is no soft delete. Calling it for a user
/// with no transactions still succeeds, so the reset is idempotent. The
/// confirmation dialog in the client is UX only, not a server-side control.
pub async fn delete_transactions_endpoint(
    State(state): State<TransactionApiState>,
    Extension(session_user): Extension<UserId>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<Value>, Error> {
    let user_id = authorize_user_id(&query, session_user)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transactions(user_id, &connection)?;

    Ok(Json(json!({ "message": "all transactions deleted" })))
}
