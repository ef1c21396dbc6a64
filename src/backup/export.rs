//! Defines the endpoint for downloading the ledger as a JSON file.

use axum::{
    Extension,
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    backup::record::TransactionRecord,
    ledger::LedgerState,
    transaction::get_transactions,
    user::UserId,
};

/// A route handler that serializes the session user's transactions to
/// indented JSON and returns it as a file download.
pub async fn export_transactions(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions(user_id, &connection)?
    };

    let records: Vec<TransactionRecord> = transactions.iter().map(TransactionRecord::from).collect();

    let json = serde_json::to_string_pretty(&records)
        .map_err(|error| Error::JsonSerializationError(error.to_string()))?;

    Ok((
        [
            (CONTENT_TYPE, "application/json"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.json\"",
            ),
        ],
        json,
    )
        .into_response())
}
