//! Defines the endpoint for importing transactions from an uploaded JSON
//! file.
//!
//! The whole file is parsed before anything is written, and every row is
//! inserted inside one SQL transaction: a failure anywhere imports nothing,
//! so the ledger is never left partially imported.

use axum::{
    Extension,
    extract::{Multipart, State, multipart::Field},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    alert::Alert,
    backup::record::TransactionRecord,
    ledger::{LedgerState, ledger_content},
    transaction::{NewTransaction, create_transaction, get_transactions},
    user::UserId,
};

/// Route handler for importing transactions from a JSON file.
///
/// On success, responds with the refreshed ledger content so htmx swaps the
/// new table in. On failure, responds with an alert fragment and leaves the
/// ledger untouched.
pub async fn import_transactions(
    State(state): State<LedgerState>,
    Extension(user_id): Extension<UserId>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let mut json_data = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => {
                tracing::error!("Could not read multipart form: {error}");
                return Err(Error::MultipartError(error.to_string()).into_alert_response());
            }
        };

        json_data = Some(
            parse_multipart_field(field)
                .await
                .map_err(|error| error.into_alert_response())?,
        );
    }

    let Some(json_data) = json_data else {
        return Err(
            Error::MultipartError("the form did not contain a file".to_owned())
                .into_alert_response(),
        );
    };

    let records: Vec<TransactionRecord> = serde_json::from_str(&json_data)
        .map_err(|error| Error::InvalidBackup(error.to_string()).into_alert_response())?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError.into_alert_response()
    })?;

    let tx = connection
        .unchecked_transaction()
        .map_err(|error| Error::from(error).into_alert_response())?;

    let imported_count = records.len();
    for record in records {
        create_transaction(
            NewTransaction {
                kind: record.kind,
                amount: record.amount,
                description: Some(record.description),
                date: record.date,
                formatted_date: record.formatted_date,
                user_id,
            },
            &tx,
        )
        .map_err(|error| error.into_alert_response())?;
    }

    tx.commit()
        .map_err(|error| Error::from(error).into_alert_response())?;

    let transactions =
        get_transactions(user_id, &connection).map_err(|error| error.into_alert_response())?;

    let alert = Alert::success(
        "Import completed successfully!",
        &format!("Imported {imported_count} transactions."),
    );

    Ok((
        StatusCode::CREATED,
        ledger_content(&transactions, Some(alert)),
    )
        .into_response())
}

async fn parse_multipart_field(field: Field<'_>) -> Result<String, Error> {
    if !matches!(
        field.content_type(),
        Some("application/json") | Some("text/json")
    ) {
        return Err(Error::NotJson);
    }

    match field.text().await {
        Ok(data) => Ok(data),
        Err(error) => {
            tracing::error!("Could not read data from multipart form field: {error}");
            Err(Error::MultipartError(
                "Could not read data from multipart form field.".to_owned(),
            ))
        }
    }
}
