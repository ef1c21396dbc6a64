//! Kakeibo is a web app for tracking household income and expenses.
//!
//! This library provides a JSON REST API and directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod backup;
mod db;
mod endpoints;
mod html;
mod ledger;
mod logging;
mod not_found;
mod password;
mod routing;
mod summary;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserId};

use crate::alert::Alert;

/// The minimum number of characters a password must have.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an email/password combination that does not match a
    /// registered user. The message deliberately does not reveal which of the
    /// two was wrong.
    #[error("email or password is incorrect")]
    InvalidCredentials,

    /// The session token is missing from the request cookies.
    #[error("no session cookie in the request")]
    CookieMissing,

    /// The session token could not be verified, either because it was
    /// tampered with or because it has expired.
    #[error("the session token is invalid or has expired")]
    InvalidToken,

    /// The email used to create an account is already registered.
    #[error("this email address is already registered")]
    DuplicateEmail,

    /// The string used to create an account is not a valid email address.
    #[error("enter a valid email address")]
    InvalidEmail,

    /// The password used to create an account is shorter than
    /// [MIN_PASSWORD_LENGTH].
    #[error("the password must be at least {MIN_PASSWORD_LENGTH} characters long")]
    PasswordTooShort,

    /// A request was missing one or more required fields.
    #[error("missing required fields")]
    MissingFields,

    /// A transaction request did not specify the user ID.
    #[error("a userId is required")]
    MissingUserId,

    /// The user ID in a request does not match the authenticated user.
    #[error("the userId does not belong to the authenticated user")]
    UserIdMismatch,

    /// A transaction type other than income or expense was given.
    #[error("{0:?} is not a valid transaction type")]
    InvalidTransactionKind(String),

    /// A zero or negative amount was used to create a transaction.
    #[error("the amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    /// The multipart form could not be parsed as an uploaded file.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The uploaded file is not a JSON file.
    #[error("file is not JSON")]
    NotJson,

    /// The uploaded file could not be parsed as a list of transactions.
    #[error("could not parse the backup file: {0}")]
    InvalidBackup(String),

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A session token could not be created.
    #[error("could not create session token: {0}")]
    TokenCreation(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JsonSerializationError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::CookieMissing | Error::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::UserIdMismatch => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidEmail
            | Error::PasswordTooShort
            | Error::MissingFields
            | Error::MissingUserId
            | Error::InvalidTransactionKind(_)
            | Error::InvalidAmount(_)
            | Error::MultipartError(_)
            | Error::NotJson
            | Error::InvalidBackup(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert the error into an HTML alert fragment for htmx requests.
    fn into_alert_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            return (
                status,
                Alert::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
                .into_html(),
            )
                .into_response();
        }

        (status, Alert::error_simple(&self.to_string()).into_html()).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // The details of unexpected errors belong in the server logs, not
            // in the response body.
            tracing::error!("An unexpected error occurred: {}", self);
            "internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
