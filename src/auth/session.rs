//! The session-check endpoint the client uses to answer "am I logged in".

use std::sync::{Arc, Mutex};

use axum::{Extension, Json, extract::{FromRef, State}};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    user::{UserId, get_user_by_id},
};

/// The state needed for the session check.
#[derive(Clone)]
pub struct SessionState {
    /// The database connection for looking up the session user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Return the profile of the authenticated user.
///
/// The auth guard has already verified the session cookie; this handler only
/// resolves the user ID to a profile. A token for a user that no longer
/// exists is rejected like any other invalid session.
pub async fn get_session(
    State(state): State<SessionState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Value>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidToken,
        error => error,
    })?;

    Ok(Json(json!({ "user": user.profile() })))
}

#[cfg(test)]
mod session_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use axum::{Extension, extract::State, http::StatusCode};
    use email_address::EmailAddress;
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        password::PasswordHash,
        user::{UserId, create_user},
    };

    use super::{SessionState, get_session};

    fn get_test_state() -> (SessionState, UserId) {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");
        initialize(&connection).expect("Could not initialize database.");

        let user = create_user(
            EmailAddress::from_str("foo@bar.baz").unwrap(),
            PasswordHash::new_unchecked("hunter22"),
            None,
            &connection,
        )
        .unwrap();

        (
            SessionState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn session_check_returns_the_user_profile() {
        let (state, user_id) = get_test_state();

        let response = get_session(State(state), Extension(user_id)).await.unwrap();

        let body = serde_json::to_value(&response.0).unwrap();
        assert_eq!(body["user"]["email"], "foo@bar.baz");
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn session_check_rejects_deleted_user() {
        let (state, user_id) = get_test_state();

        let result = get_session(State(state), Extension(UserId::new(user_id.as_i64() + 1))).await;

        let error = result.unwrap_err();
        assert_eq!(error, Error::InvalidToken);
        assert_eq!(
            axum::response::IntoResponse::into_response(error).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
