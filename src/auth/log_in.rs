//! This file defines the routes for displaying the log-in page and handling
//! log-in requests, both the htmx form and the JSON API.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use axum_htmx::HxRedirect;
use email_address::EmailAddress;
use jsonwebtoken::EncodingKey;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{cookie::set_auth_cookie, token::create_token},
    endpoints,
    html::{base, email_input, log_in_register, loading_spinner, password_input},
    user::{User, get_user_by_email},
};

/// The error message shown for a wrong email or password.
///
/// The same message is used for both cases so the response does not reveal
/// which email addresses are registered.
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Email or password is incorrect.";

fn log_in_form(email: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_VIEW)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, None))
            (password_input(0, error_message))

            button
                type="submit" id="submit-button" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Register here"
                }
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    let log_in_form = log_in_form("", None);
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &[], &content).into_response()
}

/// The state needed to perform a log-in.
#[derive(Clone)]
pub struct LoginState {
    /// The key for signing new session tokens.
    pub encoding_key: EncodingKey,
    /// Whether the session cookie is marked `Secure`.
    pub cookie_secure: bool,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            encoding_key: state.jwt_keys.encoding_key.clone(),
            cookie_secure: state.cookie_secure,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Look up the user for `data` and check their password.
///
/// An unknown email and a wrong password both produce
/// [Error::InvalidCredentials] so the caller cannot distinguish them.
fn verify_credentials(data: &LogInData, connection: &Connection) -> Result<User, Error> {
    let email = EmailAddress::from_str(&data.email).map_err(|_| Error::InvalidCredentials)?;

    let user = get_user_by_email(&email, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCredentials,
        error => error,
    })?;

    let password_is_correct = user.password_hash.verify(&data.password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    Ok(user)
}

/// Handler for log-in requests from the log-in page form.
///
/// On success the session cookie is set and the client is redirected to the
/// ledger page. Otherwise the form is returned with an error message and the
/// entered email preserved.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: CookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let verified = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return log_in_form(
                    &user_data.email,
                    Some("An internal error occurred. Please try again later."),
                )
                .into_response();
            }
        };

        verify_credentials(&user_data, &connection)
    };

    let user = match verified {
        Ok(user) => user,
        Err(Error::InvalidCredentials) => {
            return log_in_form(&user_data.email, Some(INVALID_CREDENTIALS_ERROR_MSG))
                .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(
                &user_data.email,
                Some("An internal error occurred. Please try again later."),
            )
            .into_response();
        }
    };

    match create_token(user.id, &state.encoding_key) {
        Ok(token) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::ROOT.to_owned()),
            set_auth_cookie(jar, token, state.cookie_secure),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Error creating session token: {error}");
            log_in_form(
                &user_data.email,
                Some("An internal error occurred. Please try again later."),
            )
            .into_response()
        }
    }
}

/// Handler for JSON log-in requests.
///
/// Returns 200 with the user profile and session token, or 401 with the
/// generic invalid-credentials message.
pub async fn post_log_in_api(
    State(state): State<LoginState>,
    jar: CookieJar,
    Json(user_data): Json<LogInData>,
) -> Result<Response, Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        verify_credentials(&user_data, &connection)?
    };

    let token = create_token(user.id, &state.encoding_key)?;
    let jar = set_auth_cookie(jar, token.clone(), state.cookie_secure);

    Ok((
        jar,
        Json(json!({
            "user": user.profile(),
            "token": token,
        })),
    )
        .into_response())
}


#[cfg(test)]
mod log_in_api_tests {
    use std::{
        str::FromStr,
        sync::{Arc, Mutex},
    };

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        app_state::JwtKeys,
        auth::cookie::COOKIE_TOKEN,
        db::initialize,
        endpoints,
        password::PasswordHash,
        user::create_user,
    };

    use super::{LoginState, post_log_in_api};

    const TEST_EMAIL: &str = "foo@bar.baz";
    const TEST_PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_state() -> LoginState {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");
        initialize(&connection).expect("Could not initialize database.");

        create_user(
            EmailAddress::from_str(TEST_EMAIL).unwrap(),
            PasswordHash::from_raw_password(TEST_PASSWORD, 4).unwrap(),
            None,
            &connection,
        )
        .expect("Could not create test user");

        LoginState {
            encoding_key: JwtKeys::from_secret("foobar").encoding_key,
            cookie_secure: false,
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(post_log_in_api))
            .with_state(get_test_state());

        TestServer::new(app)
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .json(&json!({
                "email": TEST_EMAIL,
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["user"]["email"], TEST_EMAIL);
        assert!(body["user"].get("password").is_none());
        assert!(body["token"].is_string());

        let cookie = response.cookie(COOKIE_TOKEN);
        assert_eq!(cookie.value(), body["token"].as_str().unwrap());
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_get_identical_401() {
        let server = get_test_server();

        let wrong_password = server
            .post(endpoints::LOG_IN_API)
            .json(&json!({
                "email": TEST_EMAIL,
                "password": "definitelyNotTheCorrectPassword",
            }))
            .await;

        let unknown_email = server
            .post(endpoints::LOG_IN_API)
            .json(&json!({
                "email": "wrongemail@gmail.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            wrong_password.text(),
            unknown_email.text(),
            "the 401 body must not distinguish the failure cause"
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN_API)
            .content_type("application/json")
            .await;

        assert_ne!(response.status_code(), StatusCode::OK);
    }
}
