//! The registration page and the account creation handlers, both the htmx
//! form and the JSON API.

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
    AppState, Error, MIN_PASSWORD_LENGTH, PasswordHash, ValidatedPassword,
    auth::{cookie::set_auth_cookie, token::create_token},
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, email_input, loading_spinner,
        log_in_register, password_input,
    },
    user::{User, create_user},
};

fn confirm_password_input(error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(MIN_PASSWORD_LENGTH)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }

    }
}

fn registration_form(
    email: &str,
    email_error_message: Option<&str>,
    password_error_message: Option<&str>,
    confirm_password_error_message: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER_VIEW)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #confirm-password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, email_error_message))
            (password_input(MIN_PASSWORD_LENGTH, password_error_message))
            (confirm_password_input(confirm_password_error_message))

            button
                type="submit" id="submit-button" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", None, None, None);
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Clone)]
pub struct RegistrationState {
    /// The key for signing new session tokens.
    pub encoding_key: EncodingKey,
    /// Whether the session cookie is marked `Secure`.
    pub cookie_secure: bool,
    /// The database connection for inserting users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            encoding_key: state.jwt_keys.encoding_key.clone(),
            cookie_secure: state.cookie_secure,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Validate a signup request and insert the new user.
fn register(
    email: &str,
    password: &str,
    name: Option<String>,
    connection: &Connection,
) -> Result<User, Error> {
    let email = EmailAddress::from_str(email).map_err(|_| Error::InvalidEmail)?;
    let validated_password = ValidatedPassword::new(password)?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    create_user(email, password_hash, name, connection)
}

/// The raw data entered by the user in the registration form.
#[derive(Deserialize)]
pub struct RegisterForm {
    /// Email entered during registration.
    pub email: String,
    /// Password entered during registration.
    pub password: String,
    /// The password repeated, to catch typos.
    pub confirm_password: String,
}

/// Handler for registration requests from the registration page form.
///
/// On success the new user is logged in straight away: the session cookie is
/// set and the client is redirected to the ledger page. Otherwise the form is
/// returned with an inline error message and the entered email preserved.
pub async fn post_register(
    State(state): State<RegistrationState>,
    jar: CookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    if user_data.password != user_data.confirm_password {
        return registration_form(&user_data.email, None, None, Some("Passwords do not match"))
            .into_response();
    }

    let created = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        register(&user_data.email, &user_data.password, None, &connection)
    };

    let user = match created {
        Ok(user) => user,
        Err(error @ (Error::InvalidEmail | Error::DuplicateEmail)) => {
            return registration_form(
                &user_data.email,
                Some(&error.to_string()),
                None,
                None,
            )
            .into_response();
        }
        Err(error @ Error::PasswordTooShort) => {
            return registration_form(&user_data.email, None, Some(&error.to_string()), None)
                .into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            return error.into_alert_response();
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
            error.into_alert_response()
        }
    }
}

/// The body of a JSON signup request.
#[derive(Deserialize)]
pub struct SignupData {
    /// Email for the new account.
    pub email: Option<String>,
    /// Password for the new account.
    pub password: Option<String>,
    /// Optional display name.
    pub name: Option<String>,
}

/// Handler for JSON signup requests.
///
/// Returns 201 with the created user (password stripped), the session token
/// and a confirmation message. The cookie is set so the new user is logged in
/// straight away.
pub async fn post_signup_api(
    State(state): State<RegistrationState>,
    jar: CookieJar,
    Json(user_data): Json<SignupData>,
) -> Result<Response, Error> {
    let (Some(email), Some(password)) = (user_data.email, user_data.password) else {
        return Err(Error::MissingFields);
    };

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        register(&email, &password, user_data.name, &connection)?
    };

    let token = create_token(user.id, &state.encoding_key)?;
    let jar = set_auth_cookie(jar, token.clone(), state.cookie_secure);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({
            "user": user.profile(),
            "token": token,
            "message": "account created",
        })),
    )
        .into_response())
}

#[cfg(test)]
mod register_page_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::get_register_page;

    #[tokio::test]
    async fn register_page_displays_form() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form_selector = scraper::Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();
        assert_eq!(form.value().attr("hx-post"), Some(endpoints::REGISTER_VIEW));

        let password_selector = scraper::Selector::parse("input[type=password]").unwrap();
        let password_inputs = form.select(&password_selector).collect::<Vec<_>>();
        assert_eq!(
            password_inputs.len(),
            2,
            "want password and confirmation inputs, got {}",
            password_inputs.len()
        );
    }
}
