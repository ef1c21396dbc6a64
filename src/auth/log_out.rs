//! Log-out route handlers that invalidate the session cookie.
//!
//! Logging out only clears the cookie; there is no server-side revocation
//! list, so an already issued token stays cryptographically valid until its
//! natural expiry. Both handlers succeed no matter whether the caller was
//! logged in, so logging out is idempotent.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::{auth::cookie::invalidate_auth_cookie, auth::middleware::AuthState, endpoints};

/// Invalidate the session cookie and redirect the client to the log-in page.
pub async fn get_log_out(State(state): State<AuthState>, jar: CookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar, state.cookie_secure);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}

/// Invalidate the session cookie and confirm with a JSON message.
pub async fn post_log_out_api(State(state): State<AuthState>, jar: CookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar, state.cookie_secure);

    (jar, Json(json!({ "message": "logged out" }))).into_response()
}
