//! Authentication middleware that validates the session cookie and handles
//! redirects or JSON rejections for unauthenticated requests.

use axum::{
    Json,
    extract::{FromRef, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_htmx::HxRedirect;
use jsonwebtoken::DecodingKey;
use serde_json::json;

use crate::{
    AppState,
    auth::{cookie::get_token_from_cookies, token::verify_token},
    endpoints,
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key for verifying incoming session tokens.
    pub decoding_key: DecodingKey,
    /// Whether the session cookie is marked `Secure`.
    pub cookie_secure: bool,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.jwt_keys.decoding_key.clone(),
            cookie_secure: state.cookie_secure,
        }
    }
}

/// Middleware function that checks for a valid session cookie.
/// The user ID is placed into the request and then the request executed
/// normally if the cookie is valid, otherwise the rejection from
/// `get_rejection` is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserId>` to receive the user ID.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_rejection: impl Fn() -> Response,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = CookieJar::from_headers(&parts.headers);

    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(_) => return get_rejection(),
    };
    let user_id = match verify_token(&token, &state.decoding_key) {
        Ok(user_id) => user_id,
        Err(_) => return get_rejection(),
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}

/// Middleware for page routes: unauthenticated requests are redirected to the
/// log-in page.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, || {
        Redirect::to(endpoints::LOG_IN_VIEW).into_response()
    })
    .await
}

/// Middleware for htmx fragment routes: unauthenticated requests get an
/// `HX-Redirect` header so the whole page navigates to the log-in page.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, || {
        (
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            StatusCode::OK,
        )
            .into_response()
    })
    .await
}

/// Middleware for the JSON API: unauthenticated requests get a 401 with a
/// JSON error body.
pub async fn auth_guard_api(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "authentication required" })),
        )
            .into_response()
    })
    .await
}
