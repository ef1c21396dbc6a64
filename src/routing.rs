//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_api, auth_guard_hx, get_log_in_page, get_log_out, get_register_page,
        get_session, post_log_in, post_log_in_api, post_log_out_api, post_register,
        post_signup_api,
    },
    backup::{export_transactions, import_transactions},
    endpoints,
    ledger::{create_ledger_transaction_endpoint, get_ledger_page, reset_ledger_endpoint},
    not_found::get_404_not_found,
    summary::get_summary_page,
    transaction::{
        create_transaction_endpoint, delete_transactions_endpoint, list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page).post(post_log_in))
        .route(
            endpoints::REGISTER_VIEW,
            get(get_register_page).post(post_register),
        )
        .route(endpoints::LOG_OUT_VIEW, get(get_log_out))
        .route(endpoints::SIGNUP_API, post(post_signup_api))
        .route(endpoints::LOG_IN_API, post(post_log_in_api))
        .route(endpoints::LOG_OUT_API, post(post_log_out_api));

    let protected_pages = Router::new()
        .route(endpoints::ROOT, get(get_ledger_page))
        .route(endpoints::SUMMARY_VIEW, get(get_summary_page))
        .route(endpoints::LEDGER_EXPORT, get(export_transactions))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes need to use the HX-Redirect header for auth redirects to
    // work properly for htmx requests.
    let protected_fragments = Router::new()
        .route(
            endpoints::LEDGER_TRANSACTIONS,
            post(create_ledger_transaction_endpoint).delete(reset_ledger_endpoint),
        )
        .route(endpoints::LEDGER_IMPORT, post(import_transactions))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    let protected_api = Router::new()
        .route(endpoints::ME_API, get(get_session))
        .route(
            endpoints::TRANSACTIONS_API,
            get(list_transactions_endpoint)
                .post(create_transaction_endpoint)
                .delete(delete_transactions_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_api));

    protected_pages
        .merge(protected_fragments)
        .merge(protected_api)
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}
