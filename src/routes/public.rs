use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Pages listed in the guard's public set, plus the error page the guard redirects to.
///
/// Signed-in callers who request a public page are redirected to their dashboard by the
/// guard before reaching these handlers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        .route("/", get(handlers::home))
        // GET /sign-in, GET /sign-up
        // Host the identity provider's widgets.
        .route("/sign-in", get(handlers::sign_in))
        .route("/sign-up", get(handlers::sign_up))
        // POST /api/webhook/register
        // User lifecycle events from the identity provider.
        .route("/api/webhook/register", post(handlers::register_webhook))
        // GET /error
        // Target of the guard's lookup-failure redirect. Not in the public set, so an
        // anonymous caller is sent to /sign-in instead.
        .route("/error", get(handlers::error_page))
}
