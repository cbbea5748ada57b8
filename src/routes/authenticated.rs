use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Pages open to every signed-in user. Handlers take `AuthUser`, which the guard
/// attaches on pass-through; without it they answer 401.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /dashboard
        // Admins asking for it are redirected to /admin/dashboard by the guard.
        .route("/dashboard", get(handlers::dashboard))
        // GET /api/me
        .route("/api/me", get(handlers::get_me))
}
