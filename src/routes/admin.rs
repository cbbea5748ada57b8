use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Everything under `/admin` matches the guard's admin pattern: non-admins are
/// redirected to `/dashboard` before any handler runs.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/dashboard
        .route("/dashboard", get(handlers::admin_dashboard))
}
