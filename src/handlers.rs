use crate::{
    auth::AuthUser,
    models::{CallerProfile, Role},
    policy::RedirectTarget,
};
use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse},
};

// --- Public pages ---

/// home
///
/// [Public Route] Landing page. Signed-in callers never see it: the guard sends them
/// to their dashboard first.
pub async fn home() -> Html<&'static str> {
    Html("<h1>Welcome</h1><p><a href=\"/sign-in\">Sign in</a> or <a href=\"/sign-up\">create an account</a>.</p>")
}

/// sign_in
///
/// [Public Route] Hosts the identity provider's sign-in widget.
pub async fn sign_in() -> Html<&'static str> {
    Html("<h1>Sign in</h1><div id=\"sign-in\"></div>")
}

/// sign_up
///
/// [Public Route] Hosts the identity provider's sign-up widget.
pub async fn sign_up() -> Html<&'static str> {
    Html("<h1>Sign up</h1><div id=\"sign-up\"></div>")
}

/// register_webhook
///
/// [Public Route] Receives user lifecycle events from the identity provider.
/// User records live at the provider, so the event is acknowledged and logged only.
#[utoipa::path(
    post,
    path = "/api/webhook/register",
    responses((status = 204, description = "Event acknowledged"))
)]
pub async fn register_webhook(Json(event): Json<serde_json::Value>) -> StatusCode {
    let kind = event.get("type").and_then(|t| t.as_str()).unwrap_or("unknown");
    tracing::info!(event_type = kind, "identity webhook received");
    StatusCode::NO_CONTENT
}

/// error_page
///
/// Landing page for callers whose role could not be resolved.
pub async fn error_page() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html("<h1>Something went wrong</h1><p>We could not load your account. Please try again later.</p>"),
    )
}

/// not_found
pub async fn not_found() -> (StatusCode, Html<&'static str>) {
    (StatusCode::NOT_FOUND, Html("<h1>Not found</h1>"))
}

// --- Authenticated pages ---

/// dashboard
///
/// [Authenticated Route] The standard user dashboard.
pub async fn dashboard(AuthUser { id, .. }: AuthUser) -> impl IntoResponse {
    Html(format!("<h1>Dashboard</h1><p>Signed in as {}</p>", id))
}

/// get_me
///
/// [Authenticated Route] Returns the identity the guard resolved for this request.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Caller profile", body = CallerProfile),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn get_me(AuthUser { id, role }: AuthUser) -> Json<CallerProfile> {
    Json(CallerProfile {
        user_id: id,
        role,
        home: RedirectTarget::home_for(role).path().to_string(),
    })
}

// --- Admin pages ---

/// admin_dashboard
///
/// [Admin Route] Only admins get here; everyone else is bounced by the guard.
/// The role is re-checked so a router mounted without the guard cannot leak the page.
pub async fn admin_dashboard(AuthUser { id, role }: AuthUser) -> impl IntoResponse {
    if role != Role::Admin {
        return StatusCode::FORBIDDEN.into_response();
    }
    Html(format!("<h1>Admin Dashboard</h1><p>Signed in as {}</p>", id)).into_response()
}
