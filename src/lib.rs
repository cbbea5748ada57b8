use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core guard components.
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod models;
pub mod policy;

// The application surface behind the guard.
pub mod handlers;
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use identity::{HttpIdentityProvider, IdentityState, MockIdentityProvider};
pub use policy::RoutePolicy;

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_me, handlers::register_webhook),
    components(schemas(models::CallerProfile, models::Role)),
    tags(
        (name = "route-guard", description = "Role-based route access")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single immutable container shared by every request: the identity provider
/// client, the route table and the configuration.
#[derive(Clone)]
pub struct AppState {
    /// Identity provider client, injected so tests can use `MockIdentityProvider`.
    pub identity: IdentityState,
    /// Public and admin route sets.
    pub policy: Arc<RoutePolicy>,
    /// The loaded environment configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(identity: IdentityState, config: AppConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            identity,
            policy: Arc::new(RoutePolicy::standard()?),
            config,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routers, wraps every route in the route guard and adds the
/// observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .nest("/admin", admin::admin_routes())
        .fallback(handlers::not_found)
        // `layer` (not `route_layer`) so the fallback is guarded as well: an anonymous
        // caller probing /admin/anything is sent to /sign-in, not told it is a 404.
        .layer(middleware::from_fn_with_state(state.clone(), guard::route_guard))
        .with_state(state);

    // Request ids are assigned outermost so the guard's log lines carry them.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request with method, uri and the `x-request-id` set above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
