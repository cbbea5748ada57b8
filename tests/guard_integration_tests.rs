use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use route_guard::{
    AppConfig, AppState, MockIdentityProvider, create_router,
    config::Env,
    error::IdentityError,
    identity::IdentityProvider,
    models::{CallerProfile, IdentityUser, Role},
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tower::ServiceExt;

// --- Test Doubles ---

const ADMIN_ID: &str = "user_admin";
const MEMBER_ID: &str = "user_member";
const NO_ROLE_ID: &str = "user_no_role";
const ODD_ROLE_ID: &str = "user_odd_role";

fn mock_provider() -> MockIdentityProvider {
    MockIdentityProvider::new()
        .with_user(ADMIN_ID, Some("admin"))
        .with_user(MEMBER_ID, Some("student"))
        .with_user(NO_ROLE_ID, None)
        .with_user(ODD_ROLE_ID, Some("Admin"))
}

/// Counts lookups so tests can assert the provider was (or was not) consulted.
struct CountingProvider {
    inner: MockIdentityProvider,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl IdentityProvider for CountingProvider {
    async fn get_user(&self, user_id: &str) -> Result<IdentityUser, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_user(user_id).await
    }
}

fn app_with(provider: impl IdentityProvider + 'static) -> Router {
    // Local mode: the x-user-id header stands in for a verified session.
    let mut config = AppConfig::default();
    config.env = Env::Local;
    create_router(AppState::new(Arc::new(provider), config).unwrap())
}

fn app() -> Router {
    app_with(mock_provider())
}

async fn send(app: Router, path: &str, user_id: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(path);
    if let Some(id) = user_id {
        builder = builder.header("x-user-id", id);
    }
    app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
}

fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

fn assert_redirect(response: &Response, target: &str) {
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(response), Some(target));
}

// --- Unauthenticated callers ---

#[tokio::test]
async fn test_anonymous_on_protected_routes_goes_to_sign_in() {
    for path in ["/dashboard", "/admin/dashboard", "/api/me", "/error", "/settings"] {
        let response = send(app(), path, None).await;
        assert_redirect(&response, "/sign-in");
    }
}

#[tokio::test]
async fn test_anonymous_on_public_routes_passes_through() {
    for path in ["/", "/sign-in", "/sign-up"] {
        let response = send(app(), path, None).await;
        assert_eq!(response.status(), StatusCode::OK, "path {}", path);
    }
}

#[tokio::test]
async fn test_anonymous_webhook_delivery_is_accepted() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhook/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"type":"user.created","data":{"id":"user_new"}}"#))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_anonymous_caller_is_never_looked_up() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = CountingProvider {
        inner: mock_provider(),
        calls: calls.clone(),
    };

    let response = send(app_with(provider), "/sign-in", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// --- Authenticated callers ---

#[tokio::test]
async fn test_member_on_admin_routes_goes_to_dashboard() {
    for path in ["/admin", "/admin/dashboard", "/admin/users/42"] {
        let response = send(app(), path, Some(MEMBER_ID)).await;
        assert_redirect(&response, "/dashboard");
    }
}

#[tokio::test]
async fn test_admin_on_dashboard_goes_to_admin_dashboard() {
    let response = send(app(), "/dashboard", Some(ADMIN_ID)).await;
    assert_redirect(&response, "/admin/dashboard");
}

#[tokio::test]
async fn test_signed_in_on_public_routes_goes_home() {
    for path in ["/", "/sign-in", "/sign-up"] {
        let response = send(app(), path, Some(ADMIN_ID)).await;
        assert_redirect(&response, "/admin/dashboard");

        let response = send(app(), path, Some(MEMBER_ID)).await;
        assert_redirect(&response, "/dashboard");
    }
}

#[tokio::test]
async fn test_member_on_dashboard_passes_through() {
    let response = send(app(), "/dashboard", Some(MEMBER_ID)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(location(&response), None);
}

#[tokio::test]
async fn test_admin_on_admin_dashboard_passes_through() {
    let response = send(app(), "/admin/dashboard", Some(ADMIN_ID)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_or_unrecognised_role_is_treated_as_member() {
    for user in [NO_ROLE_ID, ODD_ROLE_ID] {
        let response = send(app(), "/admin/dashboard", Some(user)).await;
        assert_redirect(&response, "/dashboard");

        let response = send(app(), "/dashboard", Some(user)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_unknown_protected_path_passes_through_to_not_found() {
    let response = send(app(), "/settings", Some(MEMBER_ID)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_every_request_performs_a_fresh_lookup() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = CountingProvider {
        inner: mock_provider(),
        calls: calls.clone(),
    };
    let router = app_with(provider);

    for _ in 0..3 {
        let response = send(router.clone(), "/dashboard", Some(MEMBER_ID)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_api_me_returns_resolved_identity() {
    let response = send(app(), "/api/me", Some(ADMIN_ID)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let profile: CallerProfile = serde_json::from_slice(&body).unwrap();

    assert_eq!(
        profile,
        CallerProfile {
            user_id: ADMIN_ID.to_string(),
            role: Role::Admin,
            home: "/admin/dashboard".to_string(),
        }
    );
}

// --- Identity provider failures ---

#[tokio::test]
async fn test_lookup_failure_redirects_to_error_regardless_of_path() {
    for path in ["/", "/sign-in", "/dashboard", "/admin/dashboard", "/api/me"] {
        let app = app_with(MockIdentityProvider::new_failing());
        let response = send(app, path, Some(MEMBER_ID)).await;
        assert_redirect(&response, "/error");
    }
}

#[tokio::test]
async fn test_unknown_user_redirects_to_error() {
    let response = send(app(), "/dashboard", Some("user_deleted")).await;
    assert_redirect(&response, "/error");
}

#[tokio::test]
async fn test_lookup_is_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = CountingProvider {
        inner: MockIdentityProvider::new_failing(),
        calls: calls.clone(),
    };

    let response = send(app_with(provider), "/dashboard", Some(MEMBER_ID)).await;
    assert_redirect(&response, "/error");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// --- Path filter ---

#[tokio::test]
async fn test_static_assets_skip_the_guard() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = CountingProvider {
        inner: mock_provider(),
        calls: calls.clone(),
    };
    let router = app_with(provider);

    for path in ["/favicon.ico", "/_next/static/chunk"] {
        let response = send(router.clone(), path, Some(MEMBER_ID)).await;
        // Served by the fallback, no redirect.
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = send(app(), "/sign-in", None).await;
    assert!(response.headers().contains_key("x-request-id"));
}
