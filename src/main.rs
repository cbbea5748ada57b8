use route_guard::{
    AppState, HttpIdentityProvider, IdentityState,
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, builds the identity provider client and
/// serves the guarded router.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging: RUST_LOG wins, otherwise debug for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "route_guard=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Route guard starting in {:?} mode", config.env);
    if config.env_defaulted {
        tracing::warn!("APP_ENV is unset or unrecognised; defaulting to local mode");
    }
    if config.env == Env::Local {
        tracing::warn!("local mode: the x-user-id header is accepted as a session");
    }

    // 3. Identity provider client
    let identity = HttpIdentityProvider::new(
        &config.identity_api_url,
        &config.identity_secret_key,
        config.identity_timeout,
    )
    .expect("FATAL: failed to build identity provider client");
    let identity = Arc::new(identity) as IdentityState;

    // 4. State and router
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(identity, config).expect("FATAL: invalid route patterns");
    let app = create_router(app_state);

    // 5. Serve
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind listener");

    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await.expect("server error");
}
