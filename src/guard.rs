use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::{AuthUser, CurrentSession},
    identity::IdentityProvider,
    policy::{self, Caller, Decision, RoutePolicy},
};

/// route_guard
///
/// Middleware applied to the whole router, fallback included.
///
/// 0. Filter: paths `policy::is_guarded_path` rejects (static assets, framework
///    internals) go straight to the inner service. No session or lookup work is done.
/// 1. Session: `CurrentSession` has already resolved the caller's user id (or none)
///    from the local bypass header, the bearer token or the session cookie.
/// 2. Role lookup: signed-in callers are looked up at the identity provider, fresh
///    on every request. Anonymous callers cost no provider call.
/// 3. Decision: the ordered rule table in `policy` yields a redirect or pass-through.
/// 4. Response: a redirect is a 307 with a path-only `Location`. On pass-through an
///    authenticated caller's `AuthUser` is put in the request extensions, so handlers
///    downstream get the role without a second lookup.
pub async fn route_guard(
    State(state): State<AppState>,
    CurrentSession { user_id }: CurrentSession,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    if !policy::is_guarded_path(&path) {
        return next.run(request).await;
    }

    let caller = resolve_caller(state.identity.as_ref(), user_id).await;

    match policy::decide(&state.policy, &path, &caller) {
        Decision::Redirect { target, rule } => {
            tracing::debug!(%path, rule, to = target.path(), "route guard redirect");
            Redirect::temporary(target.path()).into_response()
        }
        Decision::PassThrough => {
            if let Caller::Authenticated { user_id, role } = caller {
                request.extensions_mut().insert(AuthUser { id: user_id, role });
            }
            next.run(request).await
        }
    }
}

/// resolve_caller
///
/// Turns an optional session user id into a `Caller`:
/// - no user id: `Caller::Anonymous`, and the provider is never called;
/// - lookup succeeds: `Caller::Authenticated` with the role read from public metadata;
/// - lookup fails for any reason (transport, status, decode, unknown user):
///   `Caller::LookupFailed`. The error is logged here and the lookup is not retried.
pub async fn resolve_caller(identity: &dyn IdentityProvider, user_id: Option<String>) -> Caller {
    let Some(user_id) = user_id else {
        return Caller::Anonymous;
    };

    match identity.get_user(&user_id).await {
        Ok(user) => Caller::Authenticated {
            role: user.role(),
            user_id,
        },
        Err(e) => {
            tracing::error!(%user_id, error = %e, "failed to fetch user from identity provider");
            Caller::LookupFailed { user_id }
        }
    }
}

/// evaluate
///
/// Convenience for callers outside the middleware stack: resolves and decides in one go.
pub async fn evaluate(
    policy: &RoutePolicy,
    identity: &dyn IdentityProvider,
    path: &str,
    user_id: Option<String>,
) -> Decision {
    let caller = resolve_caller(identity, user_id).await;
    policy::decide(policy, path, &caller)
}
