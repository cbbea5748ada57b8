use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use jsonwebtoken::{Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env, SessionKey},
    models::Role,
};

/// Name of the cookie the identity provider's frontend SDK stores the session token in.
pub const SESSION_COOKIE_NAME: &str = "__session";

/// Development-only header carrying a user id directly.
pub const LOCAL_BYPASS_HEADER: &str = "x-user-id";

/// Claims
///
/// The subset of the provider's session token payload the guard relies on.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the provider's user id, e.g. `user_2abc...`.
    pub sub: String,
    /// Expiration Time (exp). Always validated.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
    /// Session id (sid), when the provider includes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

/// CurrentSession
///
/// The caller's user id if the request carries a valid session, `None` otherwise.
///
/// Extraction never rejects: an absent, expired or forged token simply means the
/// caller is anonymous, and the route policy decides what that implies.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSession {
    pub user_id: Option<String>,
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(Self {
            user_id: resolve_user_id(&parts.headers, &config),
        })
    }
}

/// resolve_user_id
///
/// The session resolution chain, run once per guarded request:
/// 1. Local bypass: `x-user-id` is trusted as-is, but only in `Env::Local`. An empty
///    header value is ignored and resolution continues with the token.
/// 2. Token extraction: `Authorization: Bearer <token>` first. Only when there is no
///    usable bearer token is the `__session` cookie consulted, so a stale cookie never
///    overrides an explicit header.
/// 3. Verification: signature and expiry against the session key parsed at startup.
///    The `sub` claim becomes the user id.
///
/// Every failure along the way yields `None`. The reason is logged at debug level; the
/// caller is simply anonymous and the route policy takes it from there.
pub fn resolve_user_id(headers: &HeaderMap, config: &AppConfig) -> Option<String> {
    if config.env == Env::Local {
        if let Some(user_id) = headers
            .get(LOCAL_BYPASS_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
        {
            return Some(user_id.to_string());
        }
    }

    let token = bearer_token(headers).or_else(|| session_cookie(headers))?;

    match verify_session_token(token, &config.session_key) {
        Ok(claims) => Some(claims.sub),
        Err(e) => {
            tracing::debug!(error = %e, "session token rejected; treating caller as anonymous");
            None
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|cookie| {
            cookie
                .strip_prefix(SESSION_COOKIE_NAME)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|token| !token.is_empty())
}

/// verify_session_token
///
/// Decodes the token and validates its signature and `exp` claim.
///
/// Only the key's own algorithm is accepted: an HS256 token is rejected under an RSA
/// key and vice versa.
pub fn verify_session_token(
    token: &str,
    key: &SessionKey,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(key.algorithm());
    validation.validate_exp = true;
    // Session tokens are not minted for a specific audience.
    validation.validate_aud = false;

    decode::<Claims>(token, key.decoding_key(), &validation).map(|data| data.claims)
}

/// AuthUser
///
/// The identity the route guard resolved for a signed-in caller. The guard inserts it
/// into the request extensions on pass-through, so handlers behind the guard can take
/// it as an argument without a second provider lookup.
///
/// Rejection: `401 Unauthorized` when the request did not pass the guard as a signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
