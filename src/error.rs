use axum::http::StatusCode;

/// IdentityError
///
/// Failure modes of a role lookup against the identity provider. Every variant is
/// treated the same way by the guard (log, then redirect to `/error`); they are kept
/// apart so the log line says what actually went wrong.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The request never produced a response (DNS, TLS, connect, timeout).
    #[error("identity provider unreachable: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("identity provider returned {status}")]
    Status { status: StatusCode },

    /// The response body was not a user record.
    #[error("malformed user record: {0}")]
    Decode(String),

    /// No user exists with the given id.
    #[error("user {0} not found")]
    NotFound(String),

    /// The configured API URL cannot carry a `/v1/users/{id}` path.
    #[error("invalid identity provider url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            IdentityError::Decode(err.to_string())
        } else {
            IdentityError::Transport(err.to_string())
        }
    }
}

/// ConfigError
///
/// Raised by `AppConfig::load` when the environment cannot produce a usable configuration.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}
