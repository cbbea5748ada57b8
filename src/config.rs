use jsonwebtoken::{Algorithm, DecodingKey};
use std::{env, fmt, time::Duration};

use crate::error::ConfigError;

/// AppConfig
///
/// Holds the guard's entire configuration. Loaded once at startup and never mutated,
/// it is pulled into handlers and middleware via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the local `x-user-id` bypass and log format.
    pub env: Env,
    // True when APP_ENV was unset or unrecognised and `env` fell back to Local.
    pub env_defaulted: bool,
    // Address the HTTP server binds to.
    pub bind_addr: String,
    // Base URL of the identity provider's backend API.
    pub identity_api_url: String,
    // Secret key authorizing backend API calls (user lookups).
    pub identity_secret_key: String,
    // Key used to verify session tokens.
    pub session_key: SessionKey,
    // Upper bound on a single user lookup.
    pub identity_timeout: Duration,
}

/// Env
///
/// Runtime context: `Local` enables development conveniences, `Production` hardens them off.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Env {
    /// Parses an `APP_ENV` value; anything but `local` or `production` is unrecognised.
    pub fn parse(raw: &str) -> Option<Env> {
        match raw {
            "production" => Some(Env::Production),
            "local" => Some(Env::Local),
            _ => None,
        }
    }
}

/// SessionKey
///
/// The parsed key session tokens are verified with, and the algorithm it implies.
/// Hosted providers sign with RSA and publish a PEM public key (RS256); HMAC secrets
/// (HS256) are accepted for local setups and tests.
///
/// Parsing happens once, at configuration time, so a bad PEM stops the service at
/// startup instead of silently failing every token check.
#[derive(Clone)]
pub struct SessionKey {
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl SessionKey {
    /// HS256 shared secret.
    pub fn secret(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
        }
    }

    /// RS256 public key, PEM encoded.
    pub fn rsa_pem(pem: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            decoding_key: DecodingKey::from_rsa_pem(pem.as_bytes())?,
            algorithm: Algorithm::RS256,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

// Key material stays out of logs.
impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

const LOCAL_SESSION_SECRET: &str = "super-secure-test-secret-value-local";
const DEFAULT_IDENTITY_API_URL: &str = "https://api.clerk.com";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

impl Default for AppConfig {
    /// Safe values for test scaffolding; no environment access.
    fn default() -> Self {
        Self {
            env: Env::Local,
            env_defaulted: false,
            bind_addr: "127.0.0.1:0".to_string(),
            identity_api_url: "http://localhost:9100".to_string(),
            identity_secret_key: "sk_test_local".to_string(),
            session_key: SessionKey::secret(LOCAL_SESSION_SECRET),
            identity_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables and fails fast on anything
    /// that would leave the guard running in a broken state:
    /// 1. `APP_ENV` selects the environment; unset or unknown values fall back to
    ///    `Env::Local` and are flagged in `env_defaulted` so startup can warn about it.
    /// 2. In production the provider secret is mandatory.
    /// 3. The session key is parsed here: `SESSION_PUBLIC_KEY` (PEM, RS256) wins over
    ///    `SESSION_JWT_KEY` (HS256). A PEM that does not parse is an error in every
    ///    environment; a missing key is an error in production only.
    /// 4. Numeric settings must parse.
    pub fn load() -> Result<Self, ConfigError> {
        let parsed_env = env::var("APP_ENV").ok().as_deref().and_then(Env::parse);
        let env_defaulted = parsed_env.is_none();
        let env = parsed_env.unwrap_or(Env::Local);

        let identity_secret_key = match env {
            Env::Production => {
                env::var("IDENTITY_SECRET_KEY").map_err(|_| ConfigError::Missing("IDENTITY_SECRET_KEY"))?
            }
            Env::Local => env::var("IDENTITY_SECRET_KEY").unwrap_or_else(|_| "sk_test_local".to_string()),
        };

        let session_key = match (env::var("SESSION_PUBLIC_KEY"), env::var("SESSION_JWT_KEY")) {
            (Ok(pem), _) => SessionKey::rsa_pem(&pem).map_err(|e| ConfigError::Invalid {
                var: "SESSION_PUBLIC_KEY",
                reason: e.to_string(),
            })?,
            (Err(_), Ok(secret)) => SessionKey::secret(&secret),
            (Err(_), Err(_)) => match env {
                Env::Production => return Err(ConfigError::Missing("SESSION_PUBLIC_KEY")),
                Env::Local => SessionKey::secret(LOCAL_SESSION_SECRET),
            },
        };

        let identity_timeout = match env::var("IDENTITY_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    var: "IDENTITY_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            env,
            env_defaulted,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            identity_api_url: env::var("IDENTITY_API_URL")
                .unwrap_or_else(|_| DEFAULT_IDENTITY_API_URL.to_string()),
            identity_secret_key,
            session_key,
            identity_timeout,
        })
    }
}
