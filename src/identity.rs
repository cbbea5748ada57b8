use async_trait::async_trait;
use reqwest::Url;
use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::{
    error::IdentityError,
    models::{IdentityUser, PublicMetadata},
};

// 1. IdentityProvider Contract
/// IdentityProvider
///
/// The abstract contract for reading user records from the hosted identity service.
/// The guard only ever reads; role persistence belongs to the provider.
///
/// Held as `Arc<dyn IdentityProvider>` in the application state so tests can swap in
/// `MockIdentityProvider` without touching the network.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetches the current user record, including its public metadata.
    async fn get_user(&self, user_id: &str) -> Result<IdentityUser, IdentityError>;
}

/// IdentityState
///
/// The concrete type used to share the provider client across the application state.
pub type IdentityState = Arc<dyn IdentityProvider>;

// 2. The Real Implementation (backend REST API)
/// HttpIdentityProvider
///
/// Calls `GET {api_url}/v1/users/{user_id}` authorized with the instance's secret key.
/// The user id always travels as a single percent-encoded path segment.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    api_url: Url,
    secret_key: String,
}

impl HttpIdentityProvider {
    pub fn new(api_url: &str, secret_key: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let api_url = Url::parse(api_url).map_err(|e| IdentityError::InvalidUrl(e.to_string()))?;
        if api_url.cannot_be_a_base() {
            return Err(IdentityError::InvalidUrl(api_url.to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url,
            secret_key: secret_key.to_string(),
        })
    }

    /// `{api_url}/v1/users/{user_id}`. `/`, `?`, `#` and `%` in the id are escaped, so
    /// the id cannot steer the request to another endpoint.
    fn user_url(&self, user_id: &str) -> Result<Url, IdentityError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| IdentityError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(["v1", "users", user_id]);
        Ok(url)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn get_user(&self, user_id: &str) -> Result<IdentityUser, IdentityError> {
        let url = self.user_url(user_id)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::NotFound(user_id.to_string()));
        }
        if !status.is_success() {
            return Err(IdentityError::Status { status });
        }

        let user = response.json::<IdentityUser>().await?;
        Ok(user)
    }
}

// 3. The Mock Implementation (for tests and offline development)
/// MockIdentityProvider
///
/// Serves user records from memory. `new_failing` simulates a provider outage.
#[derive(Clone, Default)]
pub struct MockIdentityProvider {
    users: HashMap<String, IdentityUser>,
    /// When true, every lookup fails with a transport error.
    pub should_fail: bool,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            users: HashMap::new(),
            should_fail: true,
        }
    }

    /// Registers a user with the given role (`None` leaves the metadata empty).
    pub fn with_user(mut self, user_id: &str, role: Option<&str>) -> Self {
        self.users.insert(
            user_id.to_string(),
            IdentityUser {
                id: user_id.to_string(),
                public_metadata: PublicMetadata {
                    role: role.map(str::to_string),
                },
            },
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn get_user(&self, user_id: &str) -> Result<IdentityUser, IdentityError> {
        if self.should_fail {
            return Err(IdentityError::Transport(
                "Mock Identity Error: Simulation requested".to_string(),
            ));
        }

        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| IdentityError::NotFound(user_id.to_string()))
    }
}
