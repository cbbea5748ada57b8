use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// The metadata value that grants admin access.
pub const ADMIN_ROLE: &str = "admin";

/// Role
///
/// The caller's dashboard role as far as routing is concerned. Only an exact `"admin"`
/// in the provider's public metadata yields `Admin`; a missing role or any other value
/// is a `Member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl Role {
    pub fn from_metadata(role: Option<&str>) -> Self {
        match role {
            Some(ADMIN_ROLE) => Role::Admin,
            _ => Role::Member,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

/// PublicMetadata
///
/// The part of the provider's user record that is readable by the application.
/// Only `role` matters here; everything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PublicMetadata {
    #[serde(default)]
    pub role: Option<String>,
}

/// IdentityUser
///
/// A user record as returned by the identity provider's backend API.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub public_metadata: PublicMetadata,
}

impl IdentityUser {
    pub fn role(&self) -> Role {
        Role::from_metadata(self.public_metadata.role.as_deref())
    }
}

/// CallerProfile
///
/// Response body of `GET /api/me`: the identity the guard resolved for this request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct CallerProfile {
    pub user_id: String,
    pub role: Role,
    // Where the guard sends this caller when they land on a public page.
    pub home: String,
}
