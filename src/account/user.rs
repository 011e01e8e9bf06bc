//! The user entity and its external view.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A persisted user record.
///
/// Invariants held by the registry and the store:
/// - `password_hash` is 64 bytes, `password_salt` is 128 bytes.
/// - `activation_code` is present only while `activated` is false.
/// - `id`, `username` and `email` are unique.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
    pub activated: bool,
    pub activation_code: Option<String>,
}

/// Input for a registration: everything but the credential.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// The externally visible user: no hash, no salt, no activation code.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub activated: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            activated: user.activated,
        }
    }
}
