use thiserror::Error;

use crate::account::password::{HASH_LEN, SALT_LEN};

/// Failures of the credential hasher itself.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password must not be empty or whitespace-only")]
    EmptyPassword,
    #[error("invalid length of password hash ({HASH_LEN} bytes expected, got {0})")]
    MalformedHash(usize),
    #[error("invalid length of password salt ({SALT_LEN} bytes expected, got {0})")]
    MalformedSalt(usize),
}

/// Failures raised by a `UserStore` implementation.
///
/// The duplicate variants are the storage-layer uniqueness guard: the
/// registry's pre-checks are advisory only, the store is authoritative.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username is already taken")]
    DuplicateUsername,
    #[error("email is already taken")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Failures of registration and activation.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("username is already taken")]
    DuplicateUsername,
    #[error("email is already taken")]
    DuplicateEmail,
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => Self::DuplicateUsername,
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::Backend(err) => Self::Store(err),
        }
    }
}

/// Authentication rejection.
///
/// `UnknownUser` and `BadPassword` are distinct here so the service can log
/// what happened, but callers must render both identically to avoid
/// username enumeration.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password must not be empty")]
    Validation,
    #[error("unknown user")]
    UnknownUser,
    #[error("wrong password")]
    BadPassword,
    #[error("account is not activated")]
    NotActivated,
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            // Lookups never report duplicates; treat any as a backend fault.
            StoreError::DuplicateUsername | StoreError::DuplicateEmail => {
                Self::Store(anyhow::anyhow!(err))
            }
            StoreError::Backend(err) => Self::Store(err),
        }
    }
}
