//! Persistence contract for user records.
//!
//! The store is the authoritative uniqueness guard: `insert` must reject
//! duplicate usernames/emails atomically even when the registry's advisory
//! pre-checks raced another registration. `activate_by_code` must flip
//! `activated` and clear the code in a single atomic update.

use async_trait::async_trait;

use crate::account::error::StoreError;
use crate::account::user::User;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgUserStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user atomically.
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    /// Exact-match lookup by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Atomically activate the pending user holding this code and clear the
    /// code. Returns `false` when no pending user matches, including retries
    /// with an already-consumed code.
    async fn activate_by_code(&self, code: &str) -> Result<bool, StoreError>;

    /// Liveness check for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
