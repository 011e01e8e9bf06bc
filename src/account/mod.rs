//! The credential and activation core: password hashing, PIN generation,
//! the account registry, and the authenticator.

pub mod error;
pub mod password;
pub mod pin;
pub mod service;
pub mod store;
pub mod user;

pub use error::{AccountError, AuthError, CredentialError, StoreError};
pub use service::{AccountService, MailDelivery, Registration};
pub use user::{NewAccount, User, UserProfile};
