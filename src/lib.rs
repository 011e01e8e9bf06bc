//! # Konto (minimal user-account service)
//!
//! `konto` registers users, authenticates them with username/password, and
//! activates accounts via an emailed 4-digit PIN.
//!
//! ## Credential model
//!
//! - Passwords are never stored. A credential is `HMAC-SHA-512` over the
//!   password bytes, keyed by a fresh 128-byte random salt per user; the
//!   64-byte MAC and the salt are persisted, and verification compares in
//!   constant time.
//! - Activation PINs are uniform 4-digit codes, present only while an
//!   account is pending; activation consumes the code atomically.
//!
//! ## Uniqueness
//!
//! Username and email are globally unique. The registry pre-checks for
//! early rejection, but the store's UNIQUE constraints are the source of
//! truth, so concurrent registrations cannot both win.
//!
//! ## Boundaries
//!
//! Session/token issuance, schema migration tooling, and UI belong to the
//! caller layer; the mailer and the user store are injected collaborators.

pub mod account;
pub mod cli;
pub mod konto;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
