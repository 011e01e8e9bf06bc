//! Salted password hashing.
//!
//! A credential is `HMAC-SHA-512(key = salt, msg = password bytes)` where the
//! salt is 128 bytes drawn fresh from the injected rng on every `hash` call.
//! Verification recomputes the MAC with the stored salt and compares in
//! constant time.

use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use sha2::Sha512;

use crate::account::error::CredentialError;

/// Stored hash length in bytes (raw SHA-512 MAC output).
pub const HASH_LEN: usize = 64;

/// Stored salt length in bytes (HMAC key).
pub const SALT_LEN: usize = 128;

type HmacSha512 = Hmac<Sha512>;

/// A freshly derived credential, ready to persist.
#[derive(Debug, Clone)]
pub struct HashedPassword {
    pub hash: Vec<u8>,
    pub salt: Vec<u8>,
}

/// Derives and verifies salted password hashes.
///
/// The rng is injected so tests can seed it; production uses `OsRng`.
#[derive(Debug)]
pub struct PasswordHasher<R> {
    rng: R,
}

impl<R: RngCore + CryptoRng> PasswordHasher<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Derive a hash and a fresh salt from a plaintext password.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::EmptyPassword` if the password is empty or
    /// whitespace-only.
    pub fn hash(&mut self, password: &str) -> Result<HashedPassword, CredentialError> {
        if password.trim().is_empty() {
            return Err(CredentialError::EmptyPassword);
        }

        let mut salt = [0u8; SALT_LEN];
        self.rng.fill_bytes(&mut salt);

        let mac = compute_mac(password, &salt)?;

        Ok(HashedPassword {
            hash: mac,
            salt: salt.to_vec(),
        })
    }

    /// Verify a plaintext password against a stored hash and salt.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::EmptyPassword` for an empty or
    /// whitespace-only password, `MalformedHash`/`MalformedSalt` when the
    /// stored lengths are wrong (storage corruption, fatal for that record).
    pub fn verify(
        &self,
        password: &str,
        stored_hash: &[u8],
        stored_salt: &[u8],
    ) -> Result<bool, CredentialError> {
        if password.trim().is_empty() {
            return Err(CredentialError::EmptyPassword);
        }

        if stored_hash.len() != HASH_LEN {
            return Err(CredentialError::MalformedHash(stored_hash.len()));
        }

        if stored_salt.len() != SALT_LEN {
            return Err(CredentialError::MalformedSalt(stored_salt.len()));
        }

        let mut mac = HmacSha512::new_from_slice(stored_salt)
            .map_err(|_| CredentialError::MalformedSalt(stored_salt.len()))?;
        mac.update(password.as_bytes());

        // verify_slice compares in constant time.
        Ok(mac.verify_slice(stored_hash).is_ok())
    }
}

fn compute_mac(password: &str, salt: &[u8]) -> Result<Vec<u8>, CredentialError> {
    let mut mac = HmacSha512::new_from_slice(salt)
        .map_err(|_| CredentialError::MalformedSalt(salt.len()))?;
    mac.update(password.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn hasher() -> PasswordHasher<StdRng> {
        PasswordHasher::new(StdRng::seed_from_u64(42))
    }

    #[test]
    fn hash_then_verify_roundtrip() {
        let mut hasher = hasher();
        let credential = hasher.hash("Secret123").unwrap();
        assert_eq!(credential.hash.len(), HASH_LEN);
        assert_eq!(credential.salt.len(), SALT_LEN);
        assert!(hasher
            .verify("Secret123", &credential.hash, &credential.salt)
            .unwrap());
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let mut hasher = hasher();
        let credential = hasher.hash("correctpw").unwrap();
        assert!(!hasher
            .verify("wrongpw", &credential.hash, &credential.salt)
            .unwrap());
    }

    #[test]
    fn empty_or_whitespace_password_is_rejected() {
        let mut hasher = hasher();
        assert!(matches!(
            hasher.hash(""),
            Err(CredentialError::EmptyPassword)
        ));
        assert!(matches!(
            hasher.hash("   \t"),
            Err(CredentialError::EmptyPassword)
        ));

        let credential = hasher.hash("pw").unwrap();
        assert!(matches!(
            hasher.verify(" ", &credential.hash, &credential.salt),
            Err(CredentialError::EmptyPassword)
        ));
    }

    #[test]
    fn malformed_stored_lengths_are_rejected() {
        let hasher = hasher();
        for hash_len in [63, 65] {
            let result = hasher.verify("pw", &vec![0u8; hash_len], &[0u8; SALT_LEN]);
            assert!(matches!(result, Err(CredentialError::MalformedHash(n)) if n == hash_len));
        }
        for salt_len in [127, 129] {
            let result = hasher.verify("pw", &[0u8; HASH_LEN], &vec![0u8; salt_len]);
            assert!(matches!(result, Err(CredentialError::MalformedSalt(n)) if n == salt_len));
        }
    }

    #[test]
    fn salts_are_fresh_on_every_call() {
        let mut hasher = hasher();
        let first = hasher.hash("same-password").unwrap();
        let second = hasher.hash("same-password").unwrap();
        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn seeded_rng_makes_hashing_deterministic() {
        let first = PasswordHasher::new(StdRng::seed_from_u64(7))
            .hash("pw")
            .unwrap();
        let second = PasswordHasher::new(StdRng::seed_from_u64(7))
            .hash("pw")
            .unwrap();
        assert_eq!(first.salt, second.salt);
        assert_eq!(first.hash, second.hash);
    }

    #[test]
    fn different_passwords_do_not_collide() {
        let mut hasher = hasher();
        let credential = hasher.hash("password-one").unwrap();
        assert!(!hasher
            .verify("password-two", &credential.hash, &credential.salt)
            .unwrap());
    }
}
