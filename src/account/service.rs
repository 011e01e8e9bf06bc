//! Account registry and authenticator.
//!
//! Owns the registration flow (validate, uniqueness, hash + PIN, atomic
//! insert, best-effort activation mail), the activation state transition,
//! and username/password authentication.

use rand::{CryptoRng, RngCore};
use regex::Regex;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::account::error::{AccountError, AuthError, CredentialError};
use crate::account::password::PasswordHasher;
use crate::account::pin::PinGenerator;
use crate::account::store::UserStore;
use crate::account::user::{NewAccount, User, UserProfile};
use crate::konto::email::{activation_mail, Mailer};

/// Whether the activation mail made it to the mailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailDelivery {
    Sent,
    Failed,
}

/// Result of a successful registration. The profile never carries the PIN;
/// the code only travels to the mailer.
#[derive(Debug, Clone)]
pub struct Registration {
    pub profile: UserProfile,
    pub mail: MailDelivery,
}

pub struct AccountService<R> {
    store: Arc<dyn UserStore>,
    mailer: Arc<dyn Mailer>,
    // Handlers share the service; the rng-bearing components take &mut, so
    // they sit behind a lock that is never held across an await.
    hasher: Mutex<PasswordHasher<R>>,
    pins: Mutex<PinGenerator<R>>,
    require_activation: bool,
}

impl<R: RngCore + CryptoRng + Send> AccountService<R> {
    pub fn new(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        hasher: PasswordHasher<R>,
        pins: PinGenerator<R>,
        require_activation: bool,
    ) -> Self {
        Self {
            store,
            mailer,
            hasher: Mutex::new(hasher),
            pins: Mutex::new(pins),
            require_activation,
        }
    }

    /// Register a new pending user and send the activation PIN to its email.
    ///
    /// The store insert is the authoritative uniqueness guard; the exists
    /// pre-checks only reject early. Mail delivery failure is logged and
    /// reported in the returned `Registration`, not as an error.
    ///
    /// # Errors
    ///
    /// `Validation` for blank fields or a malformed email,
    /// `DuplicateUsername`/`DuplicateEmail`, or `Store` on backend faults.
    pub async fn register(
        &self,
        account: NewAccount,
        password: &str,
    ) -> Result<Registration, AccountError> {
        if password.trim().is_empty() {
            return Err(AccountError::Validation(
                "password must not be empty or whitespace-only",
            ));
        }

        let username = account.username.trim().to_string();
        if username.is_empty() {
            return Err(AccountError::Validation("username must not be empty"));
        }

        let email = account.email.trim().to_lowercase();
        if !valid_email(&email) {
            return Err(AccountError::Validation("invalid email address"));
        }

        // Advisory early rejection; the insert below still catches races.
        if self.store.username_exists(&username).await? {
            return Err(AccountError::DuplicateUsername);
        }
        if self.store.email_exists(&email).await? {
            return Err(AccountError::DuplicateEmail);
        }

        let credential = {
            let mut hasher = self.hasher.lock().map_err(poisoned_lock)?;
            hasher.hash(password)?
        };
        let pin = {
            let mut pins = self.pins.lock().map_err(poisoned_lock)?;
            pins.generate()
        };

        let user = User {
            id: Uuid::new_v4(),
            username,
            email,
            first_name: account.first_name.trim().to_string(),
            last_name: account.last_name.trim().to_string(),
            password_hash: credential.hash,
            password_salt: credential.salt,
            activated: false,
            activation_code: Some(pin.clone()),
        };

        self.store.insert(&user).await?;

        let mail = self.deliver_activation_mail(&user.email, &pin).await;

        Ok(Registration {
            profile: UserProfile::from(&user),
            mail,
        })
    }

    /// Consume an activation PIN: flip the matching pending user to
    /// activated and clear the code. A miss, including a retry with an
    /// already-consumed code, returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// `Store` on backend faults only.
    pub async fn activate(&self, pincode: &str) -> Result<bool, AccountError> {
        let pincode = pincode.trim();
        if pincode.is_empty() {
            return Ok(false);
        }

        let activated = self.store.activate_by_code(pincode).await?;
        if !activated {
            debug!("no pending account matches the supplied PIN");
        }

        Ok(activated)
    }

    /// Authenticate a username/password pair.
    ///
    /// # Errors
    ///
    /// `Validation` for blank input, `UnknownUser` when the lookup misses,
    /// `BadPassword` on mismatch, `NotActivated` when activation gating is
    /// on and the account is pending, `Credential` when the stored
    /// hash/salt is malformed (storage corruption, fatal for that record).
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(AuthError::Validation);
        }

        let Some(user) = self.store.find_by_username(username).await? else {
            debug!("authentication failed: unknown user");
            return Err(AuthError::UnknownUser);
        };

        let verified = {
            let hasher = self.hasher.lock().map_err(poisoned_auth_lock)?;
            hasher
                .verify(password, &user.password_hash, &user.password_salt)
                .map_err(|err| match err {
                    CredentialError::EmptyPassword => AuthError::Validation,
                    malformed => {
                        error!(user_id = %user.id, "stored credential is malformed: {malformed}");
                        AuthError::Credential(malformed)
                    }
                })?
        };

        if !verified {
            debug!("authentication failed: wrong password");
            return Err(AuthError::BadPassword);
        }

        if self.require_activation && !user.activated {
            debug!(user_id = %user.id, "authentication rejected: account pending activation");
            return Err(AuthError::NotActivated);
        }

        Ok(user)
    }

    /// Store liveness, for the health endpoint.
    ///
    /// # Errors
    ///
    /// Propagates the store's failure.
    pub async fn ping_store(&self) -> Result<(), AccountError> {
        self.store.ping().await.map_err(AccountError::from)
    }

    async fn deliver_activation_mail(&self, email: &str, pin: &str) -> MailDelivery {
        let mailer = Arc::clone(&self.mailer);
        let mail = activation_mail(email, pin);

        // SMTP transports block; keep them off the async workers. The user
        // row is already persisted, so a failure here never rolls back.
        let sent = tokio::task::spawn_blocking(move || mailer.send(&mail)).await;

        match sent {
            Ok(Ok(())) => MailDelivery::Sent,
            Ok(Err(err)) => {
                warn!("failed to deliver activation mail: {err:?}");
                MailDelivery::Failed
            }
            Err(err) => {
                warn!("activation mail task failed: {err}");
                MailDelivery::Failed
            }
        }
    }
}

fn poisoned_lock<T>(_: std::sync::PoisonError<T>) -> AccountError {
    AccountError::Store(anyhow::anyhow!("rng lock poisoned"))
}

fn poisoned_auth_lock<T>(_: std::sync::PoisonError<T>) -> AuthError {
    AuthError::Store(anyhow::anyhow!("rng lock poisoned"))
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}
