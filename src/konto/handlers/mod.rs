pub mod health;
pub use self::health::health;

pub mod user_register;
pub use self::user_register::register;

pub mod user_login;
pub use self::user_login::login;

pub mod activate;
pub use self::activate::activate;

use crate::account::AccountService;
use rand::rngs::OsRng;
use std::sync::Arc;

/// The service type handlers pull out of the request extensions.
pub type SharedAccountService = Arc<AccountService<OsRng>>;
