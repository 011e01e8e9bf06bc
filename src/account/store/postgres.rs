//! Postgres-backed user store.
//!
//! Schema lives in `db/sql/01_konto.sql`. The UNIQUE constraints on
//! `username` and `email` are the source of truth for uniqueness; inserts
//! map violation 23505 back to the duplicate errors by constraint name.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Connection, PgPool, Row};
use std::time::Duration;
use tracing::{info_span, Instrument};

use crate::account::error::StoreError;
use crate::account::store::UserStore;
use crate::account::user::User;

const USERNAME_KEY: &str = "users_username_key";
const EMAIL_KEY: &str = "users_email_key";

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the same pool shape the service has always used.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(pool))
    }
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().is_some_and(|code| code.as_ref() == "23505") {
            return match db_err.constraint() {
                Some(USERNAME_KEY) => StoreError::DuplicateUsername,
                Some(EMAIL_KEY) => StoreError::DuplicateEmail,
                _ => StoreError::Backend(anyhow::Error::new(err).context("unique violation")),
            };
        }
    }
    StoreError::Backend(anyhow::Error::new(err).context("failed to insert user"))
}

async fn exists(pool: &PgPool, query: &'static str, value: &str) -> Result<bool, StoreError> {
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(value)
        .fetch_one(pool)
        .instrument(span)
        .await
        .map_err(|err| {
            StoreError::Backend(anyhow::Error::new(err).context("failed existence check"))
        })?;

    Ok(row.get("exists"))
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        password_hash: row.get("password_hash"),
        password_salt: row.get("password_salt"),
        activated: row.get("activated"),
        activation_code: row.get("activation_code"),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO users
                (id, username, email, first_name, last_name,
                 password_hash, password_salt, activated, activation_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(&user.password_salt)
            .bind(user.activated)
            .bind(&user.activation_code)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map(|_| ())
            .map_err(map_unique_violation)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let query = r"
            SELECT id, username, email, first_name, last_name,
                   password_hash, password_salt, activated, activation_code
            FROM users
            WHERE username = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| {
                StoreError::Backend(anyhow::Error::new(err).context("failed to look up user"))
            })?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        exists(
            &self.pool,
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1) AS exists",
            username,
        )
        .await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        exists(
            &self.pool,
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS exists",
            email,
        )
        .await
    }

    async fn activate_by_code(&self, code: &str) -> Result<bool, StoreError> {
        // Single statement keeps flip-and-clear atomic and makes retries
        // with a consumed code miss.
        let query = r"
            UPDATE users
            SET activated = TRUE, activation_code = NULL
            WHERE activation_code = $1 AND NOT activated
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(code)
            .execute(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| {
                StoreError::Backend(anyhow::Error::new(err).context("failed to activate account"))
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .map_err(|err| {
                StoreError::Backend(
                    anyhow::Error::new(err).context("failed to acquire database connection"),
                )
            })?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await.map_err(|err| {
            StoreError::Backend(anyhow::Error::new(err).context("failed to ping database"))
        })
    }
}
