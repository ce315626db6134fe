//! Credential persistence.
//!
//! Uniqueness of username, ID number and account number is enforced here and
//! not only pre-checked by the service: two registrations racing on the same
//! value both pass the service's lookup, but only one insert succeeds.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Connection, PgPool, postgres::PgPoolOptions};
use std::{fmt, time::Duration};
use tracing::{Instrument, debug};

use super::models::{NewUserAccount, UserAccount};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// Identifying field that collided on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    IdNumber,
    AccountNumber,
}

impl UniqueField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::IdNumber => "id_number",
            Self::AccountNumber => "account_number",
        }
    }

    fn from_constraint(constraint: Option<&str>) -> Self {
        match constraint {
            Some("users_id_number_key") => Self::IdNumber,
            Some("users_account_number_key") => Self::AccountNumber,
            _ => Self::Username,
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key on {0}")]
    DuplicateKey(UniqueField),
    #[error("storage backend failure")]
    Backend(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().is_some_and(|code| code.as_ref() == "23505") {
                return Self::DuplicateKey(UniqueField::from_constraint(db_err.constraint()));
            }
        }
        Self::Backend(err)
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account by exact username.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError>;

    /// Insert a new account, setting `id`, `created_at` and `updated_at`.
    ///
    /// Fails with [`StoreError::DuplicateKey`] if any identifying field is taken.
    async fn create(&self, account: NewUserAccount) -> Result<UserAccount, StoreError>;

    /// Cheap round trip used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release backend resources on shutdown.
    async fn close(&self) {}
}

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `PostgreSQL`.
    ///
    /// # Errors
    /// Returns an error if the pool cannot establish its first connection.
    pub async fn connect(dsn: &str) -> Result<Self> {
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

    /// Create the `users` table and its unique constraints if missing.
    ///
    /// # Errors
    /// Returns an error if the schema statements fail.
    pub async fn ensure_schema(&self) -> Result<()> {
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "CREATE"
        );
        sqlx::Executor::execute(&self.pool, SCHEMA_SQL)
            .instrument(span)
            .await
            .context("failed to apply users schema")?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        let query = r"
            SELECT id, username, password_hash, id_number, account_number, created_at, updated_at
            FROM users
            WHERE username = $1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let account = sqlx::query_as::<_, UserAccount>(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        Ok(account)
    }

    async fn create(&self, account: NewUserAccount) -> Result<UserAccount, StoreError> {
        let query = r"
            INSERT INTO users
                (username, password_hash, id_number, account_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, id_number, account_number, created_at, updated_at
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let created = sqlx::query_as::<_, UserAccount>(query)
            .bind(&account.username)
            .bind(&account.password_hash)
            .bind(&account.id_number)
            .bind(&account.account_number)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .map_err(StoreError::from)?;

        debug!(user_id = %created.id, "user row inserted");

        Ok(created)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let span = tracing::info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        async {
            let mut conn = self.pool.acquire().await?;
            conn.ping().await?;
            Ok::<(), StoreError>(())
        }
        .instrument(span)
        .await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
