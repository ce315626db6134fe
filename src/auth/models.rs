use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use sqlx::{FromRow, Row, postgres::PgRow};
use std::fmt;
use uuid::Uuid;

/// A stored customer account, one row of `users`.
#[derive(Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub id_number: String,
    pub account_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for UserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"***")
            .field("id_number", &self.id_number)
            .field("account_number", &self.account_number)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl<'r> FromRow<'r, PgRow> for UserAccount {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            id_number: row.try_get("id_number")?,
            account_number: row.try_get("account_number")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Fields written on registration; the store assigns id and timestamps.
#[derive(Clone)]
pub struct NewUserAccount {
    pub username: String,
    pub password_hash: String,
    pub id_number: String,
    pub account_number: String,
}

impl fmt::Debug for NewUserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUserAccount")
            .field("username", &self.username)
            .field("password_hash", &"***")
            .field("id_number", &self.id_number)
            .field("account_number", &self.account_number)
            .finish()
    }
}

/// Public view of an account returned after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserAccount> for AccountSummary {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            created_at: account.created_at,
        }
    }
}

/// Registration input. Empty strings count as missing fields.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub password: SecretString,
    pub id_number: String,
    pub account_number: String,
}

impl Registration {
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        id_number: impl Into<String>,
        account_number: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            id_number: id_number.into(),
            account_number: account_number.into(),
        }
    }
}

#[derive(Debug)]
pub struct LoginAttempt {
    pub username: String,
    pub password: SecretString,
}

impl LoginAttempt {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}
