//! In-process credential store.
//!
//! Holds accounts in a map guarded by one mutex so the three uniqueness checks
//! and the insert happen atomically, matching the unique constraints of the
//! `PostgreSQL` backend. Used by tests and local runs without a database.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::models::{NewUserAccount, UserAccount};
use super::store::{CredentialStore, StoreError, UniqueField};

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    accounts: Mutex<HashMap<String, UserAccount>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.lock().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.accounts.lock().await.get(username).cloned())
    }

    async fn create(&self, account: NewUserAccount) -> Result<UserAccount, StoreError> {
        let mut accounts = self.accounts.lock().await;

        if accounts.contains_key(&account.username) {
            return Err(StoreError::DuplicateKey(UniqueField::Username));
        }
        for existing in accounts.values() {
            if existing.id_number == account.id_number {
                return Err(StoreError::DuplicateKey(UniqueField::IdNumber));
            }
            if existing.account_number == account.account_number {
                return Err(StoreError::DuplicateKey(UniqueField::AccountNumber));
            }
        }

        let now = Utc::now();
        let created = UserAccount {
            id: Uuid::new_v4(),
            username: account.username,
            password_hash: account.password_hash,
            id_number: account.id_number,
            account_number: account.account_number,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(created.username.clone(), created.clone());

        Ok(created)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
