use std::{fmt, sync::Arc};
use tracing::{debug, info, instrument};

use super::error::AuthError;
use super::hasher::PasswordHasher;
use super::models::{AccountSummary, LoginAttempt, NewUserAccount, Registration};
use super::store::{CredentialStore, StoreError, UniqueField};
use super::token::{SessionClaims, TokenError, TokenIssuer};
use super::validator::{validate_login, validate_registration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    pub account: AccountSummary,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedIn {
    pub token: String,
}

/// Register and login flows over a credential store.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService")
            .field("hasher", &self.hasher)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Create an account and sign its first session token.
    ///
    /// # Errors
    /// - `Validation` for a missing field or the first failing format rule.
    /// - `DuplicateUser` if the username, ID number or account number is taken.
    /// - `Internal` if the store, hasher or signer fails.
    #[instrument(skip_all, fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<Registered, AuthError> {
        // 1. Field rules
        validate_registration(&registration)?;

        // 2. Cheap username check; the store still enforces every unique field
        if self
            .store
            .find_by_username(&registration.username)
            .await?
            .is_some()
        {
            debug!("username already registered");
            return Err(AuthError::DuplicateUser(UniqueField::Username));
        }

        // 3. Hash off the executor
        let password_hash = self.hasher.hash_async(registration.password).await?;

        // 4. Insert
        let account = self
            .store
            .create(NewUserAccount {
                username: registration.username,
                password_hash,
                id_number: registration.id_number,
                account_number: registration.account_number,
            })
            .await
            .map_err(|err| {
                if let StoreError::DuplicateKey(field) = &err {
                    debug!(field = %field, "duplicate key on insert");
                }
                AuthError::from(err)
            })?;

        // 5. Token from the committed row
        let token = self.tokens.issue(account.id, &account.username)?;

        info!(user_id = %account.id, "user registered");

        Ok(Registered {
            account: AccountSummary::from(&account),
            token,
        })
    }

    /// Check a username and password and sign a session token.
    ///
    /// # Errors
    /// - `Validation` if either field is empty.
    /// - `UserNotFound` / `InvalidCredentials`; callers must not tell them apart
    ///   in responses.
    /// - `Internal` if the store, hasher or signer fails.
    #[instrument(skip_all, fields(username = %attempt.username))]
    pub async fn login(&self, attempt: LoginAttempt) -> Result<LoggedIn, AuthError> {
        validate_login(&attempt)?;

        let Some(account) = self.store.find_by_username(&attempt.username).await? else {
            // Same Argon2 work as a wrong password
            self.hasher.verify_decoy_async(attempt.password).await?;
            debug!("unknown username");
            return Err(AuthError::UserNotFound);
        };

        let verified = self
            .hasher
            .verify_async(attempt.password, account.password_hash.clone())
            .await?;
        if !verified {
            debug!(user_id = %account.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(account.id, &account.username)?;

        info!(user_id = %account.id, "user logged in");

        Ok(LoggedIn { token })
    }

    /// Decode a bearer token issued by this service.
    ///
    /// # Errors
    /// Returns `TokenError::InvalidToken` for malformed, expired or foreign tokens.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.tokens.verify(token)
    }

    /// Store readiness for the health endpoint.
    ///
    /// # Errors
    /// Returns the store error if the backend is unreachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    pub async fn shutdown(&self) {
        self.store.close().await;
    }
}
