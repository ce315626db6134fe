//! Argon2id password hashing.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$digest`), so
//! verification reads algorithm parameters and salt from the stored value and
//! keeps working after the configured cost changes.
//!
//! Logins for unknown usernames verify against a decoy hash built with the
//! configured cost, so both failure paths spend the same Argon2 work.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, instrument};

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid Argon2 parameters")]
    Params,
    #[error("failed to hash password")]
    Hash,
    #[error("hashing task failed")]
    Join(#[from] tokio::task::JoinError),
}

const DECOY_PASSWORD: &str = "portal-decoy-password";

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    decoy_hash: Arc<str>,
    #[cfg(test)]
    verifications: Arc<AtomicUsize>,
}

impl PasswordHasher {
    /// Build a hasher with explicit Argon2id cost.
    ///
    /// # Errors
    /// Returns `HashError::Params` if the combination is rejected by Argon2,
    /// or `HashError::Hash` if the decoy hash cannot be computed.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|_| HashError::Params)?;
        let mut hasher = Self {
            params,
            decoy_hash: Arc::from(""),
            #[cfg(test)]
            verifications: Arc::new(AtomicUsize::new(0)),
        };
        hasher.decoy_hash = Arc::from(hasher.hash(DECOY_PASSWORD)?);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash with a fresh random salt.
    ///
    /// # Errors
    /// Returns `HashError::Hash` if Argon2 fails.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| HashError::Hash)
    }

    /// Compare a candidate password against a stored PHC string.
    ///
    /// A stored value that does not parse never verifies.
    #[must_use]
    pub fn verify(&self, password: &str, hashed: &str) -> bool {
        #[cfg(test)]
        self.verifications.fetch_add(1, Ordering::Relaxed);

        let Ok(parsed) = PasswordHash::new(hashed) else {
            error!("Stored password hash is not a valid PHC string");
            return false;
        };
        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// [`Self::hash`] on the blocking pool.
    ///
    /// # Errors
    /// Returns an error if hashing fails or the blocking task panics.
    #[instrument(skip_all)]
    pub async fn hash_async(&self, password: SecretString) -> Result<String, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(password.expose_secret())).await?
    }

    /// [`Self::verify`] on the blocking pool.
    ///
    /// # Errors
    /// Returns an error only if the blocking task panics.
    #[instrument(skip_all)]
    pub async fn verify_async(
        &self,
        password: SecretString,
        hashed: String,
    ) -> Result<bool, HashError> {
        let hasher = self.clone();
        let verified =
            tokio::task::spawn_blocking(move || hasher.verify(password.expose_secret(), &hashed))
                .await?;
        Ok(verified)
    }

    /// Spend one verification on the decoy hash.
    ///
    /// Used when the account does not exist; the outcome is discarded.
    ///
    /// # Errors
    /// Returns an error only if the blocking task panics.
    pub async fn verify_decoy_async(&self, password: SecretString) -> Result<(), HashError> {
        self.verify_async(password, self.decoy_hash.to_string())
            .await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn verifications(&self) -> usize {
        self.verifications.load(Ordering::Relaxed)
    }
}
