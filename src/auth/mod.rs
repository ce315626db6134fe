//! Credential validation, storage, hashing and session tokens.
//!
//! [`AuthService`] is the entry point used by the HTTP handlers. It is built
//! once at startup from its collaborators and shared behind an `Arc`:
//!
//! - [`validator`]: format rules for every credential field.
//! - [`store`]: the [`CredentialStore`] contract and its `PostgreSQL` backend.
//! - [`memory`]: an in-process store with the same uniqueness guarantees.
//! - [`hasher`]: Argon2id hashing, run off the async executor.
//! - [`token`]: HS256 session tokens.
//! - [`rate_limit`]: per-address fixed-window limiting.

pub mod error;
pub mod hasher;
pub mod memory;
pub mod models;
pub mod rate_limit;
pub mod service;
pub mod store;
pub mod token;
pub mod validator;

pub use error::{AuthError, InternalError};
pub use hasher::PasswordHasher;
pub use memory::MemoryCredentialStore;
pub use models::{AccountSummary, LoginAttempt, NewUserAccount, Registration, UserAccount};
pub use rate_limit::{FixedWindowRateLimiter, NoopRateLimiter, RateLimitDecision, RateLimiter};
pub use service::{AuthService, LoggedIn, Registered};
pub use store::{CredentialStore, PgCredentialStore, StoreError, UniqueField};
pub use token::{SessionClaims, TokenError, TokenIssuer};
pub use validator::ValidationError;
