//! # Portal (Customer Portal Authentication)
//!
//! `portal` is the backend of the customer portal. It registers customers and
//! authenticates them, handing out short-lived bearer tokens that the frontend
//! attaches to later calls.
//!
//! ## Credentials
//!
//! Every account is identified by three globally unique values: a username
//! (`[A-Za-z0-9_]{3,15}`), a 13-digit national ID number and a 10 to 16 digit
//! account number. Uniqueness is enforced by the storage layer, so concurrent
//! registrations racing on the same value cannot both succeed.
//!
//! Passwords are hashed with Argon2id on the blocking pool and only the PHC
//! string is stored.
//!
//! ## Sessions
//!
//! Sessions are stateless HS256 JWTs carrying `userId` and `username`, valid for
//! one hour by default. The server keeps no session table.
//!
//! ## Abuse Protection
//!
//! Every route is behind a fixed-window limiter keyed by client address
//! (100 requests per 15 minutes by default). Login failures return one generic
//! `401` body whether the username exists or not.

pub mod api;
pub mod auth;
pub mod cli;
pub mod tls;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
