//! Route handlers and the JSON shapes they share.
//!
//! Every error response has a `message`; server failures add an `error`
//! category. Internal details are logged, never returned.

pub mod health;
pub mod rate_limit;
pub mod root;
pub mod user_login;
pub mod user_register;
pub mod user_session;

use crate::auth::AuthError;
use axum::{
    Json,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

pub(crate) const MISSING_PAYLOAD: &str = "Missing payload";
pub(crate) const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub(crate) const INVALID_SESSION: &str = "Invalid or expired session";
pub(crate) const SERVER_ERROR: &str = "Server error";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageBody {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub message: String,
    /// Coarse failure category: `storage`, `hashing` or `token`.
    pub error: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
}

pub(crate) fn message(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(MessageBody {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Map a service failure to its response.
///
/// Unknown users and wrong passwords share one body so responses cannot be
/// used to enumerate accounts.
pub(crate) fn auth_error(err: AuthError) -> Response {
    match err {
        AuthError::Validation(rule) => message(StatusCode::BAD_REQUEST, rule.to_string()),
        AuthError::DuplicateUser(_) => message(StatusCode::BAD_REQUEST, err.to_string()),
        AuthError::UserNotFound | AuthError::InvalidCredentials => {
            debug!("Rejected credentials: {}", err);
            message(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS)
        }
        AuthError::Internal(internal) => {
            error!("Internal error: {:?}", internal);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    message: SERVER_ERROR.to_string(),
                    error: internal.category().to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// First `X-Forwarded-For` entry, else `X-Real-IP`.
pub(crate) fn forwarded_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
