use super::{ErrorBody, MISSING_PAYLOAD, MessageBody, TokenResponse, auth_error, message};
use crate::auth::{AuthService, Registration};
use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::{fmt, sync::Arc};
use tracing::{debug, instrument};
use utoipa::ToSchema;

pub(crate) const REGISTERED: &str = "User registered successfully!";

/// Registration form. Unknown fields sent by the frontend (`name`,
/// `confirmPassword`) are ignored.
#[derive(ToSchema, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRegister {
    username: Option<String>,
    password: Option<String>,
    id_number: Option<String>,
    account_number: Option<String>,
}

impl fmt::Debug for UserRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRegister")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("id_number", &self.id_number)
            .field("account_number", &self.account_number)
            .finish()
    }
}

impl From<UserRegister> for Registration {
    fn from(form: UserRegister) -> Self {
        Self::new(
            form.username.unwrap_or_default(),
            form.password.unwrap_or_default(),
            form.id_number.unwrap_or_default(),
            form.account_number.unwrap_or_default(),
        )
    }
}

#[utoipa::path(
    post,
    path= "/user/register",
    request_body = UserRegister,
    responses (
        (status = 201, description = "Registration successful", body = TokenResponse, content_type = "application/json"),
        (status = 400, description = "Missing or invalid field, username taken, or user already exists", body = MessageBody),
        (status = 429, description = "Too many requests", body = MessageBody),
        (status = 500, description = "Unexpected server failure", body = ErrorBody),
    ),
    tag= "user"
)]
// axum handler for register
#[instrument(skip(auth, payload))]
pub async fn register(
    auth: Extension<Arc<AuthService>>,
    payload: Option<Json<UserRegister>>,
) -> Response {
    let form: UserRegister = match payload {
        Some(Json(payload)) => payload,
        None => return message(StatusCode::BAD_REQUEST, MISSING_PAYLOAD),
    };

    debug!("user: {:?}", form);

    match auth.register(form.into()).await {
        Ok(registered) => (
            StatusCode::CREATED,
            Json(TokenResponse {
                message: REGISTERED.to_string(),
                token: registered.token,
            }),
        )
            .into_response(),
        Err(err) => auth_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::test_support::{app, json_body, post_json};
    use anyhow::Result;
    use axum::{body::Body, http::Request};
    use serde_json::json;
    use tower::ServiceExt;

    fn alice() -> serde_json::Value {
        json!({
            "name": "Alice",
            "username": "alice_01",
            "password": "Str0ng!Pw",
            "confirmPassword": "Str0ng!Pw",
            "idNumber": "8001015009087",
            "accountNumber": "1234567890"
        })
    }

    #[tokio::test]
    async fn register_returns_created_with_token() -> Result<()> {
        let response = app()?
            .oneshot(post_json("/user/register", &alice())?)
            .await?;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await?;
        assert_eq!(body["message"], REGISTERED);
        assert_eq!(body["token"].as_str().map(|t| t.split('.').count()), Some(3));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_registration_is_bad_request() -> Result<()> {
        let app = app()?;
        let first = app
            .clone()
            .oneshot(post_json("/user/register", &alice())?)
            .await?;
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .clone()
            .oneshot(post_json("/user/register", &alice())?)
            .await?;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        let body = json_body(second).await?;
        assert_eq!(body["message"], "Username already taken");

        let mut same_id = alice();
        same_id["username"] = json!("alice_02");
        same_id["accountNumber"] = json!("9876543210");
        let third = app.oneshot(post_json("/user/register", &same_id)?).await?;
        assert_eq!(third.status(), StatusCode::BAD_REQUEST);
        let body = json_body(third).await?;
        assert_eq!(body["message"], "User already exists");
        Ok(())
    }

    #[tokio::test]
    async fn validation_messages() -> Result<()> {
        let cases = [
            (
                json!({"username": "alice_01", "password": "Str0ng!Pw", "idNumber": "8001015009087"}),
                "Please fill in all fields",
            ),
            (
                json!({"username": "al", "password": "Str0ng!Pw", "idNumber": "8001015009087", "accountNumber": "1234567890"}),
                "Invalid username format. Use 3-15 characters, letters, numbers, or underscores.",
            ),
            (
                json!({"username": "alice_01", "password": "Str0ng!Pw", "idNumber": "12345", "accountNumber": "1234567890"}),
                "ID Number must be 13 digits",
            ),
            (
                json!({"username": "alice_01", "password": "Str0ng!Pw", "idNumber": "8001015009087", "accountNumber": "123"}),
                "Account Number must be between 10 and 16 digits",
            ),
            (
                json!({"username": "alice_01", "password": "password", "idNumber": "8001015009087", "accountNumber": "1234567890"}),
                "Password must be at least 8 characters long and contain at least one uppercase letter, one lowercase letter, one number, and one special character.",
            ),
        ];

        let app = app()?;
        for (payload, expected) in cases {
            let response = app
                .clone()
                .oneshot(post_json("/user/register", &payload)?)
                .await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = json_body(response).await?;
            assert_eq!(body["message"], expected);
        }
        Ok(())
    }

    #[tokio::test]
    async fn missing_payload() -> Result<()> {
        let response = app()?
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/user/register")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await?;
        assert_eq!(body["message"], MISSING_PAYLOAD);
        Ok(())
    }

    #[test]
    fn debug_redacts_password() -> Result<()> {
        let form: UserRegister = serde_json::from_value(alice())?;
        let rendered = format!("{form:?}");
        assert!(rendered.contains("alice_01"));
        assert!(!rendered.contains("Str0ng!Pw"));
        Ok(())
    }
}
