use super::{ErrorBody, MISSING_PAYLOAD, MessageBody, TokenResponse, auth_error, message};
use crate::auth::{AuthService, LoginAttempt};
use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::{fmt, sync::Arc};
use tracing::instrument;
use utoipa::ToSchema;

pub(crate) const LOGGED_IN: &str = "Login successful!";

#[derive(ToSchema, Deserialize)]
pub struct UserLogin {
    username: Option<String>,
    password: Option<String>,
}

impl fmt::Debug for UserLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserLogin")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[utoipa::path(
    post,
    path= "/user/login",
    request_body = UserLogin,
    responses (
        (status = 200, description = "Login successful", body = TokenResponse, content_type = "application/json"),
        (status = 400, description = "Username or password missing", body = MessageBody),
        (status = 401, description = "Invalid credentials", body = MessageBody),
        (status = 429, description = "Too many requests", body = MessageBody),
        (status = 500, description = "Unexpected server failure", body = ErrorBody),
    ),
    tag= "user"
)]
// axum handler for login
#[instrument(skip(auth, payload))]
pub async fn login(auth: Extension<Arc<AuthService>>, payload: Option<Json<UserLogin>>) -> Response {
    let Some(Json(form)) = payload else {
        return message(StatusCode::BAD_REQUEST, MISSING_PAYLOAD);
    };

    let attempt = LoginAttempt::new(
        form.username.unwrap_or_default(),
        form.password.unwrap_or_default(),
    );

    match auth.login(attempt).await {
        Ok(logged_in) => (
            StatusCode::OK,
            Json(TokenResponse {
                message: LOGGED_IN.to_string(),
                token: logged_in.token,
            }),
        )
            .into_response(),
        Err(err) => auth_error(err),
    }
}
