use super::{INVALID_SESSION, MessageBody, bearer_token, message};
use crate::auth::AuthService;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    user_id: Uuid,
    username: String,
    expires_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path= "/user/session",
    responses (
        (status = 200, description = "Bearer token is valid", body = Session),
        (status = 401, description = "Missing, expired or invalid token", body = MessageBody),
    ),
    security(("bearer" = [])),
    tag= "user"
)]
// axum handler for session
#[instrument(skip(auth, headers))]
pub async fn session(auth: Extension<Arc<AuthService>>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return message(StatusCode::UNAUTHORIZED, INVALID_SESSION);
    };

    let claims = match auth.verify_session(token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!("Session rejected: {}", err);
            return message(StatusCode::UNAUTHORIZED, INVALID_SESSION);
        }
    };

    let Some(expires_at) = DateTime::from_timestamp(claims.exp, 0) else {
        return message(StatusCode::UNAUTHORIZED, INVALID_SESSION);
    };

    Json(Session {
        user_id: claims.user_id,
        username: claims.username,
        expires_at,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::test_support::{app_with, auth_service, json_body, post_json};
    use crate::auth::NoopRateLimiter;
    use anyhow::{Result, anyhow};
    use axum::{body::Body, http::Request};
    use serde_json::json;
    use tower::ServiceExt;

    fn session_request(authorization: Option<&str>) -> Result<Request<Body>> {
        let mut builder = Request::builder().uri("/user/session");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        Ok(builder.body(Body::empty())?)
    }

    #[tokio::test]
    async fn session_decodes_login_token() -> Result<()> {
        let app = app_with(auth_service()?, Arc::new(NoopRateLimiter));
        let registered = app
            .clone()
            .oneshot(post_json(
                "/user/register",
                &json!({
                    "username": "carol_03",
                    "password": "Passw0rd!",
                    "idNumber": "7001015009087",
                    "accountNumber": "3234567890"
                }),
            )?)
            .await?;
        let body = json_body(registered).await?;
        let token = body["token"]
            .as_str()
            .ok_or_else(|| anyhow!("token missing"))?;

        let response = app
            .oneshot(session_request(Some(&format!("Bearer {token}")))?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await?;
        assert_eq!(body["username"], "carol_03");
        assert!(body["userId"].is_string());
        assert!(body["expiresAt"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn missing_or_invalid_token_is_unauthorized() -> Result<()> {
        let app = app_with(auth_service()?, Arc::new(NoopRateLimiter));
        for authorization in [None, Some("Bearer not.a.token"), Some("Basic abc")] {
            let response = app.clone().oneshot(session_request(authorization)?).await?;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = json_body(response).await?;
            assert_eq!(body["message"], INVALID_SESSION);
        }
        Ok(())
    }
}
