use super::{forwarded_client_ip, message};
use crate::auth::{RateLimitDecision, RateLimiter};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::Response,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::warn;

pub(crate) const TOO_MANY_REQUESTS: &str = "Too many requests, please try again later.";

/// Peer address when the connection provides one, else forwarding headers.
fn client_ip(request: &Request) -> Option<String> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(peer)| peer.ip().to_string())
        .or_else(|| forwarded_client_ip(request.headers()))
}

pub async fn enforce(
    State(limiter): State<Arc<dyn RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);

    match limiter.check_ip(ip.as_deref()) {
        RateLimitDecision::Allowed => next.run(request).await,
        RateLimitDecision::Limited {
            retry_after_seconds,
        } => {
            warn!(client_ip = ip.as_deref().unwrap_or("unknown"), "Rate limit exceeded");
            let mut response = message(StatusCode::TOO_MANY_REQUESTS, TOO_MANY_REQUESTS);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_seconds));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::test_support::{app_with, auth_service, json_body};
    use crate::auth::FixedWindowRateLimiter;
    use anyhow::Result;
    use axum::body::Body;
    use std::time::Duration;
    use tower::ServiceExt;

    fn get_root(forwarded_for: &'static str) -> Result<Request> {
        Ok(Request::builder()
            .uri("/")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())?)
    }

    #[test]
    fn peer_address_wins_over_headers() -> Result<()> {
        let mut request = get_root("1.2.3.4")?;
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 9], 443))));
        assert_eq!(client_ip(&request), Some("203.0.113.9".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn request_over_limit_is_rejected() -> Result<()> {
        let limiter = Arc::new(FixedWindowRateLimiter::new(2, Duration::from_secs(900)));
        let app = app_with(auth_service()?, limiter);

        for _ in 0..2 {
            let response = app.clone().oneshot(get_root("198.51.100.7")?).await?;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(get_root("198.51.100.7")?).await?;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = response.headers()[RETRY_AFTER].to_str()?.parse()?;
        assert!(retry_after > 0 && retry_after <= 900);
        assert!(response.headers().contains_key("x-request-id"));
        let body = json_body(response).await?;
        assert_eq!(body["message"], TOO_MANY_REQUESTS);

        // Another client still has its own budget
        let response = app.oneshot(get_root("198.51.100.8")?).await?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }
}
