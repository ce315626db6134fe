use crate::{
    api::handlers::{health, rate_limit, root, user_login, user_register, user_session},
    auth::{AuthService, RateLimiter},
};
use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router,
    body::Body,
    extract::{ConnectInfo, MatchedPath},
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{
            AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware,
    routing::{get, post},
};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
    service::TowerToHyperService,
};
use rustls::ServerConfig;
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, task::JoinSet};
use tokio_rustls::TlsAcceptor;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::{SetRequestHeaderLayer, SetResponseHeaderLayer},
    trace::TraceLayer,
};
use tracing::{Span, debug, error, info, info_span, warn};
use ulid::Ulid;
use url::Url;

pub(crate) mod handlers;
mod openapi;

pub use openapi::openapi;

const REQUEST_ID: &str = "x-request-id";
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the application router.
///
/// Every route, including the fallback, passes through the rate limiter.
/// CORS wraps only the `/user` routes: it answers every `OPTIONS` request
/// itself, which would hide `OPTIONS /health`.
#[must_use]
pub fn router(
    auth: Arc<AuthService>,
    limiter: Arc<dyn RateLimiter>,
    frontend_origin: HeaderValue,
) -> Router {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::list([frontend_origin]))
        .allow_credentials(true);

    let user = Router::new()
        .route("/user/register", post(user_register::register))
        .route("/user/login", post(user_login::login))
        .route("/user/session", get(user_session::session))
        .layer(cors);

    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health).options(health::health))
        .merge(user)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(SetResponseHeaderLayer::overriding(
                    X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    STRICT_TRANSPORT_SECURITY,
                    HeaderValue::from_static("max-age=15552000; includeSubDomains"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                ))
                .layer(middleware::from_fn_with_state(limiter, rate_limit::enforce))
                .layer(Extension(auth)),
        )
}

/// Serve `app` over TLS on `[::]:port` until Ctrl-C or SIGTERM, then close
/// the credential store.
///
/// # Errors
/// Returns an error if the listener cannot be bound.
pub async fn new(
    port: u16,
    auth: Arc<AuthService>,
    limiter: Arc<dyn RateLimiter>,
    frontend_origin: HeaderValue,
    tls_config: ServerConfig,
    purge_every: Duration,
) -> Result<()> {
    let app = router(auth.clone(), limiter.clone(), frontend_origin);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on https://[::]:{}", port);

    let purge = spawn_purge_task(limiter, purge_every);

    serve(listener, app, Arc::new(tls_config), shutdown_signal()).await;

    purge.abort();
    auth.shutdown().await;

    info!("Gracefully shutdown");

    Ok(())
}

/// Accept TLS connections and hand each request to `app` with the peer
/// address attached as [`ConnectInfo`].
pub async fn serve(
    listener: TcpListener,
    app: Router,
    tls_config: Arc<ServerConfig>,
    shutdown: impl Future<Output = ()>,
) {
    let acceptor = TlsAcceptor::from(tls_config);
    let mut connections = JoinSet::new();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!("Failed to accept connection: {}", err);
                        continue;
                    }
                };
                connections.spawn(handle_connection(
                    acceptor.clone(),
                    stream,
                    peer,
                    app.clone(),
                    TLS_HANDSHAKE_TIMEOUT,
                ));
            }
        }
    }

    drop(listener);

    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(
            "Closing {} connection(s) still open after {:?}",
            connections.len(),
            DRAIN_TIMEOUT
        );
        connections.shutdown().await;
    }
}

async fn handle_connection(
    acceptor: TlsAcceptor,
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    app: Router,
    handshake_timeout: Duration,
) {
    let stream = match tokio::time::timeout(handshake_timeout, acceptor.accept(stream)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(err)) => {
            debug!(%peer, "TLS handshake failed: {}", err);
            return;
        }
        Err(_) => {
            debug!(%peer, "TLS handshake timed out after {:?}", handshake_timeout);
            return;
        }
    };

    let service = app.map_request(move |mut request: Request<Incoming>| {
        request.extensions_mut().insert(ConnectInfo(peer));
        request
    });

    if let Err(err) = auto::Builder::new(TokioExecutor::new())
        .serve_connection_with_upgrades(TokioIo::new(stream), TowerToHyperService::new(service))
        .await
    {
        debug!(%peer, "Connection closed with error: {}", err);
    }
}

fn spawn_purge_task(
    limiter: Arc<dyn RateLimiter>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // First tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.purge_expired();
            debug!("Rate limiter windows purged");
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

/// Reduce a configured frontend URL to the origin used for CORS.
///
/// # Errors
/// Returns an error if the URL is invalid or has no host.
pub fn frontend_origin(frontend_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_url)
        .with_context(|| format!("Invalid frontend URL: {frontend_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Frontend URL must include a valid host: {frontend_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}
