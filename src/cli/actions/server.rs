use crate::{
    api,
    auth::{
        AuthService, CredentialStore, FixedWindowRateLimiter, MemoryCredentialStore,
        PasswordHasher, PgCredentialStore, RateLimiter, TokenIssuer,
    },
    cli::commands::{auth, rate_limit, tls},
    tls::{TlsPaths, load_server_config},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    /// `None` keeps accounts in process memory.
    pub dsn: Option<String>,
    pub tls: tls::Options,
    pub auth: auth::Options,
    pub rate_limit: rate_limit::Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if TLS material, the database, or the signing secret is
/// unusable, or if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    // 1. TLS is mandatory, fail before touching the database
    let tls_config = load_server_config(&TlsPaths::from_cli(
        args.tls.cert_path.clone(),
        args.tls.key_path.clone(),
    ))?;

    let frontend_origin = api::frontend_origin(&args.auth.frontend_origin)?;

    // 2. credential store
    let store: Arc<dyn CredentialStore> = if let Some(dsn) = &args.dsn {
        let store = PgCredentialStore::connect(dsn).await?;
        store.ensure_schema().await?;
        Arc::new(store)
    } else {
        warn!("Using in-memory credential store, accounts are lost on exit");
        Arc::new(MemoryCredentialStore::new())
    };

    // 3. hasher and token issuer
    let argon2 = &args.auth.argon2;
    let hasher = PasswordHasher::new(argon2.memory_kib, argon2.iterations, argon2.parallelism)
        .context("Invalid Argon2 parameters")?;
    let tokens = TokenIssuer::new(&args.auth.jwt_secret, args.auth.token_ttl_seconds)
        .context("Invalid token configuration")?;

    // 4. rate limiter
    let limiter = FixedWindowRateLimiter::new(args.rate_limit.max_requests, args.rate_limit.window);
    let purge_every = limiter.window();
    let limiter: Arc<dyn RateLimiter> = Arc::new(limiter);

    // 5. serve
    let auth = Arc::new(AuthService::new(store, hasher, tokens));
    api::new(
        args.port,
        auth,
        limiter,
        frontend_origin,
        tls_config,
        purge_every,
    )
    .await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("https://[::]:{}", args.port)),
        (
            "store",
            args.dsn
                .as_deref()
                .map_or_else(|| "memory".to_string(), redact_dsn),
        ),
        ("tls_cert_path", args.tls.cert_path.clone()),
        ("frontend_origin", args.auth.frontend_origin.clone()),
        (
            "token_ttl_seconds",
            args.auth.token_ttl_seconds.to_string(),
        ),
        (
            "rate_limit",
            format!(
                "{} requests / {}s",
                args.rate_limit.max_requests,
                args.rate_limit.window.as_secs()
            ),
        ),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "portal {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
