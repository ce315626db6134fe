use super::commands::logging::LogFormat;
use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

fn env_filter(verbosity_level: Level) -> Result<EnvFilter> {
    // RUST_LOG= takes precedence over the verbosity flag
    Ok(EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("tokio=error".parse()?)
        .add_directive("rustls=warn".parse()?)
        .add_directive("sqlx=warn".parse()?))
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a filter directive is invalid or a subscriber is already set
pub fn init(verbosity_level: Option<Level>, format: LogFormat) -> Result<()> {
    let filter = env_filter(verbosity_level.unwrap_or(Level::ERROR))?;

    let pretty = (format == LogFormat::Pretty).then(|| {
        fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_target(false)
            .pretty()
    });

    let json = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(false)
    });

    let subscriber = Registry::default().with(pretty).with(json).with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
