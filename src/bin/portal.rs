use anyhow::Result;
use portal::cli;

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // sqlx and the listener share one process-wide rustls provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let action = cli::start()?;

    action.execute().await?;

    Ok(())
}
