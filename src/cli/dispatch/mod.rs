//! Map parsed CLI arguments to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_DSN, ARG_IN_MEMORY, ARG_PORT, auth, rate_limit, tls};
use anyhow::{Result, anyhow};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000);

    let dsn = matches.get_one::<String>(ARG_DSN).cloned();
    if dsn.is_none() && !matches.get_flag(ARG_IN_MEMORY) {
        return Err(anyhow!(
            "missing required argument: --{ARG_DSN} (or --{ARG_IN_MEMORY})"
        ));
    }

    let auth_opts = auth::Options::parse(matches)?;
    let rate_limit_opts = rate_limit::Options::parse(matches);
    let tls_opts = tls::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        tls: tls_opts,
        auth: auth_opts,
        rate_limit: rate_limit_opts,
    }))
}
