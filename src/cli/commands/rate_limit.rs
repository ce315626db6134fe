use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_RATE_LIMIT_MAX_REQUESTS: &str = "rate-limit-max-requests";
pub const ARG_RATE_LIMIT_WINDOW_SECONDS: &str = "rate-limit-window-seconds";

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub max_requests: u32,
    pub window: Duration,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            max_requests: matches
                .get_one::<u32>(ARG_RATE_LIMIT_MAX_REQUESTS)
                .copied()
                .unwrap_or(100),
            window: Duration::from_secs(
                matches
                    .get_one::<u64>(ARG_RATE_LIMIT_WINDOW_SECONDS)
                    .copied()
                    .unwrap_or(900),
            ),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_RATE_LIMIT_MAX_REQUESTS)
                .long(ARG_RATE_LIMIT_MAX_REQUESTS)
                .help("Requests allowed per client address in each window")
                .env("PORTAL_RATE_LIMIT_MAX_REQUESTS")
                .default_value("100")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_RATE_LIMIT_WINDOW_SECONDS)
                .long(ARG_RATE_LIMIT_WINDOW_SECONDS)
                .help("Rate limit window length in seconds")
                .env("PORTAL_RATE_LIMIT_WINDOW_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
