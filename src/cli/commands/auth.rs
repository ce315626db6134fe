use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";
pub const ARG_FRONTEND_ORIGIN: &str = "frontend-origin";
pub const ARG_ARGON2_MEMORY_KIB: &str = "argon2-memory-kib";
pub const ARG_ARGON2_ITERATIONS: &str = "argon2-iterations";
pub const ARG_ARGON2_PARALLELISM: &str = "argon2-parallelism";

#[derive(Debug, Clone)]
pub struct Argon2Options {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub frontend_origin: String,
    pub argon2: Argon2Options,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the signing secret is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .filter(|v| !v.trim().is_empty())
            .map(|v| SecretString::from(v.clone()))
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_JWT_SECRET}"))?;

        let read_u32 = |id: &str, default: u32| matches.get_one::<u32>(id).copied().unwrap_or(default);

        Ok(Self {
            jwt_secret,
            token_ttl_seconds: matches
                .get_one::<i64>(ARG_TOKEN_TTL_SECONDS)
                .copied()
                .unwrap_or(3600),
            frontend_origin: matches
                .get_one::<String>(ARG_FRONTEND_ORIGIN)
                .cloned()
                .unwrap_or_else(|| "https://localhost:3000".to_string()),
            argon2: Argon2Options {
                memory_kib: read_u32(ARG_ARGON2_MEMORY_KIB, argon2::Params::DEFAULT_M_COST),
                iterations: read_u32(ARG_ARGON2_ITERATIONS, argon2::Params::DEFAULT_T_COST),
                parallelism: read_u32(ARG_ARGON2_PARALLELISM, argon2::Params::DEFAULT_P_COST),
            },
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HS256 secret used to sign session tokens")
                .env("PORTAL_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Session token lifetime in seconds")
                .env("PORTAL_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_FRONTEND_ORIGIN)
                .long(ARG_FRONTEND_ORIGIN)
                .help("Frontend origin allowed by CORS")
                .env("PORTAL_FRONTEND_ORIGIN")
                .default_value("https://localhost:3000"),
        );
    with_argon2_args(command)
}

fn with_argon2_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ARGON2_MEMORY_KIB)
                .long(ARG_ARGON2_MEMORY_KIB)
                .help("Argon2id memory cost in KiB")
                .env("PORTAL_ARGON2_MEMORY_KIB")
                .default_value("19456")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_ITERATIONS)
                .long(ARG_ARGON2_ITERATIONS)
                .help("Argon2id iterations")
                .env("PORTAL_ARGON2_ITERATIONS")
                .default_value("2")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_ARGON2_PARALLELISM)
                .long(ARG_ARGON2_PARALLELISM)
                .help("Argon2id lanes")
                .env("PORTAL_ARGON2_PARALLELISM")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn secret_from_env_and_defaults() -> anyhow::Result<()> {
        temp_env::with_vars(
            [
                ("PORTAL_JWT_SECRET", Some("s3cret-value")),
                ("PORTAL_TOKEN_TTL_SECONDS", None),
                ("PORTAL_FRONTEND_ORIGIN", None),
                ("PORTAL_ARGON2_MEMORY_KIB", None),
                ("PORTAL_ARGON2_ITERATIONS", None),
                ("PORTAL_ARGON2_PARALLELISM", None),
            ],
            || {
                let matches = with_args(Command::new("portal")).get_matches_from(vec!["portal"]);
                let options = Options::parse(&matches)?;
                assert_eq!(options.jwt_secret.expose_secret(), "s3cret-value");
                assert_eq!(options.token_ttl_seconds, 3600);
                assert_eq!(options.frontend_origin, "https://localhost:3000");
                assert_eq!(options.argon2.memory_kib, argon2::Params::DEFAULT_M_COST);
                assert!(!format!("{options:?}").contains("s3cret-value"));
                Ok(())
            },
        )
    }

    #[test]
    fn blank_secret_is_rejected() {
        temp_env::with_vars([("PORTAL_JWT_SECRET", Some("   "))], || {
            let matches = with_args(Command::new("portal")).get_matches_from(vec!["portal"]);
            assert!(Options::parse(&matches).is_err());
        });
    }

    #[test]
    fn missing_secret_fails_parsing() {
        temp_env::with_vars([("PORTAL_JWT_SECRET", None::<&str>)], || {
            let result = with_args(Command::new("portal")).try_get_matches_from(vec!["portal"]);
            assert_eq!(
                result.map_err(|e| e.kind()).err(),
                Some(clap::error::ErrorKind::MissingRequiredArgument)
            );
        });
    }
}
