use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_PUBLIC_URL: &str = "public-url";
pub const ARG_TOTP_ISSUER: &str = "totp-issuer";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_PENDING_TTL_SECONDS: &str = "pending-ttl-seconds";
pub const ARG_MAX_LOGIN_ATTEMPTS: &str = "max-login-attempts";
pub const ARG_LOCKOUT_MINUTES: &str = "lockout-minutes";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("Secret used to sign session and pending-login tokens")
                .env("GATEKEY_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_PUBLIC_URL)
                .long(ARG_PUBLIC_URL)
                .help("Public URL of the frontend, used for CORS and cookie policy")
                .env("GATEKEY_PUBLIC_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_TOTP_ISSUER)
                .long(ARG_TOTP_ISSUER)
                .help("Issuer shown in authenticator apps")
                .env("GATEKEY_TOTP_ISSUER")
                .default_value("gatekey"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("GATEKEY_SESSION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_PENDING_TTL_SECONDS)
                .long(ARG_PENDING_TTL_SECONDS)
                .help("TTL of the pending-login token issued between password and TOTP steps")
                .env("GATEKEY_PENDING_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_MAX_LOGIN_ATTEMPTS)
                .long(ARG_MAX_LOGIN_ATTEMPTS)
                .help("Failed password attempts before the account is locked")
                .env("GATEKEY_MAX_LOGIN_ATTEMPTS")
                .default_value("3")
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new(ARG_LOCKOUT_MINUTES)
                .long(ARG_LOCKOUT_MINUTES)
                .help("Minutes an account stays locked after too many failures")
                .env("GATEKEY_LOCKOUT_MINUTES")
                .default_value("5")
                .value_parser(clap::value_parser!(i64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub token_secret: SecretString,
    pub public_url: String,
    pub totp_issuer: String,
    pub session_ttl_seconds: i64,
    pub pending_ttl_seconds: i64,
    pub max_login_attempts: i32,
    pub lockout_minutes: i64,
}

impl Options {
    /// Collect the auth arguments from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let token_secret = matches
            .get_one::<String>(ARG_TOKEN_SECRET)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --token-secret")?;
        let public_url = matches
            .get_one::<String>(ARG_PUBLIC_URL)
            .cloned()
            .context("missing required argument: --public-url")?;
        let totp_issuer = matches
            .get_one::<String>(ARG_TOTP_ISSUER)
            .cloned()
            .context("missing required argument: --totp-issuer")?;
        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(86_400);
        let pending_ttl_seconds = matches
            .get_one::<i64>(ARG_PENDING_TTL_SECONDS)
            .copied()
            .unwrap_or(300);
        let max_login_attempts = matches
            .get_one::<i32>(ARG_MAX_LOGIN_ATTEMPTS)
            .copied()
            .unwrap_or(3);
        let lockout_minutes = matches
            .get_one::<i64>(ARG_LOCKOUT_MINUTES)
            .copied()
            .unwrap_or(5);

        Ok(Self {
            token_secret,
            public_url,
            totp_issuer,
            session_ttl_seconds,
            pending_ttl_seconds,
            max_login_attempts,
            lockout_minutes,
        })
    }
}
