//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        token_secret: auth_opts.token_secret,
        public_url: auth_opts.public_url,
        totp_issuer: auth_opts.totp_issuer,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        pending_ttl_seconds: auth_opts.pending_ttl_seconds,
        max_login_attempts: auth_opts.max_login_attempts,
        lockout_minutes: auth_opts.lockout_minutes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn handler_builds_server_action() {
        temp_env::with_vars(
            [
                ("GATEKEY_PORT", None::<&str>),
                ("GATEKEY_PUBLIC_URL", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "gatekey",
                    "--dsn",
                    "postgres://user@localhost:5432/gatekey",
                    "--token-secret",
                    "super-secret",
                    "--lockout-minutes",
                    "10",
                ]);
                let action = handler(&matches);
                assert!(action.is_ok());
                if let Ok(Action::Server(args)) = action {
                    assert_eq!(args.port, 8080);
                    assert_eq!(args.dsn, "postgres://user@localhost:5432/gatekey");
                    assert_eq!(args.token_secret.expose_secret(), "super-secret");
                    assert_eq!(args.public_url, "http://localhost:3000");
                    assert_eq!(args.totp_issuer, "gatekey");
                    assert_eq!(args.session_ttl_seconds, 86_400);
                    assert_eq!(args.pending_ttl_seconds, 300);
                    assert_eq!(args.max_login_attempts, 3);
                    assert_eq!(args.lockout_minutes, 10);
                }
            },
        );
    }
}
