use crate::{api, api::handlers::auth::AuthConfig, token::TokenService};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub token_secret: SecretString,
    pub public_url: String,
    pub totp_issuer: String,
    pub session_ttl_seconds: i64,
    pub pending_ttl_seconds: i64,
    pub max_login_attempts: i32,
    pub lockout_minutes: i64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(args.public_url)
        .with_totp_issuer(args.totp_issuer)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_pending_ttl_seconds(args.pending_ttl_seconds)
        .with_max_login_attempts(args.max_login_attempts)
        .with_lockout_minutes(args.lockout_minutes);

    let token_service = TokenService::new(&args.token_secret);

    api::new(args.port, args.dsn, auth_config, token_service).await
}
