//! # Gatekey
//!
//! `gatekey` is an email/password authentication service with TOTP-based
//! two-factor verification.
//!
//! ## Login flow
//!
//! Sign-in is a two-step exchange: the password check (first factor) returns
//! a short-lived `pending` token, and the TOTP check (second factor) trades
//! that token for the real session. A session only exists after the second
//! factor, or directly after the first when two-factor is disabled for the
//! account.
//!
//! - **Lockout:** three consecutive failed password checks lock an account
//!   for five minutes. The lock is evaluated at read time; a successful
//!   password check after expiry clears the counters.
//! - **Sessions:** stateless HS256-signed tokens carried in an `HttpOnly`,
//!   `SameSite=Strict` cookie. There is no server-side session table and no
//!   revocation list; validity is signature plus expiry.
//! - **Enrollment:** every account gets a TOTP secret at sign-up and the
//!   response carries a QR-encodable provisioning image for authenticator
//!   apps.

pub mod api;
pub mod cli;
pub mod password;
pub mod token;
pub mod totp;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
