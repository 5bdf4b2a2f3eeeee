//! Authentication endpoints: sign-up, the two-step sign-in, session
//! resolution, logout, and password reset.
//!
//! Flow overview:
//! 1) Sign-up creates the account with a TOTP secret and returns the QR
//!    enrollment payload; it does not log the user in.
//! 2) Sign-in checks the password. With two-factor enabled it returns a
//!    short-lived `pending` token; otherwise it issues the session directly.
//! 3) The TOTP step trades a valid pending token plus a current code for the
//!    real session cookie.
//!
//! Every internal fault is caught, logged, and generalized into the
//! `{success: false}` envelope; nothing here is fatal to the process.

pub mod login;
pub mod reset;
pub mod session;
pub mod signup;
pub mod state;
pub mod storage;
pub mod twofactor;
pub mod types;

pub(crate) mod utils;

pub use state::{AuthConfig, AuthState};
