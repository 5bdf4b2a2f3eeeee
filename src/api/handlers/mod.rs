//! API handlers for Gatekey.

pub mod auth;
pub mod health;
pub mod root;
