//! Stateless session tokens signed with HS256.
//!
//! Two scopes share the same signing key: `session` is the real login
//! session, `pending` is the short-lived proof that the password check
//! succeeded and only the TOTP step remains. The scope claim keeps one from
//! being replayed as the other.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenScope {
    Session,
    Pending,
}

impl TokenScope {
    #[must_use]
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Pending => "pending",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed, tampered with, or expired")]
    Invalid,
    #[error("token scope does not match the expected scope")]
    WrongScope,
    #[error("token subject is not a valid user id")]
    BadSubject,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    scope: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies session/pending tokens with a server-held secret.
///
/// The secret is loaded once at startup; its absence is a fatal configuration
/// condition handled by the CLI (`--token-secret` is required).
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a signed token binding the user id, with an embedded expiration.
    ///
    /// # Errors
    /// Returns an error if JWT encoding fails.
    pub fn issue(
        &self,
        user_id: Uuid,
        scope: TokenScope,
        ttl_seconds: i64,
    ) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            scope: scope.as_str().to_string(),
            iat: now,
            exp: now + ttl_seconds,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify signature, expiration, and scope; return the bound user id.
    ///
    /// # Errors
    /// Returns [`TokenError::Invalid`] for bad signatures, malformed input,
    /// or expired tokens; [`TokenError::WrongScope`] when the scope claim
    /// does not match; [`TokenError::BadSubject`] when the subject is not a
    /// UUID. An unverified token is never partially trusted.
    pub fn verify(&self, token: &str, expected: TokenScope) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // The embedded expiration is exact; no clock-skew grace.
        validation.leeway = 0;

        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(|_| TokenError::Invalid)?;

        if data.claims.scope != expected.as_str() {
            return Err(TokenError::WrongScope);
        }

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::BadSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("unit-test-signing-secret"))
    }

    #[test]
    fn issue_verify_round_trip() -> anyhow::Result<()> {
        let tokens = service();
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, TokenScope::Session, 60)?;
        let resolved = tokens.verify(&token, TokenScope::Session);
        assert_eq!(resolved.ok(), Some(user_id));
        Ok(())
    }

    #[test]
    fn tampered_token_is_rejected() -> anyhow::Result<()> {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4(), TokenScope::Session, 60)?;
        // Flip a byte in the payload segment.
        let mut bytes = token.into_bytes();
        let middle = bytes.len() / 2;
        bytes[middle] = if bytes[middle] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes)?;
        assert!(matches!(
            tokens.verify(&tampered, TokenScope::Session),
            Err(TokenError::Invalid)
        ));
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> anyhow::Result<()> {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4(), TokenScope::Session, -120)?;
        assert!(matches!(
            tokens.verify(&token, TokenScope::Session),
            Err(TokenError::Invalid)
        ));
        Ok(())
    }

    #[test]
    fn pending_token_is_not_a_session() -> anyhow::Result<()> {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4(), TokenScope::Pending, 60)?;
        assert!(matches!(
            tokens.verify(&token, TokenScope::Session),
            Err(TokenError::WrongScope)
        ));
        assert!(tokens.verify(&token, TokenScope::Pending).is_ok());
        Ok(())
    }

    #[test]
    fn other_key_cannot_verify() -> anyhow::Result<()> {
        let tokens = service();
        let other = TokenService::new(&SecretString::from("a-different-secret"));
        let token = tokens.issue(Uuid::new_v4(), TokenScope::Session, 60)?;
        assert!(matches!(
            other.verify(&token, TokenScope::Session),
            Err(TokenError::Invalid)
        ));
        Ok(())
    }

    #[test]
    fn malformed_token_is_rejected() {
        let tokens = service();
        assert!(matches!(
            tokens.verify("not.a.jwt", TokenScope::Session),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(
            tokens.verify("", TokenScope::Session),
            Err(TokenError::Invalid)
        ));
    }
}
