//! Password hashing built on bcrypt.
//!
//! The work factor is fixed at bcrypt's default cost (10); each hash embeds
//! its own random salt.

use tracing::warn;

/// Hash a plaintext password.
///
/// # Errors
/// Returns an error if bcrypt fails to produce a hash, which only happens on
/// invalid input length (> 72 bytes is truncated by bcrypt itself, so in
/// practice this does not fail for validated passwords).
pub fn hash(plaintext: &str) -> anyhow::Result<String> {
    Ok(bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)?)
}

/// Check a plaintext password against a stored hash.
///
/// A malformed stored hash counts as a mismatch rather than an error so the
/// caller always gets a plain boolean.
#[must_use]
pub fn verify(plaintext: &str, hashed: &str) -> bool {
    match bcrypt::verify(plaintext, hashed) {
        Ok(matched) => matched,
        Err(err) => {
            warn!("Stored password hash could not be parsed: {err}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() -> anyhow::Result<()> {
        let hashed = hash("Passw0rd!")?;
        assert!(verify("Passw0rd!", &hashed));
        Ok(())
    }

    #[test]
    fn verify_rejects_wrong_password() -> anyhow::Result<()> {
        let hashed = hash("Passw0rd!")?;
        assert!(!verify("passw0rd!", &hashed));
        assert!(!verify("", &hashed));
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> anyhow::Result<()> {
        let first = hash("Passw0rd!")?;
        let second = hash("Passw0rd!")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn verify_never_errors_on_garbage_hash() {
        assert!(!verify("Passw0rd!", "not-a-bcrypt-hash"));
        assert!(!verify("Passw0rd!", ""));
    }
}
