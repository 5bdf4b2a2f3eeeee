//! TOTP (RFC 6238) secret provisioning and code verification.
//!
//! Codes are 6 digits over a 30-second step with SHA1, the parameters every
//! mainstream authenticator app assumes. Verification tolerates one step of
//! clock skew on either side.

use anyhow::{Result, anyhow};
use totp_rs::{Algorithm, Secret, TOTP};
use tracing::warn;

const TOTP_DIGITS: usize = 6;
const TOTP_SKEW: u8 = 1;
const TOTP_STEP: u64 = 30;

#[derive(Clone)]
pub struct TotpService {
    issuer: String,
}

impl TotpService {
    #[must_use]
    pub fn new(issuer: String) -> Self {
        Self { issuer }
    }

    /// Generate a fresh base32-encoded shared secret.
    ///
    /// # Errors
    /// Returns an error if secret generation fails.
    pub fn generate_secret(&self) -> Result<String> {
        let secret = Secret::generate_secret()
            .to_bytes()
            .map_err(|e| anyhow!("Secret generation error: {e:?}"))?;
        Ok(Secret::Raw(secret).to_encoded().to_string())
    }

    /// Build the standard `otpauth://` provisioning URI for a secret.
    ///
    /// # Errors
    /// Returns an error if the stored secret is not valid base32.
    pub fn provisioning_uri(&self, secret_base32: &str, account_label: &str) -> Result<String> {
        Ok(self.build(secret_base32, account_label)?.get_url())
    }

    /// Render the provisioning URI as a QR image, returned as a
    /// `data:image/png;base64,...` URL ready for an `<img>` tag.
    ///
    /// # Errors
    /// Returns an error if the secret is invalid or QR rendering fails.
    pub fn qr_data_url(&self, secret_base32: &str, account_label: &str) -> Result<String> {
        let totp = self.build(secret_base32, account_label)?;
        let qr = totp
            .get_qr_base64()
            .map_err(|e| anyhow!("QR gen error: {e}"))?;
        Ok(format!("data:image/png;base64,{qr}"))
    }

    /// Check a submitted code against the current time step, tolerating one
    /// step of skew either way. Malformed or non-matching codes are false;
    /// this never errors outward.
    #[must_use]
    pub fn verify_code(&self, secret_base32: &str, code: &str) -> bool {
        let Ok(totp) = self.build(secret_base32, "verify") else {
            warn!("Stored TOTP secret could not be parsed");
            return false;
        };
        totp.check_current(code).unwrap_or(false)
    }

    fn build(&self, secret_base32: &str, account_label: &str) -> Result<TOTP> {
        let secret_bytes = Secret::Encoded(secret_base32.to_string())
            .to_bytes()
            .map_err(|e| anyhow!("Invalid TOTP secret: {e:?}"))?;
        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            secret_bytes,
            Some(self.issuer.clone()),
            account_label.to_string(),
        )
        .map_err(|e| anyhow!("TOTP init error: {e:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn service() -> TotpService {
        TotpService::new("gatekey".to_string())
    }

    fn now_unix() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_secs()
    }

    #[test]
    fn secrets_are_distinct_and_base32() -> Result<()> {
        let totp = service();
        let first = totp.generate_secret()?;
        let second = totp.generate_secret()?;
        assert!(!first.is_empty());
        assert_ne!(first, second);
        assert!(Secret::Encoded(first).to_bytes().is_ok());
        Ok(())
    }

    #[test]
    fn provisioning_uri_carries_issuer_and_label() -> Result<()> {
        let totp = service();
        let secret = totp.generate_secret()?;
        let uri = totp.provisioning_uri(&secret, "a@x.com")?;
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("issuer=gatekey"));
        assert!(uri.contains("a%40x.com"));
        Ok(())
    }

    #[test]
    fn qr_payload_is_a_png_data_url() -> Result<()> {
        let totp = service();
        let secret = totp.generate_secret()?;
        let qr = totp.qr_data_url(&secret, "a@x.com")?;
        assert!(qr.starts_with("data:image/png;base64,"));
        assert!(qr.len() > "data:image/png;base64,".len());
        Ok(())
    }

    #[test]
    fn current_code_verifies() -> Result<()> {
        let totp = service();
        let secret = totp.generate_secret()?;
        let code = totp.build(&secret, "verify")?.generate(now_unix());
        assert!(totp.verify_code(&secret, &code));
        Ok(())
    }

    #[test]
    fn adjacent_step_codes_verify() -> Result<()> {
        let totp = service();
        let secret = totp.generate_secret()?;
        let inner = totp.build(&secret, "verify")?;
        let previous = inner.generate(now_unix() - TOTP_STEP);
        let next = inner.generate(now_unix() + TOTP_STEP);
        assert!(totp.verify_code(&secret, &previous));
        assert!(totp.verify_code(&secret, &next));
        Ok(())
    }

    #[test]
    fn stale_code_is_rejected() -> Result<()> {
        let totp = service();
        let secret = totp.generate_secret()?;
        let stale = totp.build(&secret, "verify")?.generate(now_unix() - 4 * TOTP_STEP);
        assert!(!totp.verify_code(&secret, &stale));
        Ok(())
    }

    #[test]
    fn malformed_codes_are_false_not_errors() -> Result<()> {
        let totp = service();
        let secret = totp.generate_secret()?;
        assert!(!totp.verify_code(&secret, "abcdef"));
        assert!(!totp.verify_code(&secret, ""));
        assert!(!totp.verify_code(&secret, "12345678901"));
        assert!(!totp.verify_code("%%%not-base32%%%", "123456"));
        Ok(())
    }
}
