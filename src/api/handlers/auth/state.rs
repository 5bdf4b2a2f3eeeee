//! Auth configuration and shared state.

use url::Url;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_PENDING_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_MAX_LOGIN_ATTEMPTS: i32 = 3;
const DEFAULT_LOCKOUT_MINUTES: i64 = 5;
const DEFAULT_TOTP_ISSUER: &str = "gatekey";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    public_url: String,
    totp_issuer: String,
    session_ttl_seconds: i64,
    pending_ttl_seconds: i64,
    max_login_attempts: i32,
    lockout_minutes: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(public_url: String) -> Self {
        Self {
            public_url,
            totp_issuer: DEFAULT_TOTP_ISSUER.to_string(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            pending_ttl_seconds: DEFAULT_PENDING_TTL_SECONDS,
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            lockout_minutes: DEFAULT_LOCKOUT_MINUTES,
        }
    }

    #[must_use]
    pub fn with_totp_issuer(mut self, issuer: String) -> Self {
        self.totp_issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_pending_ttl_seconds(mut self, seconds: i64) -> Self {
        self.pending_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_login_attempts(mut self, attempts: i32) -> Self {
        self.max_login_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_lockout_minutes(mut self, minutes: i64) -> Self {
        self.lockout_minutes = minutes;
        self
    }

    #[must_use]
    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    #[must_use]
    pub fn totp_issuer(&self) -> &str {
        &self.totp_issuer
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn pending_ttl_seconds(&self) -> i64 {
        self.pending_ttl_seconds
    }

    #[must_use]
    pub fn max_login_attempts(&self) -> i32 {
        self.max_login_attempts
    }

    #[must_use]
    pub fn lockout_minutes(&self) -> i64 {
        self.lockout_minutes
    }

    /// Only mark cookies secure when the service is reached over HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.public_url.starts_with("https://")
    }

    /// The origin allowed to send credentialed requests.
    #[must_use]
    pub fn public_origin(&self) -> Option<String> {
        let parsed = Url::parse(&self.public_url).ok()?;
        let host = parsed.host_str()?;
        let port = parsed
            .port()
            .map_or_else(String::new, |port| format!(":{port}"));
        Some(format!("{}://{host}{port}", parsed.scheme()))
    }
}

pub struct AuthState {
    config: AuthConfig,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = AuthConfig::new("http://localhost:3000".to_string());
        assert_eq!(config.session_ttl_seconds(), 86_400);
        assert_eq!(config.pending_ttl_seconds(), 300);
        assert_eq!(config.max_login_attempts(), 3);
        assert_eq!(config.lockout_minutes(), 5);
        assert_eq!(config.totp_issuer(), "gatekey");
    }

    #[test]
    fn cookie_secure_follows_scheme() {
        let http = AuthConfig::new("http://localhost:3000".to_string());
        assert!(!http.session_cookie_secure());
        let https = AuthConfig::new("https://app.example.com".to_string());
        assert!(https.session_cookie_secure());
    }

    #[test]
    fn builders_override_defaults() {
        let config = AuthConfig::new("http://localhost:3000".to_string())
            .with_totp_issuer("acme".to_string())
            .with_session_ttl_seconds(600)
            .with_pending_ttl_seconds(60)
            .with_max_login_attempts(5)
            .with_lockout_minutes(15);
        assert_eq!(config.totp_issuer(), "acme");
        assert_eq!(config.session_ttl_seconds(), 600);
        assert_eq!(config.pending_ttl_seconds(), 60);
        assert_eq!(config.max_login_attempts(), 5);
        assert_eq!(config.lockout_minutes(), 15);
    }

    #[test]
    fn public_origin_strips_path() {
        let config = AuthConfig::new("https://app.example.com:8443/login".to_string());
        assert_eq!(
            config.public_origin().as_deref(),
            Some("https://app.example.com:8443")
        );
        let bad = AuthConfig::new("not a url".to_string());
        assert_eq!(bad.public_origin(), None);
    }
}
