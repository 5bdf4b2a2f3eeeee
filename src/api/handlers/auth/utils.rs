//! Input validation and small helpers shared by the auth handlers.

use axum::http::HeaderMap;
use regex::Regex;
use std::collections::BTreeMap;

pub(crate) const SESSION_COOKIE_NAME: &str = "token";

/// Characters the password policy allows alongside letters and digits.
const PASSWORD_PUNCTUATION: &str = "@$!%*?&";

/// Basic email format check.
pub(super) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Check the password policy; returns one message per violated rule.
pub(super) fn password_violations(password: &str) -> Vec<String> {
    let mut violations = Vec::new();

    if password.len() < 8 {
        violations.push("Password must be at least 8 characters long".to_string());
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        violations.push(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number"
                .to_string(),
        );
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_PUNCTUATION.contains(c);
    if !password.chars().all(allowed) {
        violations.push(
            "Password may only contain letters, numbers, and @$!%*?&".to_string(),
        );
    }

    violations
}

/// Validate the sign-up shape, collecting field-level messages.
pub(super) fn validate_credentials(
    email: &str,
    password: &str,
) -> Result<(), BTreeMap<String, Vec<String>>> {
    let mut fields = BTreeMap::new();

    if !valid_email(email) {
        fields.insert(
            "email".to_string(),
            vec!["Invalid email address".to_string()],
        );
    }

    let violations = password_violations(password);
    if !violations.is_empty() {
        fields.insert("password".to_string(), violations);
    }

    if fields.is_empty() { Ok(()) } else { Err(fields) }
}

/// Derived default avatar: deterministic function of the email local-part.
pub(super) fn default_avatar_url(email: &str) -> String {
    let seed = email.split('@').next().unwrap_or(email);
    format!("https://api.dicebear.com/9.x/initials/svg?seed={seed}")
}

/// Pull the session token out of the request cookie, if present.
///
/// The cookie is the sole transport for session continuity.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
