//! OpenAPI document for the auth API, built from Cargo metadata.

use utoipa::OpenApi;
use utoipa::openapi::{Contact, InfoBuilder, License, Tag};

use super::handlers::{auth, health};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::signup::signup,
        auth::login::login,
        auth::twofactor::verify_two_factor,
        auth::session::session,
        auth::session::logout,
        auth::reset::reset_password,
    ),
    components(schemas(
        health::Health,
        auth::types::SignUpRequest,
        auth::types::SignUpResponse,
        auth::types::SignInRequest,
        auth::types::SignInData,
        auth::types::SignInResponse,
        auth::types::VerifyTwoFactorRequest,
        auth::types::ResetPasswordRequest,
        auth::types::AckResponse,
        auth::types::UserProjection,
        auth::types::ErrorDetail,
        auth::types::ErrorResponse,
    ))
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();
    info.contact = cargo_contact();
    info.license = cargo_license();
    doc.info = info;

    let mut auth_tag = Tag::new("auth");
    auth_tag.description =
        Some("Sign-up, two-step sign-in, session, and password reset".to_string());
    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Liveness and database reachability".to_string());
    doc.tags = Some(vec![auth_tag, health_tag]);

    doc
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        (
            if name.is_empty() { None } else { Some(name) },
            if email.is_empty() { None } else { Some(email) },
        )
    } else {
        let trimmed = author.trim();
        (if trimmed.is_empty() { None } else { Some(trimmed) }, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_auth_operation() {
        let doc = openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/health",
            "/v1/auth/signup",
            "/v1/auth/login",
            "/v1/auth/2fa/verify",
            "/v1/auth/session",
            "/v1/auth/logout",
            "/v1/auth/password/reset",
        ] {
            assert!(paths.contains_key(path), "missing path: {path}");
        }
    }

    #[test]
    fn info_comes_from_cargo_metadata() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn parse_author_splits_name_and_email() {
        assert_eq!(
            parse_author("Team Gatekey <team@gatekey.dev>"),
            (Some("Team Gatekey"), Some("team@gatekey.dev"))
        );
        assert_eq!(parse_author("solo"), (Some("solo"), None));
        assert_eq!(parse_author(""), (None, None));
    }
}
