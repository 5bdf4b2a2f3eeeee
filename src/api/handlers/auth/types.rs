//! Request/response envelopes for the auth endpoints.
//!
//! Every operation resolves to either `{success: true, message, ...}` or
//! `{success: false, error, message}`; callers only ever branch on `success`
//! and display `message`.

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub success: bool,
    pub message: String,
    pub qr_code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignInData {
    pub user_id: String,
    pub required_two_factor_auth: bool,
    /// Proof that the password check succeeded; required by the 2FA step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignInResponse {
    pub success: bool,
    pub message: String,
    pub data: SignInData,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTwoFactorRequest {
    pub user_id: String,
    pub code: String,
    pub pending_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Generic `{success: true}` envelope for operations with no payload.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

impl AckResponse {
    pub(crate) fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

/// Public projection of a user; never carries the password hash.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserProjection {
    pub user_id: String,
    pub email: String,
    pub avatar_url: String,
    pub is_two_factor_enabled: bool,
}

/// Why an operation failed. Serialized into the envelope `error` field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Validation,
    AlreadyExists,
    InvalidCredentials,
    AccountLocked,
    InvalidCode,
    NotFound,
    Unauthenticated,
    ServerError,
}

impl ErrorKind {
    pub(crate) fn status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::AccountLocked => StatusCode::LOCKED,
            Self::InvalidCode => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wording kept stable; clients display it directly.
    pub(crate) fn message(self) -> &'static str {
        match self {
            Self::Validation => "Invalid input",
            Self::AlreadyExists => "User already exists",
            // Identical for unknown email and wrong password so account
            // existence does not leak.
            Self::InvalidCredentials => "Invalid credentials",
            Self::AccountLocked => "Account is locked. Please try again later",
            Self::InvalidCode => "Invalid code",
            Self::NotFound => "User not found",
            Self::Unauthenticated => "Not authenticated",
            Self::ServerError => "Server error",
        }
    }
}

/// The `error` field: either a single message or field-level detail.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(BTreeMap<String, Vec<String>>),
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
    pub message: String,
}

/// Build the standard failure response for an error kind.
pub(crate) fn failure(kind: ErrorKind) -> Response {
    let message = kind.message().to_string();
    let body = ErrorResponse {
        success: false,
        error: ErrorDetail::Message(message.clone()),
        message,
    };
    (kind.status(), Json(body)).into_response()
}

/// Failure response carrying field-level validation messages.
pub(crate) fn validation_failure(fields: BTreeMap<String, Vec<String>>) -> Response {
    let message = fields
        .values()
        .flatten()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let body = ErrorResponse {
        success: false,
        error: ErrorDetail::Fields(fields),
        message,
    };
    (ErrorKind::Validation.status(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn signin_data_serializes_camel_case() -> Result<()> {
        let data = SignInData {
            user_id: "abc".to_string(),
            required_two_factor_auth: true,
            pending_token: Some("tok".to_string()),
        };
        let value = serde_json::to_value(&data)?;
        assert_eq!(
            value.get("userId").and_then(serde_json::Value::as_str),
            Some("abc")
        );
        assert_eq!(
            value
                .get("requiredTwoFactorAuth")
                .and_then(serde_json::Value::as_bool),
            Some(true)
        );
        assert_eq!(
            value.get("pendingToken").and_then(serde_json::Value::as_str),
            Some("tok")
        );
        Ok(())
    }

    #[test]
    fn pending_token_is_omitted_when_absent() -> Result<()> {
        let data = SignInData {
            user_id: "abc".to_string(),
            required_two_factor_auth: false,
            pending_token: None,
        };
        let value = serde_json::to_value(&data)?;
        assert!(value.get("pendingToken").is_none());
        Ok(())
    }

    #[test]
    fn error_detail_field_map_round_trips() -> Result<()> {
        let mut fields = BTreeMap::new();
        fields.insert(
            "password".to_string(),
            vec!["Password must be at least 8 characters long".to_string()],
        );
        let body = ErrorResponse {
            success: false,
            error: ErrorDetail::Fields(fields),
            message: "Password must be at least 8 characters long".to_string(),
        };
        let value = serde_json::to_value(&body)?;
        let password_errors = value
            .get("error")
            .and_then(|error| error.get("password"))
            .context("missing field detail")?;
        assert!(password_errors.is_array());
        let decoded: ErrorResponse = serde_json::from_value(value)?;
        assert!(matches!(decoded.error, ErrorDetail::Fields(_)));
        Ok(())
    }

    #[test]
    fn error_kinds_map_to_statuses() {
        assert_eq!(ErrorKind::Validation.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ErrorKind::AlreadyExists.status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorKind::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorKind::AccountLocked.status(), StatusCode::LOCKED);
        assert_eq!(ErrorKind::InvalidCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorKind::ServerError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn credentials_failures_are_indistinguishable() {
        // Unknown email and wrong password must produce identical envelopes.
        assert_eq!(ErrorKind::InvalidCredentials.message(), "Invalid credentials");
        assert_eq!(
            ErrorKind::InvalidCredentials.status(),
            ErrorKind::Unauthenticated.status()
        );
    }

    #[test]
    fn reset_password_request_accepts_camel_case() -> Result<()> {
        let decoded: ResetPasswordRequest =
            serde_json::from_value(serde_json::json!({"newPassword": "Passw0rd!"}))?;
        assert_eq!(decoded.new_password, "Passw0rd!");
        Ok(())
    }
}
