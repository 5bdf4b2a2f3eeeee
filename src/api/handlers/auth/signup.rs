//! Sign-up: create the account and hand back the TOTP enrollment QR.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse, response::Response};
use sqlx::PgPool;
use tracing::error;

use super::storage::{SignupOutcome, insert_user};
use super::types::{
    ErrorKind, ErrorResponse, SignUpRequest, SignUpResponse, failure, validation_failure,
};
use super::utils::{default_avatar_url, validate_credentials};
use crate::{password, totp::TotpService};

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created; body carries the QR enrollment payload", body = SignUpResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error with field detail", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signup(
    pool: Extension<PgPool>,
    totp_service: Extension<TotpService>,
    payload: Option<Json<SignUpRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return failure(ErrorKind::Validation);
    };

    if let Err(fields) = validate_credentials(&request.email, &request.password) {
        return validation_failure(fields);
    }

    let password_hash = match password::hash(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return failure(ErrorKind::ServerError);
        }
    };

    let totp_secret = match totp_service.generate_secret() {
        Ok(secret) => secret,
        Err(err) => {
            error!("Failed to generate TOTP secret: {err}");
            return failure(ErrorKind::ServerError);
        }
    };

    let avatar_url = default_avatar_url(&request.email);

    match insert_user(
        &pool,
        &request.email,
        &password_hash,
        &avatar_url,
        &totp_secret,
    )
    .await
    {
        Ok(SignupOutcome::Created) => {}
        Ok(SignupOutcome::Conflict) => return failure(ErrorKind::AlreadyExists),
        Err(err) => {
            error!("Failed to insert user: {err}");
            return failure(ErrorKind::ServerError);
        }
    }

    // Sign-up does not log the user in; the QR payload lets an authenticator
    // app enroll the shared secret before the first sign-in.
    let label = format!("2FA for {}", request.email);
    let qr_code = match totp_service.qr_data_url(&totp_secret, &label) {
        Ok(qr) => qr,
        Err(err) => {
            error!("Failed to render enrollment QR: {err}");
            return failure(ErrorKind::ServerError);
        }
    };

    let body = SignUpResponse {
        success: true,
        message: "User created successfully".to_string(),
        qr_code,
    };
    (StatusCode::CREATED, Json(body)).into_response()
}
