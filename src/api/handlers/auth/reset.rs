//! Password reset for the currently authenticated user.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::collections::BTreeMap;
use tracing::error;

use super::session::resolve_session;
use super::storage::update_password;
use super::types::{
    AckResponse, ErrorKind, ErrorResponse, ResetPasswordRequest, failure, validation_failure,
};
use super::utils::password_violations;
use crate::{password, token::TokenService};

#[utoipa::path(
    post,
    path = "/v1/auth/password/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = AckResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 422, description = "New password fails the policy", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    tokens: Extension<TokenService>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Response {
    let user = match resolve_session(&headers, &pool, &tokens).await {
        Ok(Some(user)) => user,
        Ok(None) => return failure(ErrorKind::Unauthenticated),
        Err(err) => {
            error!("Failed to resolve session: {err}");
            return failure(ErrorKind::ServerError);
        }
    };

    let Some(Json(request)) = payload else {
        return failure(ErrorKind::Validation);
    };

    let violations = password_violations(&request.new_password);
    if !violations.is_empty() {
        let mut fields = BTreeMap::new();
        fields.insert("newPassword".to_string(), violations);
        return validation_failure(fields);
    }

    let password_hash = match password::hash(&request.new_password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return failure(ErrorKind::ServerError);
        }
    };

    // Outstanding session tokens stay valid; there is no revocation list.
    if let Err(err) = update_password(&pool, user.id, &password_hash).await {
        error!("Failed to update password: {err}");
        return failure(ErrorKind::ServerError);
    }

    (
        StatusCode::OK,
        Json(AckResponse::ok("Password updated successfully")),
    )
        .into_response()
}
