//! TOTP verification: the second factor, and the only step that mints a
//! full session.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::session::session_cookie;
use super::state::AuthState;
use super::storage::lookup_user_by_id;
use super::types::{AckResponse, ErrorKind, ErrorResponse, VerifyTwoFactorRequest, failure};
use crate::{
    token::{TokenScope, TokenService},
    totp::TotpService,
};

#[utoipa::path(
    post,
    path = "/v1/auth/2fa/verify",
    request_body = VerifyTwoFactorRequest,
    responses(
        (status = 200, description = "Code accepted; session cookie set", body = AckResponse),
        (status = 400, description = "Invalid code", body = ErrorResponse),
        (status = 401, description = "Missing or invalid pending token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn verify_two_factor(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    tokens: Extension<TokenService>,
    totp_service: Extension<TotpService>,
    payload: Option<Json<VerifyTwoFactorRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return failure(ErrorKind::Validation);
    };

    // The pending token is the proof that the password check already
    // succeeded; a bare user id is not enough to reach this step.
    let Ok(proven_user) = tokens.verify(&request.pending_token, TokenScope::Pending) else {
        return failure(ErrorKind::Unauthenticated);
    };

    let Ok(claimed_user) = Uuid::parse_str(&request.user_id) else {
        return failure(ErrorKind::NotFound);
    };

    if claimed_user != proven_user {
        return failure(ErrorKind::Unauthenticated);
    }

    let user = match lookup_user_by_id(&pool, claimed_user).await {
        Ok(Some(user)) => user,
        Ok(None) => return failure(ErrorKind::NotFound),
        Err(err) => {
            error!("Failed to lookup user: {err}");
            return failure(ErrorKind::ServerError);
        }
    };

    if !totp_service.verify_code(&user.totp_secret, &request.code) {
        return failure(ErrorKind::InvalidCode);
    }

    let config = auth_state.config();
    let session = match tokens.issue(user.id, TokenScope::Session, config.session_ttl_seconds()) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return failure(ErrorKind::ServerError);
        }
    };

    let mut headers = HeaderMap::new();
    match session_cookie(config, &session) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return failure(ErrorKind::ServerError);
        }
    }

    (
        StatusCode::OK,
        headers,
        Json(AckResponse::ok("Login successful")),
    )
        .into_response()
}
