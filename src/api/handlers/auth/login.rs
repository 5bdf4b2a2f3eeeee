//! Sign-in: the password check (first factor).

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};

use super::session::session_cookie;
use super::state::AuthState;
use super::storage::{clear_lockout, lookup_user_by_email, record_failed_login};
use super::types::{ErrorKind, ErrorResponse, SignInData, SignInRequest, SignInResponse, failure};
use crate::{
    password,
    token::{TokenScope, TokenService},
};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Password accepted; data says whether a second factor is required", body = SignInResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 423, description = "Account locked", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    tokens: Extension<TokenService>,
    payload: Option<Json<SignInRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return failure(ErrorKind::Validation);
    };

    // Unknown email and wrong password answer identically.
    let user = match lookup_user_by_email(&pool, &request.email).await {
        Ok(Some(user)) => user,
        Ok(None) => return failure(ErrorKind::InvalidCredentials),
        Err(err) => {
            error!("Failed to lookup user: {err}");
            return failure(ErrorKind::ServerError);
        }
    };

    // Lock expiry is evaluated here, not in the store; a lapsed lock simply
    // stops matching and the next successful check clears the counters.
    if user.lock_active(Utc::now()) {
        return failure(ErrorKind::AccountLocked);
    }

    let config = auth_state.config();

    if !password::verify(&request.password, &user.password_hash) {
        match record_failed_login(
            &pool,
            user.id,
            config.max_login_attempts(),
            config.lockout_minutes(),
        )
        .await
        {
            Ok((attempts, locked)) => {
                if locked {
                    info!(user_id = %user.id, attempts, "Account locked after repeated failures");
                }
            }
            Err(err) => error!("Failed to record failed login: {err}"),
        }
        return failure(ErrorKind::InvalidCredentials);
    }

    if let Err(err) = clear_lockout(&pool, user.id).await {
        error!("Failed to reset lockout state: {err}");
        return failure(ErrorKind::ServerError);
    }

    if user.is_two_factor_enabled {
        // Hand back proof of the first factor; the session is only issued
        // once the TOTP step presents it.
        let pending = match tokens.issue(user.id, TokenScope::Pending, config.pending_ttl_seconds())
        {
            Ok(token) => token,
            Err(err) => {
                error!("Failed to issue pending token: {err}");
                return failure(ErrorKind::ServerError);
            }
        };
        let body = SignInResponse {
            success: true,
            message: "Login successful".to_string(),
            data: SignInData {
                user_id: user.id.to_string(),
                required_two_factor_auth: true,
                pending_token: Some(pending),
            },
        };
        return (StatusCode::OK, Json(body)).into_response();
    }

    // Two-factor disabled: route straight to token issuance.
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

    let body = SignInResponse {
        success: true,
        message: "Login successful".to_string(),
        data: SignInData {
            user_id: user.id.to_string(),
            required_two_factor_auth: false,
            pending_token: None,
        },
    };
    (StatusCode::OK, headers, Json(body)).into_response()
}
