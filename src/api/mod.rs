//! HTTP server wiring: database pool, router, and middleware stack.

use crate::{
    api::handlers::{auth, health, root},
    token::TokenService,
    totp::TotpService,
};
use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Json, Router,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    auth_config: auth::AuthConfig,
    token_service: TokenService,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    auth::storage::ensure_schema(&pool)
        .await
        .context("Failed to prepare users table")?;

    let totp_service = TotpService::new(auth_config.totp_issuer().to_string());
    let auth_state = Arc::new(auth::AuthState::new(auth_config));

    let public_origin = public_origin(auth_state.config())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(public_origin))
        .allow_credentials(true);

    let app = Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::openapi()) }),
        )
        .route("/v1/auth/signup", post(auth::signup::signup))
        .route("/v1/auth/login", post(auth::login::login))
        .route("/v1/auth/2fa/verify", post(auth::twofactor::verify_two_factor))
        .route("/v1/auth/session", get(auth::session::session))
        .route("/v1/auth/logout", post(auth::session::logout))
        .route("/v1/auth/password/reset", post(auth::reset::reset_password))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state))
                .layer(Extension(token_service))
                .layer(Extension(totp_service)),
        )
        .layer(Extension(pool));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn public_origin(config: &auth::AuthConfig) -> Result<HeaderValue> {
    let origin = config
        .public_origin()
        .ok_or_else(|| anyhow!("Invalid public URL: {}", config.public_url()))?;
    HeaderValue::from_str(&origin).context("Failed to build public origin header")
}
