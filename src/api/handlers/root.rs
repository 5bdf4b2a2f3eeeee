//! Root endpoint; undocumented, returns the service banner.

use axum::response::IntoResponse;

pub async fn root() -> impl IntoResponse {
    crate::APP_USER_AGENT
}
