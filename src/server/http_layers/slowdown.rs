//! Dev-only middleware that delays every request, to exercise the
//! "analyzing, please wait" state of the frontend.
#![cfg(feature = "slowdown")]

use axum::{body::Body, http::Request, middleware::Next, response::IntoResponse};
use std::time::Duration;

pub async fn slowdown_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    tokio::time::sleep(Duration::from_millis(1500)).await;
    next.run(request).await
}
