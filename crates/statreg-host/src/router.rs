//! Axum router wiring for the stat exposition endpoints.
//!
//! - `/healthz`    : liveness
//! - `/metrics`    : Prometheus text format
//! - `/stats.json` : full sink snapshot

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::app_state::HostState;

pub fn build_router(state: HostState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/stats.json", get(stats_json))
        .with_state(state)
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<HostState>) -> Response {
    let body = state.sink().render();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub async fn stats_json(State(state): State<HostState>) -> Response {
    Json(state.sink().snapshot()).into_response()
}
