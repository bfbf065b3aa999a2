//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the remote storage API

use crate::services::storage_service::StorageClient;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that issues a one-item list call against the configured
/// bucket. The gateway has no state of its own, so "ready" means exactly
/// "the remote storage API answers with our credentials".
///
/// Returns JSON describing the check. HTTP 200 when it passes,
/// HTTP 503 when it fails.
pub async fn readyz(State(client): State<StorageClient>) -> impl IntoResponse {
    let storage_check = match client.list("", 1).await {
        Ok(_) => (true, None::<String>),
        Err(err) => (false, Some(err.to_string())),
    };

    let ok = storage_check.0;
    let mut checks = HashMap::new();
    checks.insert(
        "storage",
        CheckStatus {
            ok,
            error: storage_check.1,
        },
    );

    let body = ReadyResponse {
        status: if ok { "ok".into() } else { "error".into() },
        checks,
    };
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
