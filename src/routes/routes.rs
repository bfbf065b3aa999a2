//! Defines routes for all file-gateway operations.
//!
//! ## Structure
//! - **File endpoints** (under `/files`)
//!   - `POST   /files/upload`          — upload one file (multipart `file`, optional `directory`)
//!   - `POST   /files/upload-multiple` — upload a batch (multipart `files[]`, optional `directory`)
//!   - `DELETE /files/delete`          — delete by key (JSON body `path`)
//!   - `GET    /files/list`            — list objects (query `path`, `limit`)
//!   - `POST   /files/url`             — derive a public URL (JSON body `path`)
//!
//! - **Health endpoints** (mounted at root): `/healthz`, `/readyz`

use crate::{
    handlers::{
        file_handlers::{MAX_FILE_BYTES, delete_file, get_url, list_files, upload, upload_multiple},
        health_handlers::{healthz, readyz},
    },
    services::storage_service::StorageClient,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

/// Request bodies may carry several files plus multipart framing, so the
/// whole-body cap sits well above the per-file limit; the handlers enforce
/// the per-file 10 MiB rule themselves.
const MAX_REQUEST_BODY_BYTES: usize = 16 * MAX_FILE_BYTES;

/// Build and return the router for all gateway routes.
///
/// The router carries shared state (`StorageClient`) to all handlers.
pub fn routes() -> Router<StorageClient> {
    let files = Router::new()
        .route("/upload", post(upload))
        .route("/upload-multiple", post(upload_multiple))
        .route("/delete", delete(delete_file))
        .route("/list", get(list_files))
        .route("/url", post(get_url));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/files", files)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
}
