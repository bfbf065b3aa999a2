//! StorageClient — one outbound HTTP call per logical operation against a
//! Supabase-style storage API (`/storage/v1/object/{bucket}/{key}` plus a
//! public-read variant and a `list/{bucket}` endpoint). Each call is a single
//! synchronous round trip: no retries, no pagination beyond the caller's
//! limit/offset, no local state.

use crate::{config::AppConfig, models::object::StoredObject};
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};
use std::{fmt, path::Path, time::Duration};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

/// Logical operation names used in error messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Delete,
    List,
    Download,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Upload => "Upload",
            Operation::Delete => "Delete",
            Operation::List => "File listing",
            Operation::Download => "Download",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// The remote API answered with a non-success status.
    #[error("{operation} failed with status {status}: {body}")]
    Remote {
        operation: Operation,
        status: u16,
        body: String,
    },

    /// The request never completed, or the response body could not be decoded.
    #[error("{operation} failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Client for the remote object-storage REST API.
///
/// Holds the base URL, bucket, and bearer credential, all injected at
/// construction. Cloning is cheap (`reqwest::Client` is internally shared),
/// so the router carries a clone of this as its state.
#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl StorageClient {
    pub fn new(cfg: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: cfg.supabase_url.trim_end_matches('/').to_string(),
            bucket: cfg.bucket.clone(),
            service_key: cfg.service_key.clone(),
        })
    }

    /// URL of an object for authenticated read/write/delete.
    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }

    /// Public read URL for a key. Pure derivation, no network call.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }

    /// Generate the object key for an upload:
    /// `directory/<unix-seconds>_<random-token>` plus the original filename's
    /// extension when it has one. Keys are never checked for collisions; the
    /// 128-bit random token makes them vanishingly unlikely.
    fn generate_key(directory: &str, original_name: &str) -> String {
        let timestamp = Utc::now().timestamp();
        let token = Uuid::new_v4().simple();
        match Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) => format!("{}/{}_{}.{}", directory, timestamp, token, ext),
            None => format!("{}/{}_{}", directory, timestamp, token),
        }
    }

    /// Upload raw bytes under a freshly generated key.
    ///
    /// The declared MIME type is forwarded as the object's content type.
    /// Returns the descriptor the caller needs to reference the object later.
    pub async fn upload(
        &self,
        content: Bytes,
        original_name: &str,
        mime_type: &str,
        directory: &str,
    ) -> StorageResult<StoredObject> {
        let key = Self::generate_key(directory, original_name);
        let size = content.len() as u64;

        let response = self
            .http
            .post(self.object_url(&key))
            .bearer_auth(&self.service_key)
            .header(CONTENT_TYPE, mime_type)
            .body(content)
            .send()
            .await
            .map_err(|source| Self::transport(Operation::Upload, &key, source))?;
        self.ensure_success(Operation::Upload, &key, response)
            .await?;

        info!(path = %key, size, "file uploaded");
        Ok(StoredObject {
            url: self.public_url(&key),
            path: key,
            original_name: original_name.to_string(),
            size,
            mime_type: mime_type.to_string(),
        })
    }

    /// Delete an object by key and return the decoded remote response body.
    pub async fn delete(&self, key: &str) -> StorageResult<Value> {
        let response = self
            .http
            .delete(self.object_url(key))
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|source| Self::transport(Operation::Delete, key, source))?;
        let response = self.ensure_success(Operation::Delete, key, response).await?;

        let body = response
            .json::<Value>()
            .await
            .map_err(|source| Self::transport(Operation::Delete, key, source))?;
        info!(path = %key, "file deleted");
        Ok(body)
    }

    /// List objects under an optional prefix. The remote listing payload is
    /// returned unmodified; the gateway does not reshape it.
    pub async fn list(&self, prefix: &str, limit: u32) -> StorageResult<Value> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        let mut request = self
            .http
            .post(url)
            .bearer_auth(&self.service_key)
            .json(&json!({ "limit": limit, "offset": 0 }));
        if !prefix.is_empty() {
            request = request.query(&[("prefix", prefix)]);
        }

        let response = request
            .send()
            .await
            .map_err(|source| Self::transport(Operation::List, prefix, source))?;
        let response = self.ensure_success(Operation::List, prefix, response).await?;

        response
            .json::<Value>()
            .await
            .map_err(|source| Self::transport(Operation::List, prefix, source))
    }

    /// Fetch an object's raw bytes. Not exposed over the gateway's HTTP
    /// surface; available for in-process callers.
    pub async fn download(&self, key: &str) -> StorageResult<Bytes> {
        let response = self
            .http
            .get(self.object_url(key))
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|source| Self::transport(Operation::Download, key, source))?;
        let response = self
            .ensure_success(Operation::Download, key, response)
            .await?;

        response
            .bytes()
            .await
            .map_err(|source| Self::transport(Operation::Download, key, source))
    }

    fn transport(operation: Operation, context: &str, source: reqwest::Error) -> StorageError {
        error!(%operation, path = %context, error = %source, "storage call failed");
        StorageError::Transport { operation, source }
    }

    /// Turn a non-success response into `StorageError::Remote`, capturing the
    /// remote status and body for the caller-facing message.
    async fn ensure_success(
        &self,
        operation: Operation,
        context: &str,
        response: reqwest::Response,
    ) -> StorageResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(%operation, path = %context, status = status.as_u16(), %body, "remote call rejected");
        Err(StorageError::Remote {
            operation,
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base_url: &str) -> StorageClient {
        let cfg = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            supabase_url: base_url.into(),
            service_key: "test-key".into(),
            bucket: "media".into(),
            request_timeout_secs: 5,
        };
        StorageClient::new(&cfg).unwrap()
    }

    #[test]
    fn generated_keys_follow_the_naming_convention() {
        let key = StorageClient::generate_key("avatars", "photo.jpg");
        let (dir, rest) = key.split_once('/').unwrap();
        assert_eq!(dir, "avatars");

        let (stem, ext) = rest.rsplit_once('.').unwrap();
        assert_eq!(ext, "jpg");
        let (timestamp, token) = stem.split_once('_').unwrap();
        assert!(timestamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(token.len(), 32);
    }

    #[test]
    fn extensionless_uploads_get_no_trailing_dot() {
        let key = StorageClient::generate_key("uploads", "README");
        assert!(!key.ends_with('.'));
        assert!(!key.contains('.'));
    }

    #[test]
    fn public_url_is_deterministic() {
        let client = client_for("https://example.supabase.co");
        let a = client.public_url("uploads/a.jpg");
        let b = client.public_url("uploads/a.jpg");
        assert_eq!(a, b);
        assert_eq!(
            a,
            "https://example.supabase.co/storage/v1/object/public/media/uploads/a.jpg"
        );
    }

    #[tokio::test]
    async fn upload_returns_descriptor_on_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                mockito::Matcher::Regex(r"^/storage/v1/object/media/avatars/\d+_[0-9a-f]{32}\.jpg$".into()),
            )
            .match_header("authorization", "Bearer test-key")
            .match_header("content-type", "image/jpeg")
            .with_status(200)
            .with_body(r#"{"Key":"media/avatars/x.jpg"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let object = client
            .upload(Bytes::from_static(b"fake jpeg"), "photo.jpg", "image/jpeg", "avatars")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(object.path.starts_with("avatars/"));
        assert!(object.path.ends_with(".jpg"));
        assert_eq!(object.original_name, "photo.jpg");
        assert_eq!(object.size, 9);
        assert_eq!(object.mime_type, "image/jpeg");
        assert_eq!(object.url, client.public_url(&object.path));
    }

    #[tokio::test]
    async fn upload_surfaces_remote_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "POST",
                mockito::Matcher::Regex(r"^/storage/v1/object/media/.*".into()),
            )
            .with_status(403)
            .with_body(r#"{"error":"invalid_token"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .upload(Bytes::from_static(b"x"), "a.txt", "text/plain", "uploads")
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Upload failed"));
        assert!(message.contains("403"));
        assert!(message.contains("invalid_token"));
    }

    #[tokio::test]
    async fn delete_returns_decoded_remote_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/storage/v1/object/media/uploads/a.jpg")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(r#"{"message":"Successfully deleted"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let body = client.delete("uploads/a.jpg").await.unwrap();

        mock.assert_async().await;
        assert_eq!(body["message"], "Successfully deleted");
    }

    #[tokio::test]
    async fn list_passes_prefix_and_limit_through() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/list/media")
            .match_query(mockito::Matcher::UrlEncoded("prefix".into(), "avatars".into()))
            .match_body(mockito::Matcher::Json(json!({"limit": 25, "offset": 0})))
            .with_status(200)
            .with_body(r#"[{"name":"avatars/a.jpg"}]"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let listing = client.list("avatars", 25).await.unwrap();

        mock.assert_async().await;
        assert_eq!(listing[0]["name"], "avatars/a.jpg");
    }

    #[tokio::test]
    async fn list_without_prefix_sends_no_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/list/media")
            .match_query(mockito::Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server.url());
        client.list("", 100).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn download_returns_raw_bytes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/storage/v1/object/media/uploads/a.bin")
            .with_status(200)
            .with_body(&b"\x00\x01binary"[..])
            .create_async()
            .await;

        let client = client_for(&server.url());
        let bytes = client.download("uploads/a.bin").await.unwrap();
        assert_eq!(&bytes[..], b"\x00\x01binary");
    }

    #[tokio::test]
    async fn download_failure_carries_operation_name() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/storage/v1/object/media/missing.bin")
            .with_status(404)
            .with_body(r#"{"error":"not_found"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client.download("missing.bin").await.unwrap_err();
        assert!(err.to_string().starts_with("Download failed"));
    }
}
