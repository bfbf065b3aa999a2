//! HTTP handlers for the `/files` operations.
//!
//! Each handler validates request shape explicitly, delegates to
//! `StorageClient`, and wraps the outcome in the standard envelope. Input
//! violations come back as 422 with field-level detail; any storage-client
//! failure becomes a 500 carrying the composed remote error message.

use crate::{
    errors::{ApiError, FieldErrors},
    models::envelope::Envelope,
    services::storage_service::StorageClient,
};
use axum::{
    Json,
    extract::{
        Multipart, Query, State,
        multipart::MultipartRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;

/// Per-file upload cap, matching the remote-side policy of 10 MiB.
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
const MAX_DIRECTORY_LEN: usize = 100;
const DEFAULT_DIRECTORY: &str = "uploads";
const DEFAULT_LIST_LIMIT: u32 = 100;

/// One file part pulled out of a multipart form.
#[derive(Debug)]
struct UploadedFile {
    original_name: String,
    mime_type: String,
    content: Bytes,
}

/// Collected multipart form: zero or more file parts plus an optional
/// `directory` text field. Unknown fields are ignored.
#[derive(Debug)]
struct UploadForm {
    files: Vec<UploadedFile>,
    directory: Option<String>,
}

/// Body for delete and get-url. `path` stays optional so a missing field is
/// reported as a 422 envelope instead of a framework rejection.
#[derive(Debug, Deserialize, Default)]
pub struct PathRequest {
    pub path: Option<String>,
}

/// `limit` arrives as a string so a non-numeric value can be turned into the
/// 422 envelope instead of a framework rejection.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub path: Option<String>,
    pub limit: Option<String>,
}

/// `POST /files/upload` — single file, optional directory.
pub async fn upload(
    State(client): State<StorageClient>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let form = read_form(multipart, "file").await?;
    let (file, directory) = validate_single(form)?;

    let object = client
        .upload(file.content, &file.original_name, &file.mime_type, &directory)
        .await?;

    let body = Envelope {
        success: true,
        message: Some("File uploaded successfully".into()),
        data: Some(json!(object)),
        ..Default::default()
    };
    Ok(Json(body).into_response())
}

/// `POST /files/upload-multiple` — sequential batch upload.
///
/// One failed item does not abort the rest: successes land in `data`,
/// failures in `partial_errors`. The batch as a whole only fails (500) when
/// every item failed.
pub async fn upload_multiple(
    State(client): State<StorageClient>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let form = read_form(multipart, "files").await?;
    let (files, directory) = validate_batch(form)?;

    let mut uploaded = Vec::new();
    let mut failures = Vec::new();
    for (index, file) in files.into_iter().enumerate() {
        match client
            .upload(file.content, &file.original_name, &file.mime_type, &directory)
            .await
        {
            Ok(object) => uploaded.push(object),
            Err(err) => failures.push(format!("File {}: {}", index, err)),
        }
    }

    if uploaded.is_empty() {
        let body = Envelope {
            success: false,
            message: Some("No files were uploaded successfully".into()),
            errors: Some(json!(failures)),
            ..Default::default()
        };
        return Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response());
    }

    let body = Envelope {
        success: true,
        message: Some(format!("{} file(s) uploaded successfully", uploaded.len())),
        data: Some(json!(uploaded)),
        partial_errors: (!failures.is_empty()).then_some(failures),
        ..Default::default()
    };
    Ok(Json(body).into_response())
}

/// `DELETE /files/delete` — body `{path}` required.
pub async fn delete_file(
    State(client): State<StorageClient>,
    payload: String,
) -> Result<Response, ApiError> {
    let path = parse_path(&payload).ok_or_else(|| missing_path_error(Some("Path is required")))?;
    client.delete(&path).await?;

    let body = Envelope {
        success: true,
        message: Some("File deleted successfully".into()),
        ..Default::default()
    };
    Ok(Json(body).into_response())
}

/// `GET /files/list?path=&limit=` — remote listing payload passed through.
pub async fn list_files(
    State(client): State<StorageClient>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let prefix = query.path.unwrap_or_default();
    let limit = parse_limit(query.limit.as_deref())?;

    let listing = client.list(&prefix, limit).await?;

    let body = Envelope {
        success: true,
        data: Some(listing),
        ..Default::default()
    };
    Ok(Json(body).into_response())
}

/// `POST /files/url` — derive the public URL for a key. No network call.
pub async fn get_url(
    State(client): State<StorageClient>,
    payload: String,
) -> Result<Response, ApiError> {
    // The original responds without a top-level message here.
    let path = parse_path(&payload).ok_or_else(|| missing_path_error(None))?;

    let body = Envelope {
        success: true,
        url: Some(client.public_url(&path)),
        ..Default::default()
    };
    Ok(Json(body).into_response())
}

/// Pull file parts and the `directory` field out of a multipart form.
///
/// `file_field` is the expected part name; the `[]`-suffixed variant is
/// accepted too, as HTML forms commonly submit arrays that way.
async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    file_field: &'static str,
) -> Result<UploadForm, ApiError> {
    let mut multipart = multipart.map_err(|err| {
        ApiError::validation(file_field, format!("invalid multipart payload: {}", err))
    })?;
    let mut files = Vec::new();
    let mut directory = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(ApiError::validation(
                    file_field,
                    format!("invalid multipart payload: {}", err),
                ));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == file_field || name == format!("{}[]", file_field) {
            let original_name = field.file_name().unwrap_or("file").to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let content = field.bytes().await.map_err(|err| {
                ApiError::validation(file_field, format!("could not read upload: {}", err))
            })?;
            files.push(UploadedFile {
                original_name,
                mime_type,
                content,
            });
        } else if name == "directory" {
            let value = field.text().await.map_err(|err| {
                ApiError::validation("directory", format!("could not read directory: {}", err))
            })?;
            directory = Some(value);
        }
    }

    Ok(UploadForm { files, directory })
}

fn validate_directory(directory: Option<String>, errors: &mut FieldErrors) -> String {
    let directory = directory.unwrap_or_else(|| DEFAULT_DIRECTORY.to_string());
    if directory.chars().count() > MAX_DIRECTORY_LEN {
        errors.add(
            "directory",
            format!("directory may not exceed {} characters", MAX_DIRECTORY_LEN),
        );
    }
    directory
}

fn validate_single(form: UploadForm) -> Result<(UploadedFile, String), ApiError> {
    let mut errors = FieldErrors::new();
    let directory = validate_directory(form.directory, &mut errors);

    match form.files.into_iter().next() {
        None => {
            errors.add("file", "a file is required");
            Err(errors.into_error())
        }
        Some(file) => {
            if file.content.len() > MAX_FILE_BYTES {
                errors.add("file", "file may not be larger than 10 MB");
            }
            errors.into_result()?;
            Ok((file, directory))
        }
    }
}

fn validate_batch(form: UploadForm) -> Result<(Vec<UploadedFile>, String), ApiError> {
    let mut errors = FieldErrors::new();
    let directory = validate_directory(form.directory, &mut errors);

    if form.files.is_empty() {
        errors.add("files", "at least one file is required");
    }
    for (index, file) in form.files.iter().enumerate() {
        if file.content.len() > MAX_FILE_BYTES {
            errors.add(
                format!("files.{}", index),
                "file may not be larger than 10 MB",
            );
        }
    }

    errors.into_result()?;
    Ok((form.files, directory))
}

/// Extract `path` from a JSON request body. Absent, empty, or unparseable
/// bodies all count as "path missing"; callers render the 422 envelope with
/// their operation's message rather than a framework rejection.
fn parse_path(payload: &str) -> Option<String> {
    serde_json::from_str::<PathRequest>(payload)
        .ok()
        .and_then(|body| body.path)
        .filter(|path| !path.is_empty())
}

fn missing_path_error(message: Option<&str>) -> ApiError {
    let mut errors = FieldErrors::new();
    errors.add("path", "path is required");
    errors.into_error_with(message.map(str::to_string))
}

fn parse_limit(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw {
        None | Some("") => Ok(DEFAULT_LIST_LIMIT),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| ApiError::validation("limit", "limit must be a non-negative integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(len: usize) -> UploadedFile {
        UploadedFile {
            original_name: "photo.jpg".into(),
            mime_type: "image/jpeg".into(),
            content: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn single_upload_requires_a_file() {
        let form = UploadForm {
            files: vec![],
            directory: None,
        };
        assert!(validate_single(form).is_err());
    }

    #[test]
    fn single_upload_defaults_directory() {
        let form = UploadForm {
            files: vec![file(16)],
            directory: None,
        };
        let (_, directory) = validate_single(form).unwrap();
        assert_eq!(directory, "uploads");
    }

    #[test]
    fn oversized_file_is_rejected() {
        let form = UploadForm {
            files: vec![file(MAX_FILE_BYTES + 1)],
            directory: None,
        };
        assert!(validate_single(form).is_err());
    }

    #[test]
    fn overlong_directory_is_rejected() {
        let form = UploadForm {
            files: vec![file(16)],
            directory: Some("d".repeat(101)),
        };
        assert!(validate_single(form).is_err());
    }

    #[test]
    fn batch_rejects_any_oversized_file_up_front() {
        let form = UploadForm {
            files: vec![file(16), file(MAX_FILE_BYTES + 1)],
            directory: None,
        };
        let err = validate_batch(form).unwrap_err();
        match err {
            ApiError::Validation { .. } => {}
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn missing_path_is_a_validation_error() {
        assert!(parse_path("").is_none());
        assert!(parse_path("{}").is_none());
        assert!(parse_path(r#"{"path":""}"#).is_none());
        assert!(parse_path("not json").is_none());
        assert_eq!(
            parse_path(r#"{"path":"uploads/a.jpg"}"#).unwrap(),
            "uploads/a.jpg"
        );
    }

    #[test]
    fn limit_parses_or_defaults() {
        assert_eq!(parse_limit(None).unwrap(), 100);
        assert_eq!(parse_limit(Some("")).unwrap(), 100);
        assert_eq!(parse_limit(Some("25")).unwrap(), 25);
        assert!(parse_limit(Some("abc")).is_err());
        assert!(parse_limit(Some("-1")).is_err());
    }
}
