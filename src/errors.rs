//! Handler-boundary error type and the validation-error accumulator.
//!
//! Exactly two failure kinds cross the HTTP boundary: malformed input (422
//! with field-level detail) and a failed remote call (500 with the composed
//! message from the storage client). Both render the standard envelope.

use crate::{models::envelope::Envelope, services::storage_service::StorageError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", message.as_deref().unwrap_or("Validation failed"))]
    Validation {
        /// Top-level envelope message; omitted from the JSON when `None`
        /// (the get-url operation responds with field errors only).
        message: Option<String>,
        errors: FieldErrors,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// Shortcut for a single-field validation failure.
    pub fn validation(field: impl Into<String>, detail: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, detail);
        errors.into_error()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation { message, errors } => {
                let body = Envelope {
                    success: false,
                    message,
                    errors: Some(json!(errors.0)),
                    ..Default::default()
                };
                (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
            }
            ApiError::Storage(err) => {
                let body = Envelope {
                    success: false,
                    message: Some(err.to_string()),
                    ..Default::default()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Ordered accumulator of field-level validation messages.
///
/// Handlers collect every violation before responding so the caller sees all
/// of them at once rather than one per round trip.
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, detail: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(detail.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_error(self) -> ApiError {
        self.into_error_with(Some("Validation failed".into()))
    }

    /// Like `into_error`, but with the caller's top-level message (or none).
    pub fn into_error_with(self, message: Option<String>) -> ApiError {
        ApiError::Validation {
            message,
            errors: self,
        }
    }

    /// Err with all collected violations, or Ok when none were recorded.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }
}
