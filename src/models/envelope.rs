//! The uniform JSON envelope returned by every endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response shape shared by success and failure paths.
///
/// Only `success` is always present; the remaining fields are omitted from
/// the JSON when unset, so a delete success is just
/// `{"success":true,"message":"File deleted successfully"}`.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Envelope {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Top-level URL, used only by the get-url operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Field-level validation errors, or per-file errors for a failed batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,

    /// Per-file errors for a batch that partially succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_errors: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_fields_are_omitted() {
        let envelope = Envelope {
            success: true,
            message: Some("File deleted successfully".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({"success": true, "message": "File deleted successfully"})
        );
    }

    #[test]
    fn partial_errors_round_trip() {
        let envelope = Envelope {
            success: true,
            data: Some(json!([{"path": "uploads/a.jpg"}])),
            partial_errors: Some(vec!["File 1: Upload failed".into()]),
            ..Default::default()
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["partial_errors"][0], "File 1: Upload failed");
        assert!(value.get("errors").is_none());
    }
}
