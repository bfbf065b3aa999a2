//! Descriptor for an object created by an upload.

use serde::{Deserialize, Serialize};

/// Returned to callers after a successful upload.
///
/// The gateway holds no copy or index of the object; this descriptor is the
/// only record the caller gets, so it carries everything needed to reference
/// the object later (its key and public URL).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoredObject {
    /// Generated object key within the bucket, e.g. `uploads/1700000000_ab12….jpg`.
    pub path: String,

    /// Public read URL derived from the bucket and key.
    pub url: String,

    /// Filename as submitted by the client.
    pub original_name: String,

    /// Size in bytes of the uploaded content.
    pub size: u64,

    /// MIME type declared by the client.
    pub mime_type: String,
}
