use serde::{Deserialize, Serialize};

use crate::types::{Classification, Expiration, ResolutionStrategy};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Opens a new upload session below `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileUploadRequest {
    pub parent_id: i64,
    pub name: String,
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Expiration>,
}

/// Finalizes an upload session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteFileUploadRequest {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_strategy: Option<ResolutionStrategy>,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Response to a create request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    pub upload_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Formats the `Content-Range` value for `len` bytes starting at `offset`.
///
/// The upper bound is exclusive and the total length is always `*`; the
/// server infers the file size from the last range it receives.
pub fn content_range(offset: u64, len: u64) -> String {
    format!("bytes {}-{}/*", offset, offset + len)
}
