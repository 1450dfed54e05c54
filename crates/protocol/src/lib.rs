//! Wire types for the Strongbox file upload REST protocol.
//!
//! An upload runs in three phases against the remote node store:
//!
//! 1. **Create** - `POST /api/v4/nodes/files/uploads` returns an opaque upload id
//! 2. **Upload chunk** - `POST /api/v4/nodes/files/uploads/{id}` with a
//!    `Content-Range` header, repeated in strictly increasing offset order
//! 3. **Complete** - `PUT /api/v4/nodes/files/uploads/{id}` returns the new node
//!
//! This crate only holds the request/response shapes and the per-phase
//! error-code tables; transport lives in `strongbox-upload`.

pub mod errors;
pub mod messages;
pub mod types;

pub use errors::{ApiErrorCode, ApiErrorResponse, UploadPhase, parse_api_error};
pub use messages::{
    CompleteFileUploadRequest, CreateFileUploadRequest, FileUploadResponse, content_range,
};
pub use types::{Classification, Expiration, Node, NodeType, ResolutionStrategy};

/// Path of the upload collection, relative to the server base URL.
pub const UPLOADS_PATH: &str = "/api/v4/nodes/files/uploads";

/// Header carrying the per-request authorization token.
pub const AUTH_TOKEN_HEADER: &str = "X-Sds-Auth-Token";

/// Name of the multipart form part holding chunk bytes.
pub const CHUNK_PART_NAME: &str = "file";

/// Content type of the chunk part.
pub const CHUNK_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors produced while encoding or decoding protocol payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown classification value: {0}")]
    UnknownClassification(i32),

    #[error("empty response body for {0}")]
    EmptyBody(UploadPhase),
}

/// Builds the path of a single upload session.
pub fn upload_path(upload_id: &str) -> String {
    format!("{UPLOADS_PATH}/{upload_id}")
}
