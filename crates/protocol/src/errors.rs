//! Per-phase mapping of failed responses to typed error codes.
//!
//! The server answers failures with a JSON body such as
//! `{"code":404,"message":"...","errorCode":-41000}`. The HTTP status decides
//! the broad class; `errorCode` refines it where the phase gives it meaning.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of the upload protocol a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Create,
    UploadChunk,
    Complete,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadPhase::Create => "create",
            UploadPhase::UploadChunk => "upload chunk",
            UploadPhase::Complete => "complete",
        })
    }
}

/// Error body returned by the server on failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
}

/// Mapped remote error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    AuthUnauthorized,
    ValidationUnknownError,
    ValidationFileNameInvalid,
    ValidationClassificationInvalid,
    ValidationExpirationInvalid,
    ValidationRangeInvalid,
    PermissionUnknownError,
    PermissionUploadDenied,
    NodeTargetNotFound,
    UploadNotFound,
    FileAlreadyExists,
    StorageQuotaExceeded,
    ServerInsufficientStorage,
    ServerUnknownError,
}

impl ApiErrorCode {
    /// Stable numeric identifier exposed to callers.
    pub fn number(self) -> i32 {
        match self {
            ApiErrorCode::AuthUnauthorized => -100,
            ApiErrorCode::ValidationUnknownError => -400,
            ApiErrorCode::ValidationFileNameInvalid => -401,
            ApiErrorCode::ValidationClassificationInvalid => -402,
            ApiErrorCode::ValidationExpirationInvalid => -403,
            ApiErrorCode::ValidationRangeInvalid => -404,
            ApiErrorCode::PermissionUnknownError => -500,
            ApiErrorCode::PermissionUploadDenied => -501,
            ApiErrorCode::NodeTargetNotFound => -600,
            ApiErrorCode::UploadNotFound => -601,
            ApiErrorCode::FileAlreadyExists => -700,
            ApiErrorCode::StorageQuotaExceeded => -800,
            ApiErrorCode::ServerInsufficientStorage => -801,
            ApiErrorCode::ServerUnknownError => -900,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ApiErrorCode::AuthUnauthorized => "AUTH_UNAUTHORIZED",
            ApiErrorCode::ValidationUnknownError => "VALIDATION_UNKNOWN_ERROR",
            ApiErrorCode::ValidationFileNameInvalid => "VALIDATION_FILE_NAME_INVALID",
            ApiErrorCode::ValidationClassificationInvalid => "VALIDATION_CLASSIFICATION_INVALID",
            ApiErrorCode::ValidationExpirationInvalid => "VALIDATION_EXPIRATION_INVALID",
            ApiErrorCode::ValidationRangeInvalid => "VALIDATION_RANGE_INVALID",
            ApiErrorCode::PermissionUnknownError => "PERMISSION_UNKNOWN_ERROR",
            ApiErrorCode::PermissionUploadDenied => "PERMISSION_UPLOAD_DENIED",
            ApiErrorCode::NodeTargetNotFound => "NODE_TARGET_NOT_FOUND",
            ApiErrorCode::UploadNotFound => "UPLOAD_NOT_FOUND",
            ApiErrorCode::FileAlreadyExists => "FILE_ALREADY_EXISTS",
            ApiErrorCode::StorageQuotaExceeded => "STORAGE_QUOTA_EXCEEDED",
            ApiErrorCode::ServerInsufficientStorage => "SERVER_INSUFFICIENT_STORAGE",
            ApiErrorCode::ServerUnknownError => "SERVER_UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Server-side error codes with phase-specific meaning.
const ERR_FILE_NAME_INVALID: i32 = -40755;
const ERR_CLASSIFICATION_INVALID: i32 = -80024;
const ERR_EXPIRATION_INVALID: i32 = -40701;
const ERR_QUOTA_EXCEEDED: i32 = -40200;

/// Maps a failed response of `phase` to an [`ApiErrorCode`].
///
/// `body` may be empty or non-JSON; the status class is used then.
pub fn parse_api_error(phase: UploadPhase, status: u16, body: &[u8]) -> ApiErrorCode {
    let error_code = serde_json::from_slice::<ApiErrorResponse>(body)
        .ok()
        .and_then(|r| r.error_code);

    match (status, phase) {
        (401, _) => ApiErrorCode::AuthUnauthorized,

        (400, UploadPhase::Create) => match error_code {
            Some(ERR_FILE_NAME_INVALID) => ApiErrorCode::ValidationFileNameInvalid,
            Some(ERR_CLASSIFICATION_INVALID) => ApiErrorCode::ValidationClassificationInvalid,
            Some(ERR_EXPIRATION_INVALID) => ApiErrorCode::ValidationExpirationInvalid,
            _ => ApiErrorCode::ValidationUnknownError,
        },
        (400, UploadPhase::Complete) => match error_code {
            Some(ERR_FILE_NAME_INVALID) => ApiErrorCode::ValidationFileNameInvalid,
            _ => ApiErrorCode::ValidationUnknownError,
        },
        (400, UploadPhase::UploadChunk) | (416, UploadPhase::UploadChunk) => {
            ApiErrorCode::ValidationRangeInvalid
        }

        (403, UploadPhase::Create) => ApiErrorCode::PermissionUploadDenied,
        (403, _) => ApiErrorCode::PermissionUnknownError,

        (404, UploadPhase::Create) => ApiErrorCode::NodeTargetNotFound,
        (404, _) => ApiErrorCode::UploadNotFound,

        (409, UploadPhase::Complete) => ApiErrorCode::FileAlreadyExists,

        (507, _) => match error_code {
            Some(ERR_QUOTA_EXCEEDED) => ApiErrorCode::StorageQuotaExceeded,
            _ => ApiErrorCode::ServerInsufficientStorage,
        },

        (s, _) if (400..500).contains(&s) => ApiErrorCode::ValidationUnknownError,
        _ => ApiErrorCode::ServerUnknownError,
    }
}
