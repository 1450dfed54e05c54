//! Upload error types.

use std::error::Error as _;
use std::io;

use strongbox_protocol::{ApiErrorCode, ProtocolError, UploadPhase};
use strongbox_transfer::TransferError;

/// Failure to reach the server at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Io(String),

    #[error("TLS handshake failed: {0}")]
    Insecure(String),
}

impl TransportError {
    /// Returns `true` for TLS/handshake failures.
    pub fn is_insecure(&self) -> bool {
        matches!(self, TransportError::Insecure(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() && is_tls_failure(&e) {
            tracing::error!(error = %e, "TLS handshake with server failed");
            TransportError::Insecure(e.to_string())
        } else {
            TransportError::Io(e.to_string())
        }
    }
}

/// rustls reports handshake and certificate failures as `InvalidData`.
fn is_tls_failure(e: &reqwest::Error) -> bool {
    let mut source = e.source();
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::InvalidData
        {
            return true;
        }
        source = err.source();
    }
    false
}

/// Errors produced by an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{phase} request rejected: {code} ({})", .code.number())]
    Api {
        phase: UploadPhase,
        code: ApiErrorCode,
    },

    #[error("could not read upload source: {0}")]
    LocalSource(#[source] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("invalid upload request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Settings(#[from] TransferError),

    #[error("upload cancelled")]
    Cancelled,
}

impl UploadError {
    /// Mapped remote error code, if the server rejected a request.
    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            UploadError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Failures that turn into a cancellation when the upload was cancelled
    /// while they happened.
    pub(crate) fn is_interruptible(&self) -> bool {
        matches!(
            self,
            UploadError::Transport(_) | UploadError::LocalSource(_) | UploadError::Cancelled
        )
    }
}

/// Errors produced by [`StreamUpload`](crate::StreamUpload).
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("write range out of bounds: offset {offset}, length {len}, buffer {buf_len}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        buf_len: usize,
    },

    #[error("stream was already closed")]
    Closed,

    #[error("could not write to upload stream")]
    Write(#[source] UploadError),

    #[error("could not close upload stream")]
    Close(#[source] UploadError),
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        let kind = match &e {
            StreamError::OutOfBounds { .. } => io::ErrorKind::InvalidInput,
            StreamError::Closed => io::ErrorKind::BrokenPipe,
            StreamError::Write(_) | StreamError::Close(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}
