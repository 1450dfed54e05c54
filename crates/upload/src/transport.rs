//! Seams between the upload drivers and the outside world.
//!
//! [`UploadTransport`] issues the three protocol requests and hands back the
//! raw status and body; interpreting them is the session's job.
//! [`TokenProvider`] supplies the authorization token for each request.

use std::future::Future;
use std::pin::Pin;

use strongbox_protocol::{CompleteFileUploadRequest, CreateFileUploadRequest};
use strongbox_transfer::ChunkBody;

use crate::error::{TransportError, UploadError};

/// Boxed future returned by transport methods.
pub type TransportFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Boxed future returned by [`TokenProvider::access_token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<String, UploadError>> + Send + 'a>>;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract connection to the upload endpoints.
///
/// Implemented over HTTP by [`HttpTransport`](crate::HttpTransport); tests
/// use a recording mock.
pub trait UploadTransport: Send + Sync {
    /// Opens an upload session.
    fn create_upload<'a>(
        &'a self,
        token: &'a str,
        request: &'a CreateFileUploadRequest,
    ) -> TransportFuture<'a, ApiResponse>;

    /// Sends one chunk as a multipart body with the given `Content-Range`.
    fn upload_chunk<'a>(
        &'a self,
        token: &'a str,
        upload_id: &'a str,
        file_name: &'a str,
        content_range: String,
        body: ChunkBody,
    ) -> TransportFuture<'a, ApiResponse>;

    /// Finalizes an upload session.
    fn complete_upload<'a>(
        &'a self,
        token: &'a str,
        upload_id: &'a str,
        request: &'a CompleteFileUploadRequest,
    ) -> TransportFuture<'a, ApiResponse>;
}

/// Supplies the authorization token. Asked once per request.
pub trait TokenProvider: Send + Sync {
    fn access_token(&self) -> TokenFuture<'_>;
}

/// A fixed, pre-issued token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn access_token(&self) -> TokenFuture<'_> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(ApiResponse::new(200, Vec::new()).is_success());
        assert!(ApiResponse::new(201, b"{}".to_vec()).is_success());
        assert!(!ApiResponse::new(302, Vec::new()).is_success());
        assert!(!ApiResponse::new(404, Vec::new()).is_success());
    }

    #[tokio::test]
    async fn static_token_is_returned_every_time() {
        let tokens = StaticToken::new("secret");
        assert_eq!(tokens.access_token().await.unwrap(), "secret");
        assert_eq!(tokens.access_token().await.unwrap(), "secret");
    }
}
