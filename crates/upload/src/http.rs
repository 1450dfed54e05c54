//! HTTP transport over `reqwest`.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, header::CONTENT_RANGE};
use strongbox_protocol::{
    AUTH_TOKEN_HEADER, CHUNK_CONTENT_TYPE, CHUNK_PART_NAME, CompleteFileUploadRequest,
    CreateFileUploadRequest, UPLOADS_PATH, upload_path,
};
use strongbox_transfer::ChunkBody;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{ApiResponse, TransportFuture, UploadTransport};

/// [`UploadTransport`] talking to a real server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the server at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, base_url))
    }

    /// Wraps an existing client.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<ApiResponse, TransportError> {
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        debug!(status, body_len = body.len(), "response received");
        Ok(ApiResponse { status, body })
    }
}

impl UploadTransport for HttpTransport {
    fn create_upload<'a>(
        &'a self,
        token: &'a str,
        request: &'a CreateFileUploadRequest,
    ) -> TransportFuture<'a, ApiResponse> {
        Box::pin(async move {
            let req = self
                .http
                .post(self.url(UPLOADS_PATH))
                .header(AUTH_TOKEN_HEADER, token)
                .json(request);
            self.execute(req).await
        })
    }

    fn upload_chunk<'a>(
        &'a self,
        token: &'a str,
        upload_id: &'a str,
        file_name: &'a str,
        content_range: String,
        body: ChunkBody,
    ) -> TransportFuture<'a, ApiResponse> {
        Box::pin(async move {
            let len = body.len();
            let blocks = stream::iter(body.into_blocks().map(Ok::<Bytes, io::Error>));
            let part = Part::stream_with_length(reqwest::Body::wrap_stream(blocks), len)
                .file_name(file_name.to_string())
                .mime_str(CHUNK_CONTENT_TYPE)?;
            let form = Form::new().part(CHUNK_PART_NAME, part);

            let req = self
                .http
                .post(self.url(&upload_path(upload_id)))
                .header(AUTH_TOKEN_HEADER, token)
                .header(CONTENT_RANGE, content_range)
                .multipart(form);
            self.execute(req).await
        })
    }

    fn complete_upload<'a>(
        &'a self,
        token: &'a str,
        upload_id: &'a str,
        request: &'a CompleteFileUploadRequest,
    ) -> TransportFuture<'a, ApiResponse> {
        Box::pin(async move {
            let req = self
                .http
                .put(self.url(&upload_path(upload_id)))
                .header(AUTH_TOKEN_HEADER, token)
                .json(request);
            self.execute(req).await
        })
    }
}
