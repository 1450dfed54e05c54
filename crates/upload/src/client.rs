//! Client facade that builds uploads against one server.

use std::path::Path;
use std::sync::Arc;

use strongbox_transfer::UploadSettings;

use crate::buffered::{FileUpload, UploadSource};
use crate::config::ClientConfig;
use crate::error::UploadError;
use crate::http::HttpTransport;
use crate::request::FileUploadRequest;
use crate::stream::StreamUpload;
use crate::transport::{StaticToken, TokenProvider, UploadTransport};

/// Entry point for uploads against one server.
#[derive(Clone)]
pub struct UploadClient {
    transport: Arc<dyn UploadTransport>,
    tokens: Arc<dyn TokenProvider>,
    settings: UploadSettings,
}

impl UploadClient {
    pub fn new(
        transport: Arc<dyn UploadTransport>,
        tokens: Arc<dyn TokenProvider>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            transport,
            tokens,
            settings,
        }
    }

    /// Builds an HTTP client with a static token from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, UploadError> {
        if config.server_url.is_empty() {
            return Err(UploadError::InvalidRequest("server URL is not configured".into()));
        }
        config.upload.validate()?;
        let transport = HttpTransport::new(config.server_url.clone(), config.request_timeout())?;
        Ok(Self::new(
            Arc::new(transport),
            Arc::new(StaticToken::new(config.auth_token.clone())),
            config.upload.clone(),
        ))
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Prepares a buffered upload of `length` bytes from `source`.
    ///
    /// Nothing is sent until the returned upload is started or run.
    pub fn file_upload(
        &self,
        id: impl Into<String>,
        request: FileUploadRequest,
        source: UploadSource,
        length: u64,
    ) -> Result<FileUpload, UploadError> {
        request.validate()?;
        self.settings.validate()?;
        Ok(FileUpload::new(
            id,
            request,
            source,
            length,
            Arc::clone(&self.transport),
            Arc::clone(&self.tokens),
            self.settings.clone(),
        ))
    }

    /// Prepares a buffered upload of the file at `path`, using its current size.
    pub async fn file_upload_from_path(
        &self,
        id: impl Into<String>,
        request: FileUploadRequest,
        path: &Path,
    ) -> Result<FileUpload, UploadError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(UploadError::LocalSource)?;
        let length = file
            .metadata()
            .await
            .map_err(UploadError::LocalSource)?
            .len();
        self.file_upload(id, request, Box::new(file), length)
    }

    /// Opens a streaming upload.
    pub async fn open_stream(
        &self,
        request: FileUploadRequest,
    ) -> Result<StreamUpload, UploadError> {
        StreamUpload::open(
            Arc::clone(&self.transport),
            Arc::clone(&self.tokens),
            request,
            &self.settings,
        )
        .await
    }
}

impl std::fmt::Debug for UploadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
