//! Server-side upload session: create, chunk and complete requests.

use std::sync::Arc;

use strongbox_protocol::{FileUploadResponse, Node, ProtocolError, UploadPhase};
use strongbox_transfer::{BlockProgress, Chunk};
use tracing::debug;

use crate::error::UploadError;
use crate::request::FileUploadRequest;
use crate::transmitter::{ChunkTransmitter, check_status};
use crate::transport::{TokenProvider, UploadTransport};

/// An open upload session on the server.
///
/// Created by [`UploadSession::open`]; chunks are then sent in increasing
/// offset order and [`UploadSession::complete`] turns them into a node.
pub struct UploadSession {
    upload_id: String,
    request: FileUploadRequest,
    transport: Arc<dyn UploadTransport>,
    tokens: Arc<dyn TokenProvider>,
    transmitter: ChunkTransmitter,
}

impl UploadSession {
    /// Issues the create request and returns the open session.
    pub async fn open(
        transport: Arc<dyn UploadTransport>,
        tokens: Arc<dyn TokenProvider>,
        request: FileUploadRequest,
        write_block_size: usize,
    ) -> Result<Self, UploadError> {
        let body = request.to_create_request();
        let token = tokens.access_token().await?;
        let resp = transport.create_upload(&token, &body).await?;
        let resp = check_status(UploadPhase::Create, resp)?;

        if resp.body.is_empty() {
            return Err(ProtocolError::EmptyBody(UploadPhase::Create).into());
        }
        let created: FileUploadResponse =
            serde_json::from_slice(&resp.body).map_err(ProtocolError::from)?;

        debug!(
            upload = %created.upload_id,
            parent = request.parent_id,
            name = %request.name,
            "upload session created"
        );

        let transmitter =
            ChunkTransmitter::new(Arc::clone(&transport), Arc::clone(&tokens), write_block_size);

        Ok(Self {
            upload_id: created.upload_id,
            request,
            transport,
            tokens,
            transmitter,
        })
    }

    /// Server-assigned session id.
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn request(&self) -> &FileUploadRequest {
        &self.request
    }

    /// Sends one chunk of the file.
    pub async fn send_chunk(
        &self,
        chunk: Chunk,
        progress: Option<BlockProgress>,
    ) -> Result<(), UploadError> {
        self.transmitter
            .send(&self.upload_id, &self.request.name, chunk, progress)
            .await
    }

    /// Finalizes the session and returns the created node.
    pub async fn complete(&self) -> Result<Node, UploadError> {
        let body = self.request.to_complete_request();
        let token = self.tokens.access_token().await?;
        let resp = self
            .transport
            .complete_upload(&token, &self.upload_id, &body)
            .await?;
        let resp = check_status(UploadPhase::Complete, resp)?;

        if resp.body.is_empty() {
            return Err(ProtocolError::EmptyBody(UploadPhase::Complete).into());
        }
        let node: Node = serde_json::from_slice(&resp.body).map_err(ProtocolError::from)?;

        debug!(upload = %self.upload_id, node = node.id, "upload session completed");
        Ok(node)
    }
}

impl std::fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSession")
            .field("upload_id", &self.upload_id)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}
