//! Streaming upload driver.
//!
//! Push-style: callers write bytes as they produce them. Bytes collect in a
//! fixed-size chunk buffer and every full buffer goes out as one chunk.
//! [`StreamUpload::close`] sends the remainder and completes the session.
//!
//! The driver runs on the caller's task and cannot be cancelled; dropping it
//! without closing leaves the server-side session unfinished.

use std::sync::Arc;

use bytes::Bytes;
use strongbox_protocol::Node;
use strongbox_transfer::{Chunk, UploadSettings};
use tracing::{debug, info};

use crate::error::{StreamError, UploadError};
use crate::request::FileUploadRequest;
use crate::session::UploadSession;
use crate::transport::{TokenProvider, UploadTransport};

/// Writer that uploads everything written to it.
#[derive(Debug)]
pub struct StreamUpload {
    session: UploadSession,
    buffer: Vec<u8>,
    chunk_size: usize,
    chunk_index: u64,
    sent: u64,
    closed: bool,
}

impl StreamUpload {
    /// Opens the upload session. Fails if the server rejects the create
    /// request.
    pub async fn open(
        transport: Arc<dyn UploadTransport>,
        tokens: Arc<dyn TokenProvider>,
        request: FileUploadRequest,
        settings: &UploadSettings,
    ) -> Result<Self, UploadError> {
        settings.validate()?;
        request.validate()?;

        let session =
            UploadSession::open(transport, tokens, request, settings.write_block_size).await?;
        info!(
            upload = %session.upload_id(),
            name = %session.request().name,
            "upload stream opened"
        );

        Ok(Self {
            session,
            buffer: Vec::with_capacity(settings.stream_chunk_size),
            chunk_size: settings.stream_chunk_size,
            chunk_index: 0,
            sent: 0,
            closed: false,
        })
    }

    pub fn upload_id(&self) -> &str {
        self.session.upload_id()
    }

    /// Bytes accepted so far, sent or buffered.
    pub fn bytes_written(&self) -> u64 {
        self.sent + self.buffer.len() as u64
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Writes all of `buf`.
    pub async fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        self.write_range(buf, 0, buf.len()).await
    }

    pub async fn write_byte(&mut self, byte: u8) -> Result<(), StreamError> {
        self.write_range(&[byte], 0, 1).await
    }

    /// Writes `len` bytes of `buf` starting at `offset`.
    ///
    /// An out-of-range request fails without touching the stream. If a chunk
    /// send fails, the bytes buffered so far are kept and the same chunk is
    /// sent again by the next write or by [`StreamUpload::close`].
    pub async fn write_range(
        &mut self,
        buf: &[u8],
        offset: usize,
        len: usize,
    ) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= buf.len())
            .ok_or(StreamError::OutOfBounds {
                offset,
                len,
                buf_len: buf.len(),
            })?;

        let mut pending = &buf[offset..end];
        while !pending.is_empty() {
            let room = self.chunk_size - self.buffer.len();
            let take = room.min(pending.len());
            self.buffer.extend_from_slice(&pending[..take]);
            pending = &pending[take..];

            if self.buffer.len() == self.chunk_size {
                self.flush_chunk().await.map_err(StreamError::Write)?;
            }
        }
        Ok(())
    }

    /// Sends any buffered bytes and completes the upload.
    ///
    /// A closed stream rejects further writes and a second close. A failed
    /// close leaves the stream open and can be retried.
    pub async fn close(&mut self) -> Result<Node, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if !self.buffer.is_empty() {
            self.flush_chunk().await.map_err(StreamError::Close)?;
        }

        let node = self.session.complete().await.map_err(StreamError::Close)?;
        self.buffer = Vec::new();
        self.closed = true;

        info!(
            upload = %self.session.upload_id(),
            node = node.id,
            chunks = self.chunk_index,
            "upload stream closed"
        );
        Ok(node)
    }

    /// Sends the buffer as the next chunk. The buffer and chunk index only
    /// move on once the server accepted it.
    async fn flush_chunk(&mut self) -> Result<(), UploadError> {
        let offset = self.sent;
        debug!(
            upload = %self.session.upload_id(),
            chunk = self.chunk_index,
            offset,
            "flushing chunk"
        );

        let data = Bytes::copy_from_slice(&self.buffer);
        self.session.send_chunk(Chunk::new(offset, data), None).await?;
        self.sent += self.buffer.len() as u64;
        self.buffer.clear();
        self.chunk_index += 1;
        Ok(())
    }
}
