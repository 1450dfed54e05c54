//! Single-chunk transmission and response status checks.

use std::sync::Arc;

use strongbox_protocol::{UploadPhase, parse_api_error};
use strongbox_transfer::{BlockProgress, Chunk, ChunkBody};
use tracing::debug;

use crate::error::UploadError;
use crate::transport::{ApiResponse, TokenProvider, UploadTransport};

/// Sends single chunks against an open upload session.
///
/// One request per chunk, strictly sequential. The chunk body is handed to
/// the transport in write blocks of `block_size` bytes.
#[derive(Clone)]
pub struct ChunkTransmitter {
    transport: Arc<dyn UploadTransport>,
    tokens: Arc<dyn TokenProvider>,
    block_size: usize,
}

impl ChunkTransmitter {
    pub fn new(
        transport: Arc<dyn UploadTransport>,
        tokens: Arc<dyn TokenProvider>,
        block_size: usize,
    ) -> Self {
        Self {
            transport,
            tokens,
            block_size,
        }
    }

    /// Transmits `chunk` for `upload_id`. Empty chunks are skipped.
    pub async fn send(
        &self,
        upload_id: &str,
        file_name: &str,
        chunk: Chunk,
        progress: Option<BlockProgress>,
    ) -> Result<(), UploadError> {
        if chunk.is_empty() {
            return Ok(());
        }

        let content_range = chunk.content_range();
        debug!(
            upload = %upload_id,
            offset = chunk.offset(),
            len = chunk.len(),
            "sending chunk"
        );

        let mut body = ChunkBody::new(chunk.data().clone(), self.block_size);
        if let Some(progress) = progress {
            body = body.with_progress(progress);
        }

        let token = self.tokens.access_token().await?;
        let resp = self
            .transport
            .upload_chunk(&token, upload_id, file_name, content_range, body)
            .await?;

        check_status(UploadPhase::UploadChunk, resp).map(|_| ())
    }
}

/// Maps a non-success response to a phase-tagged API error.
pub(crate) fn check_status(
    phase: UploadPhase,
    resp: ApiResponse,
) -> Result<ApiResponse, UploadError> {
    if resp.is_success() {
        return Ok(resp);
    }
    let code = parse_api_error(phase, resp.status, &resp.body);
    debug!(%phase, status = resp.status, %code, "request rejected");
    Err(UploadError::Api { phase, code })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use crate::transport::StaticToken;
    use bytes::Bytes;
    use std::sync::Mutex;
    use strongbox_protocol::ApiErrorCode;

    fn transmitter(mock: &Arc<MockTransport>, block_size: usize) -> ChunkTransmitter {
        ChunkTransmitter::new(mock.clone(), Arc::new(StaticToken::new("tok")), block_size)
    }

    #[tokio::test]
    async fn sends_range_and_bytes() {
        let mock = Arc::new(MockTransport::new());
        let tx = transmitter(&mock, 4);

        tx.send("up-1", "a.bin", Chunk::new(10, Bytes::from_static(b"abcdef")), None)
            .await
            .unwrap();

        let chunks = mock.chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].upload_id, "up-1");
        assert_eq!(chunks[0].file_name, "a.bin");
        assert_eq!(chunks[0].content_range, "bytes 10-16/*");
        assert_eq!(chunks[0].data, b"abcdef");
        assert_eq!(chunks[0].blocks, 2);
        assert_eq!(mock.tokens_seen(), vec!["tok"]);
    }

    #[tokio::test]
    async fn empty_chunk_is_not_sent() {
        let mock = Arc::new(MockTransport::new());
        let tx = transmitter(&mock, 2048);

        tx.send("up-1", "a.bin", Chunk::new(0, Bytes::new()), None)
            .await
            .unwrap();

        assert!(mock.chunks().is_empty());
    }

    #[tokio::test]
    async fn progress_hook_sees_each_block() {
        let mock = Arc::new(MockTransport::new());
        let tx = transmitter(&mock, 3);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);

        tx.send(
            "up-1",
            "a.bin",
            Chunk::new(0, Bytes::from_static(b"1234567")),
            Some(Arc::new(move |n| s.lock().unwrap().push(n))),
        )
        .await
        .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![3, 6, 7]);
    }

    #[tokio::test]
    async fn rejected_chunk_maps_to_range_error() {
        let mock = Arc::new(MockTransport::new());
        mock.fail_chunk(0, Ok(ApiResponse::new(416, Vec::new())));
        let tx = transmitter(&mock, 2048);

        let err = tx
            .send("up-1", "a.bin", Chunk::new(0, Bytes::from_static(b"x")), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::Api {
                phase: UploadPhase::UploadChunk,
                code: ApiErrorCode::ValidationRangeInvalid
            }
        ));
    }

    #[test]
    fn check_status_passes_success() {
        let resp =
            check_status(UploadPhase::Create, ApiResponse::new(201, b"{}".to_vec())).unwrap();
        assert_eq!(resp.status, 201);
    }
}
