//! Recording transport shared by the unit tests.

use std::sync::Mutex;

use strongbox_protocol::{CompleteFileUploadRequest, CreateFileUploadRequest};
use strongbox_transfer::ChunkBody;

use crate::error::TransportError;
use crate::transport::{ApiResponse, TransportFuture, UploadTransport};

type Reply = Result<ApiResponse, TransportError>;

/// One recorded chunk request.
#[derive(Debug, Clone)]
pub(crate) struct ChunkCall {
    pub upload_id: String,
    pub file_name: String,
    pub content_range: String,
    pub data: Vec<u8>,
    pub blocks: usize,
}

#[derive(Debug, Clone)]
pub(crate) enum Call {
    Create(CreateFileUploadRequest),
    Chunk(ChunkCall),
    Complete {
        upload_id: String,
        request: CompleteFileUploadRequest,
    },
}

/// Mock transport that records requests and answers like a healthy server
/// unless told otherwise.
#[derive(Default)]
pub(crate) struct MockTransport {
    calls: Mutex<Vec<Call>>,
    tokens: Mutex<Vec<String>>,
    create_reply: Mutex<Option<Reply>>,
    chunk_failure: Mutex<Option<(usize, Reply)>>,
    complete_reply: Mutex<Option<Reply>>,
    on_chunk: Mutex<Option<Box<dyn Fn(usize) + Send + Sync>>>,
}

impl MockTransport {
    pub const UPLOAD_ID: &'static str = "upload-1";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(&self, reply: Reply) {
        *self.create_reply.lock().unwrap() = Some(reply);
    }

    /// Answers the chunk request with index `index` (0-based) with `reply`.
    pub fn fail_chunk(&self, index: usize, reply: Reply) {
        *self.chunk_failure.lock().unwrap() = Some((index, reply));
    }

    pub fn fail_complete(&self, reply: Reply) {
        *self.complete_reply.lock().unwrap() = Some(reply);
    }

    /// Runs `hook` with the chunk index after each chunk body is consumed.
    pub fn on_chunk(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        *self.on_chunk.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn chunks(&self) -> Vec<ChunkCall> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Chunk(chunk) => Some(chunk),
                _ => None,
            })
            .collect()
    }

    pub fn ranges(&self) -> Vec<String> {
        self.chunks().into_iter().map(|c| c.content_range).collect()
    }

    /// Concatenation of every chunk body, in send order.
    pub fn uploaded(&self) -> Vec<u8> {
        self.chunks().into_iter().flat_map(|c| c.data).collect()
    }

    pub fn create_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Create(_)))
    }

    pub fn complete_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Complete { .. }))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn node_json(name: &str, size: usize) -> Vec<u8> {
        serde_json::json!({
            "id": 42,
            "type": "file",
            "name": name,
            "parentId": 7,
            "size": size,
        })
        .to_string()
        .into_bytes()
    }
}

impl UploadTransport for MockTransport {
    fn create_upload<'a>(
        &'a self,
        token: &'a str,
        request: &'a CreateFileUploadRequest,
    ) -> TransportFuture<'a, ApiResponse> {
        self.tokens.lock().unwrap().push(token.to_string());
        self.calls.lock().unwrap().push(Call::Create(request.clone()));
        let reply = self.create_reply.lock().unwrap().take().unwrap_or_else(|| {
            Ok(ApiResponse::new(
                201,
                format!(r#"{{"uploadId":"{}"}}"#, Self::UPLOAD_ID).into_bytes(),
            ))
        });
        Box::pin(async move { reply })
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
            self.tokens.lock().unwrap().push(token.to_string());
            let mut data = Vec::with_capacity(body.len() as usize);
            let mut blocks = 0;
            for block in body.into_blocks() {
                data.extend_from_slice(&block);
                blocks += 1;
            }

            let index = {
                let mut calls = self.calls.lock().unwrap();
                let index = calls.iter().filter(|c| matches!(c, Call::Chunk(_))).count();
                calls.push(Call::Chunk(ChunkCall {
                    upload_id: upload_id.to_string(),
                    file_name: file_name.to_string(),
                    content_range,
                    data,
                    blocks,
                }));
                index
            };

            if let Some(hook) = self.on_chunk.lock().unwrap().as_ref() {
                hook(index);
            }

            let mut failure = self.chunk_failure.lock().unwrap();
            if failure.as_ref().is_some_and(|(at, _)| *at == index)
                && let Some((_, reply)) = failure.take()
            {
                return reply;
            }
            Ok(ApiResponse::new(200, Vec::new()))
        })
    }

    fn complete_upload<'a>(
        &'a self,
        token: &'a str,
        upload_id: &'a str,
        request: &'a CompleteFileUploadRequest,
    ) -> TransportFuture<'a, ApiResponse> {
        self.tokens.lock().unwrap().push(token.to_string());
        let size = self.uploaded().len();
        self.calls.lock().unwrap().push(Call::Complete {
            upload_id: upload_id.to_string(),
            request: request.clone(),
        });
        let reply = self.complete_reply.lock().unwrap().take().unwrap_or_else(|| {
            Ok(ApiResponse::new(200, Self::node_json(&request.file_name, size)))
        });
        Box::pin(async move { reply })
    }
}
