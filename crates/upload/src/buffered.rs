//! Buffered upload driver.
//!
//! Reads a bounded-length source into fixed-size buffers and sends each
//! filled buffer as one chunk. Runs either on a spawned task
//! ([`FileUpload::start`]) or inline ([`FileUpload::run`]).

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use strongbox_protocol::Node;
use strongbox_transfer::{Chunk, StateCell, UploadSettings, UploadState};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::callback::{CallbackRegistry, ProgressNotifier, UploadCallback};
use crate::error::UploadError;
use crate::request::FileUploadRequest;
use crate::session::UploadSession;
use crate::transport::{TokenProvider, UploadTransport};

/// Byte source of a buffered upload.
pub type UploadSource = Box<dyn AsyncRead + Send + Unpin>;

/// Uploads a source of known length.
pub struct FileUpload {
    id: String,
    request: FileUploadRequest,
    source: UploadSource,
    length: u64,
    transport: Arc<dyn UploadTransport>,
    tokens: Arc<dyn TokenProvider>,
    settings: UploadSettings,
    callbacks: Arc<CallbackRegistry>,
    cancel: CancellationToken,
    state: Arc<StateCell>,
}

impl FileUpload {
    /// Prepares an upload of `length` bytes from `source`.
    ///
    /// `id` is the caller's handle for this upload and is echoed in every
    /// callback.
    pub fn new(
        id: impl Into<String>,
        request: FileUploadRequest,
        source: UploadSource,
        length: u64,
        transport: Arc<dyn UploadTransport>,
        tokens: Arc<dyn TokenProvider>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            id: id.into(),
            request,
            source,
            length,
            transport,
            tokens,
            settings,
            callbacks: Arc::new(CallbackRegistry::new()),
            cancel: CancellationToken::new(),
            state: Arc::new(StateCell::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_callback(&self, callback: Arc<dyn UploadCallback>) {
        self.callbacks.add(callback);
    }

    pub fn remove_callback(&self, callback: &Arc<dyn UploadCallback>) -> bool {
        self.callbacks.remove(callback)
    }

    /// Token that cancels this upload.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> UploadState {
        self.state.get()
    }

    /// Runs the upload on a background task.
    ///
    /// The outcome is reported through callbacks only.
    pub fn start(self) -> UploadHandle {
        let id = self.id.clone();
        let cancel = self.cancel.clone();
        let state = Arc::clone(&self.state);
        let callbacks = Arc::clone(&self.callbacks);
        let task = tokio::spawn(async move {
            let _ = self.execute().await;
        });
        UploadHandle {
            id,
            cancel,
            state,
            callbacks,
            task,
        }
    }

    /// Runs the upload to completion on the current task.
    ///
    /// Returns the created node, or `None` if the upload was cancelled.
    /// Callbacks fire exactly as for [`FileUpload::start`].
    pub async fn run(self) -> Result<Option<Node>, UploadError> {
        match self.execute().await {
            Ok(node) => Ok(Some(node)),
            Err(UploadError::Cancelled) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn execute(mut self) -> Result<Node, UploadError> {
        info!(upload = %self.id, name = %self.request.name, bytes = self.length, "upload started");
        self.transition(UploadState::Running);
        self.callbacks.started(&self.id);

        match self.upload().await {
            Ok(node) => {
                self.transition(UploadState::Completed);
                info!(upload = %self.id, node = node.id, "upload finished");
                self.callbacks.finished(&self.id, &node);
                Ok(node)
            }
            Err(e) if self.cancel.is_cancelled() && e.is_interruptible() => {
                if !matches!(e, UploadError::Cancelled) {
                    warn!(
                        upload = %self.id,
                        error = %e,
                        "failure during cancellation, treating as cancelled"
                    );
                }
                self.transition(UploadState::Canceled);
                info!(upload = %self.id, "upload cancelled");
                self.callbacks.canceled(&self.id);
                Err(UploadError::Cancelled)
            }
            Err(e) => {
                self.transition(UploadState::Failed);
                warn!(upload = %self.id, error = %e, "upload failed");
                self.callbacks.failed(&self.id, &e);
                Err(e)
            }
        }
    }

    async fn upload(&mut self) -> Result<Node, UploadError> {
        self.settings.validate()?;
        self.request.validate()?;
        self.check_cancelled()?;

        let session = UploadSession::open(
            Arc::clone(&self.transport),
            Arc::clone(&self.tokens),
            self.request.clone(),
            self.settings.write_block_size,
        )
        .await?;

        let notifier = Arc::new(ProgressNotifier::new(
            self.id.clone(),
            self.length,
            self.settings.progress_interval(),
            Arc::clone(&self.callbacks),
            self.cancel.clone(),
        ));

        let mut offset = 0u64;
        loop {
            let want = (self.length - offset).min(self.settings.read_buffer_size as u64) as usize;
            let mut buf = vec![0u8; want];
            let read = read_full(&mut self.source, &mut buf)
                .await
                .map_err(UploadError::LocalSource)?;
            self.check_cancelled()?;

            if read < want {
                return Err(UploadError::LocalSource(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "source ended after {} of {} bytes",
                        offset + read as u64,
                        self.length
                    ),
                )));
            }
            if read == 0 {
                break;
            }

            buf.truncate(read);
            let chunk = Chunk::new(offset, Bytes::from(buf));
            session
                .send_chunk(chunk, Some(notifier.block_hook(offset)))
                .await?;
            offset += read as u64;
            self.check_cancelled()?;
        }

        debug!(upload = %self.id, bytes = offset, "all chunks sent");
        self.transition(UploadState::Completing);
        session.complete().await
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn transition(&self, next: UploadState) {
        if let Err(e) = self.state.advance(next) {
            warn!(upload = %self.id, error = %e, "ignoring state change");
        }
    }
}

/// Reads until `buf` is full or the source is exhausted.
async fn read_full(source: &mut UploadSource, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("length", &self.length)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

/// Handle to a buffered upload running on a background task.
pub struct UploadHandle {
    id: String,
    cancel: CancellationToken,
    state: Arc<StateCell>,
    callbacks: Arc<CallbackRegistry>,
    task: JoinHandle<()>,
}

impl UploadHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Requests cancellation. Takes effect at the next read or chunk boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn state(&self) -> UploadState {
        self.state.get()
    }

    pub fn add_callback(&self, callback: Arc<dyn UploadCallback>) {
        self.callbacks.add(callback);
    }

    pub fn remove_callback(&self, callback: &Arc<dyn UploadCallback>) -> bool {
        self.callbacks.remove(callback)
    }

    /// Waits for the task to end and returns the final state.
    pub async fn wait(self) -> UploadState {
        if let Err(e) = self.task.await {
            warn!(upload = %self.id, error = %e, "upload task ended abnormally");
        }
        self.state.get()
    }
}
