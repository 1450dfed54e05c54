//! Chunked and streaming file uploads to a Strongbox node store.
//!
//! An upload opens a session on the server, sends the file as a series of
//! byte-range chunks and then completes the session, which yields the new
//! node. Two drivers sit on top of that protocol:
//!
//! - [`FileUpload`] reads a source of known length into fixed-size buffers,
//!   reports throttled progress to [`UploadCallback`]s and can be cancelled
//! - [`StreamUpload`] is written to incrementally and sends a chunk each
//!   time its buffer fills
//!
//! Both reach the server through an [`UploadTransport`] ([`HttpTransport`]
//! in production) and ask a [`TokenProvider`] for credentials on every
//! request.

pub mod buffered;
pub mod callback;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod session;
pub mod stream;
pub mod transmitter;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use buffered::{FileUpload, UploadHandle, UploadSource};
pub use callback::{CallbackRegistry, ProgressNotifier, UploadCallback, UploadEvent};
pub use client::UploadClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{StreamError, TransportError, UploadError};
pub use http::HttpTransport;
pub use request::FileUploadRequest;
pub use session::UploadSession;
pub use stream::StreamUpload;
pub use transmitter::ChunkTransmitter;
pub use transport::{
    ApiResponse, StaticToken, TokenFuture, TokenProvider, TransportFuture, UploadTransport,
};

pub use strongbox_protocol::{
    ApiErrorCode, Classification, Node, NodeType, ResolutionStrategy, UploadPhase,
};
pub use strongbox_transfer::{UploadSettings, UploadState};
