//! Chunked upload mechanics shared by the upload drivers.
//!
//! - [`Chunk`]: one immutable byte range of the source
//! - [`ChunkBody`]: a chunk's bytes split into write blocks with a
//!   per-block progress hook
//! - [`UploadState`] / [`StateCell`]: the monotonic upload lifecycle
//! - [`ProgressThrottle`]: wall-clock rate limit for progress events
//! - [`UploadSettings`]: buffer sizes and the progress interval

mod chunked;
mod progress;
mod settings;
mod types;

pub use chunked::{BlockProgress, Blocks, Chunk, ChunkBody};
pub use progress::ProgressThrottle;
pub use settings::UploadSettings;
pub use types::{StateCell, UploadState};

/// Default read buffer of the buffered driver: 2 MiB.
///
/// Each filled read buffer becomes one upload-chunk request.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 2 * 1024 * 1024;

/// Default write block: 2 KiB. Only affects progress granularity.
pub const DEFAULT_WRITE_BLOCK_SIZE: usize = 2 * 1024;

/// Default minimum gap between two "running" progress events, in milliseconds.
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 100;

/// Default chunk buffer of the streaming driver: 256 KiB.
pub const DEFAULT_STREAM_CHUNK_SIZE: usize = 256 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid upload settings: {0}")]
    InvalidSettings(String),

    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: UploadState, to: UploadState },
}
