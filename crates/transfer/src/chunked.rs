use std::sync::Arc;

use bytes::Bytes;

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// One byte range of the upload source.
///
/// Chunks are immutable and must be transmitted in strictly increasing,
/// non-overlapping offset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    offset: u64,
    data: Bytes,
}

impl Chunk {
    /// Creates a chunk starting at source byte `offset`.
    pub fn new(offset: u64, data: impl Into<Bytes>) -> Self {
        Self {
            offset,
            data: data.into(),
        }
    }

    /// Bytes of the source already transmitted before this chunk.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Chunk length in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.offset + self.len()
    }

    /// Raw chunk bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// `Content-Range` header value for this chunk.
    pub fn content_range(&self) -> String {
        strongbox_protocol::content_range(self.offset, self.len())
    }
}

// ---------------------------------------------------------------------------
// ChunkBody
// ---------------------------------------------------------------------------

/// Hook invoked after each write block with the number of chunk bytes
/// handed out so far.
pub type BlockProgress = Arc<dyn Fn(u64) + Send + Sync>;

/// Request body of one chunk, yielded in write blocks.
pub struct ChunkBody {
    data: Bytes,
    block_size: usize,
    on_block: Option<BlockProgress>,
}

impl ChunkBody {
    /// Wraps `data`, to be yielded in blocks of at most `block_size` bytes.
    pub fn new(data: Bytes, block_size: usize) -> Self {
        Self {
            data,
            block_size: block_size.max(1),
            on_block: None,
        }
    }

    /// Attaches a progress hook.
    pub fn with_progress(mut self, on_block: BlockProgress) -> Self {
        self.on_block = Some(on_block);
        self
    }

    /// Body length in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the body into its write blocks.
    ///
    /// The progress hook fires as each block is taken.
    pub fn into_blocks(self) -> Blocks {
        Blocks {
            data: self.data,
            pos: 0,
            block_size: self.block_size,
            on_block: self.on_block,
        }
    }
}

impl std::fmt::Debug for ChunkBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkBody")
            .field("len", &self.data.len())
            .field("block_size", &self.block_size)
            .field("on_block", &self.on_block.is_some())
            .finish()
    }
}

/// Iterator over the write blocks of a [`ChunkBody`].
pub struct Blocks {
    data: Bytes,
    pos: usize,
    block_size: usize,
    on_block: Option<BlockProgress>,
}

impl Iterator for Blocks {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.pos >= self.data.len() {
            return None;
        }
        let end = (self.pos + self.block_size).min(self.data.len());
        let block = self.data.slice(self.pos..end);
        self.pos = end;

        if let Some(cb) = &self.on_block {
            cb(self.pos as u64);
        }
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.data.len() - self.pos).div_ceil(self.block_size);
        (remaining, Some(remaining))
    }
}
