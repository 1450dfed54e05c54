use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_PROGRESS_INTERVAL_MS, DEFAULT_READ_BUFFER_SIZE, DEFAULT_STREAM_CHUNK_SIZE,
    DEFAULT_WRITE_BLOCK_SIZE, TransferError,
};

/// Buffer sizes and progress pacing for both upload drivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadSettings {
    /// Bytes read from the source per upload-chunk request (buffered driver).
    pub read_buffer_size: usize,
    /// Bytes per write block inside a chunk body.
    pub write_block_size: usize,
    /// Minimum gap between "running" events, in milliseconds.
    pub progress_interval_ms: u64,
    /// Chunk buffer of the streaming driver.
    pub stream_chunk_size: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            write_block_size: DEFAULT_WRITE_BLOCK_SIZE,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
            stream_chunk_size: DEFAULT_STREAM_CHUNK_SIZE,
        }
    }
}

impl UploadSettings {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Rejects zero sizes and a write block larger than the read buffer.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.read_buffer_size == 0 {
            return Err(TransferError::InvalidSettings(
                "read buffer size must be greater than 0".into(),
            ));
        }
        if self.write_block_size == 0 {
            return Err(TransferError::InvalidSettings(
                "write block size must be greater than 0".into(),
            ));
        }
        if self.write_block_size > self.read_buffer_size {
            return Err(TransferError::InvalidSettings(format!(
                "write block size {} exceeds read buffer size {}",
                self.write_block_size, self.read_buffer_size
            )));
        }
        if self.stream_chunk_size == 0 {
            return Err(TransferError::InvalidSettings(
                "stream chunk size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_sizes() {
        let s = UploadSettings::default();
        assert_eq!(s.read_buffer_size, 2_097_152);
        assert_eq!(s.write_block_size, 2048);
        assert_eq!(s.progress_interval(), Duration::from_millis(100));
        assert_eq!(s.stream_chunk_size, 262_144);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_sizes() {
        let mut s = UploadSettings {
            read_buffer_size: 0,
            ..Default::default()
        };
        assert!(s.validate().is_err());

        s.read_buffer_size = 1024;
        s.write_block_size = 4096;
        assert!(s.validate().is_err());

        s.write_block_size = 512;
        s.stream_chunk_size = 0;
        assert!(s.validate().is_err());

        s.stream_chunk_size = 1;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s: UploadSettings = serde_json::from_str(r#"{"progressIntervalMs":250}"#).unwrap();
        assert_eq!(s.progress_interval_ms, 250);
        assert_eq!(s.read_buffer_size, 2_097_152);
    }
}
