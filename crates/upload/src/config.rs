//! Client configuration.
//!
//! Stored as JSON; every field is optional on disk and falls back to its
//! default. `STRONGBOX_SERVER_URL` and `STRONGBOX_AUTH_TOKEN` override the
//! file when set.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strongbox_transfer::UploadSettings;

/// Environment variable overriding [`ClientConfig::server_url`].
pub const ENV_SERVER_URL: &str = "STRONGBOX_SERVER_URL";

/// Environment variable overriding [`ClientConfig::auth_token`].
pub const ENV_AUTH_TOKEN: &str = "STRONGBOX_AUTH_TOKEN";

/// Errors reading or writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL of the server, without the API path.
    pub server_url: String,

    /// Pre-issued authorization token.
    pub auth_token: String,

    /// Per-request timeout in seconds; 0 disables it.
    pub request_timeout_secs: u64,

    pub upload: UploadSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            auth_token: String::new(),
            request_timeout_secs: 300,
            upload: UploadSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Loads the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes the config to `path` as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Applies the environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_SERVER_URL).ok(),
            std::env::var(ENV_AUTH_TOKEN).ok(),
        );
    }

    fn apply_overrides(&mut self, server_url: Option<String>, auth_token: Option<String>) {
        if let Some(url) = server_url.filter(|v| !v.is_empty()) {
            self.server_url = url;
        }
        if let Some(token) = auth_token.filter(|v| !v.is_empty()) {
            self.auth_token = token;
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = ClientConfig {
            server_url: "https://files.example.com".into(),
            auth_token: "abc".into(),
            request_timeout_secs: 0,
            ..Default::default()
        };
        config.upload.read_buffer_size = 4096;
        config.save(&path).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.request_timeout(), None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"serverUrl":"https://x","upload":{"streamChunkSize":1024}}"#)
            .unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.server_url, "https://x");
        assert_eq!(config.upload.stream_chunk_size, 1024);
        assert_eq!(config.upload.write_block_size, 2048);
        assert_eq!(config.request_timeout_secs, 300);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(ClientConfig::load(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn overrides_replace_non_empty_values_only() {
        let mut config = ClientConfig {
            server_url: "https://file".into(),
            auth_token: "file-token".into(),
            ..Default::default()
        };
        config.apply_overrides(Some("https://env".into()), Some(String::new()));
        assert_eq!(config.server_url, "https://env");
        assert_eq!(config.auth_token, "file-token");
    }
}
