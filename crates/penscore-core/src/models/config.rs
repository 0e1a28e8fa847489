//! Configuration structures for the server and storage layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Main configuration for penscore.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PenscoreConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// On-disk storage layout.
    pub storage: StorageConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Maximum accepted upload body in bytes.
    pub max_upload_bytes: usize,

    /// Name of the session cookie.
    pub session_cookie: String,

    /// Seconds a login stays valid.
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_bytes: 16 * 1024 * 1024,
            session_cookie: "penscore_session".to_string(),
            session_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

/// Storage locations for the database, uploads and generated reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Directory holding uploaded and processed images.
    pub upload_dir: PathBuf,

    /// Directory holding generated PDF reports.
    pub report_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("database.db"),
            upload_dir: PathBuf::from("static/uploads"),
            report_dir: PathBuf::from("static/pdf_reports"),
        }
    }
}

impl PenscoreConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PenscoreError;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: PenscoreConfig =
            serde_json::from_str(r#"{"server": {"port": 8080}}"#).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.upload_dir, PathBuf::from("static/uploads"));
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = PenscoreConfig::default();
        config.storage.report_dir = PathBuf::from("/tmp/reports");
        config.save(&path).unwrap();

        let loaded = PenscoreConfig::from_file(&path).unwrap();
        assert_eq!(loaded.storage.report_dir, PathBuf::from("/tmp/reports"));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = PenscoreConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, PenscoreError::Config(_)));

        let missing = PenscoreConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, PenscoreError::Io(_)));
    }
}
