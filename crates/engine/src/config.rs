//! Application configuration loaded from `formforge.toml`.
//!
//! ```toml
//! [database]
//! path = "formforge.db"
//!
//! [document_service]
//! url = "http://127.0.0.1:8000/"
//! timeout_secs = 30
//! ```
//!
//! Environment variables take precedence over the file: `FORMFORGE_DB`
//! replaces `database.path` and `FORMFORGE_DFS_URL` replaces
//! `document_service.url`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;

pub const DEFAULT_CONFIG_FILE: &str = "formforge.toml";
pub const DB_ENV: &str = "FORMFORGE_DB";
pub const DFS_URL_ENV: &str = "FORMFORGE_DFS_URL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,
    pub document_service: DocumentServiceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("formforge.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentServiceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for DocumentServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/".to_string(),
            timeout_secs: 30,
        }
    }
}

impl DocumentServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Read `path` if it exists, fall back to defaults otherwise, then apply
    /// environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], with overrides taken from `lookup`.
    pub fn load_with(
        path: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            debug!(path = %path.display(), "reading config file");
            Self::from_toml_file(path)?
        } else {
            debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };
        config.apply_overrides(lookup);

        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(EngineError::Config(errors.join("; ")))
        }
    }

    /// Replace settings from `lookup`, which maps a variable name to its
    /// value. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup(DB_ENV).filter(|v| !v.is_empty()) {
            self.database.path = PathBuf::from(db);
        }
        if let Some(url) = lookup(DFS_URL_ENV).filter(|v| !v.is_empty()) {
            self.document_service.url = url;
        }
    }

    /// Returns every problem found; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.database.path.as_os_str().is_empty() {
            errors.push("database.path must not be empty".into());
        }

        let url = &self.document_service.url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!(
                "document_service.url must start with http:// or https://, got '{url}'"
            ));
        }

        if self.document_service.timeout_secs == 0 {
            errors.push("document_service.timeout_secs must be > 0".into());
        }

        errors
    }
}
