// ============================================================
// CONFIGURATION
// ============================================================
// Layered settings: defaults, optional csvforge.toml, CSVFORGE_* env

use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory that holds one subdirectory per project.
    pub workspace_dir: PathBuf,
    /// Timeout for downloading a remote CSV, in seconds.
    pub download_timeout_secs: u64,
    /// Rows per page when browsing a materialized table.
    pub page_size: i64,
    /// Command used to execute a generated pipeline script.
    pub interpreter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from("projects"),
            download_timeout_secs: 60,
            page_size: 100,
            interpreter: "jv".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("csvforge.toml"))
            .merge(Env::prefixed("CSVFORGE_"))
            .extract()
            .map_err(|e| AppError::Internal(format!("Invalid configuration: {}", e)))
    }
}
