// ============================================================
// REMOTE FETCH
// ============================================================
// Validates that a URL plausibly names a CSV/text resource, then
// downloads it into the project directory with a bounded timeout

use crate::domain::error::{AppError, Result};
use chrono::Utc;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;
use url::Url;

const ACCEPTED_CONTENT_TYPES: [&str; 4] =
    ["text/csv", "application/csv", "text/plain", "application/octet-stream"];
const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// `timeout_secs` bounds the whole download.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Check via extension or content-type that the URL names a CSV/text
    /// resource. Unreachable hosts surface as [`AppError::FetchError`],
    /// wrong resource kinds as [`AppError::InvalidSource`]; callers
    /// re-prompt the user accordingly.
    pub async fn validate(&self, raw_url: &str) -> Result<Url> {
        let url = Url::parse(raw_url)
            .map_err(|e| AppError::InvalidSource(format!("\"{}\": {}", raw_url, e)))?;
        if extension_of(&url)
            .map_or(false, |ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        {
            return Ok(url);
        }
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| AppError::FetchError(format!("\"{}\" is not reachable: {}", url, e)))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if ACCEPTED_CONTENT_TYPES.iter().any(|t| content_type.starts_with(t)) {
            Ok(url)
        } else {
            Err(AppError::InvalidSource(format!(
                "\"{}\" does not look like a CSV resource (content type \"{}\")",
                url, content_type
            )))
        }
    }

    /// Download the resource into `dir` under a timestamped file name.
    /// Returns the stored file name.
    pub async fn download(&self, url: &Url, dir: &Path) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::FetchError(format!("Download failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(AppError::FetchError(format!(
                "Download failed: server answered {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::FetchError(format!("Download failed: {}", e)))?;

        let file_name = timestamped_file_name(url);
        let path: PathBuf = dir.join(&file_name);
        fs::write(&path, &bytes).await?;
        info!(url = %url, file = %file_name, size = bytes.len(), "download complete");
        Ok(file_name)
    }
}

fn extension_of(url: &Url) -> Option<String> {
    let path = url.path();
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_lowercase())
}

/// `<stem>_<yyyymmddHHMMSS>.csv`, stem derived from the URL path.
fn timestamped_file_name(url: &Url) -> String {
    let stem = url
        .path()
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .map(|n| n.rsplit_once('.').map_or(n, |(s, _)| s).to_string())
        .unwrap_or_else(|| "download".to_string());
    format!("{}_{}.csv", stem, Utc::now().format("%Y%m%d%H%M%S"))
}
