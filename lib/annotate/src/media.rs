//! Download of media files referenced by object metadata.

use crate::client::{REQUEST_TIMEOUT, USER_AGENT};
use crosstopic_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fetches media files by identifier from a repository base URL.
pub struct MediaDownloader {
    http: reqwest::Client,
}

impl MediaDownloader {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { http })
    }

    /// Downloads one media file into `target_dir`.
    ///
    /// The URL is the base URL with the media id appended, and the file is
    /// named after the media id with `extension` (dot included) attached.
    pub async fn download(
        &self,
        base_url: &str,
        media_id: &str,
        extension: &str,
        target_dir: &Path,
    ) -> Result<PathBuf> {
        fs::create_dir_all(target_dir)?;
        let url = format!("{base_url}{media_id}");
        info!(url = %url, "downloading media file");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "media download from {} failed with status {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let path = target_dir.join(format!("{media_id}{extension}"));
        fs::write(&path, &bytes)?;
        info!(path = %path.display(), size = bytes.len(), "media file written");
        Ok(path)
    }
}
