//! Premiumize.me availability backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::availability::AvailabilityBackend;
use crate::{Result, ScoutError};

const SERVICE: &str = "Premiumize";

/// File extensions accepted as playable video.
const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v"];

/// Connection settings for the Premiumize API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumizeConfig {
    /// API root, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Customer API key. A `pr=` prefix is accepted and stripped.
    #[serde(default)]
    pub api_key: String,
}

fn default_base_url() -> String {
    "https://www.premiumize.me/api".to_string()
}

impl Default for PremiumizeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
        }
    }
}

/// Strips the optional `pr=` prefix some clients store keys with.
pub fn normalize_api_key(key: &str) -> String {
    let key = key.trim();
    key.strip_prefix("pr=").unwrap_or(key).to_string()
}

/// Premiumize client implementing [`AvailabilityBackend`].
pub struct Premiumize {
    config: PremiumizeConfig,
    client: Client,
}

impl Premiumize {
    /// Creates a client for `api_key` against the public API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(PremiumizeConfig {
            api_key: api_key.into(),
            ..Default::default()
        })
    }

    /// Creates with custom configuration.
    pub fn with_config(config: PremiumizeConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Replaces the HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn api_key(&self) -> Result<String> {
        let key = normalize_api_key(&self.config.api_key);
        if key.is_empty() {
            return Err(ScoutError::Config("Premiumize API key is not set".to_string()));
        }
        Ok(key)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Builds the cache-check URL for one batch.
    fn cache_check_url(&self, hashes: &[String], api_key: &str) -> Result<Url> {
        let params = hashes
            .iter()
            .map(|hash| ("items[]", hash.as_str()))
            .chain(std::iter::once(("apikey", api_key)));
        Ok(Url::parse_with_params(&self.endpoint("cache/check"), params)?)
    }
}

#[derive(Debug, Deserialize)]
struct CacheCheckResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    response: Vec<bool>,
}

#[derive(Debug, Deserialize)]
struct DirectDownloadResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    content: Vec<TransferFile>,
}

/// One file of a resolved transfer.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferFile {
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub stream_link: Option<String>,
}

impl TransferFile {
    fn is_video(&self) -> bool {
        self.path
            .rsplit_once('.')
            .map(|(_, ext)| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Preferred playable link: the stream link, else the download link.
    pub fn playable_link(&self) -> Option<&str> {
        self.stream_link
            .as_deref()
            .filter(|link| !link.is_empty())
            .or_else(|| self.link.as_deref().filter(|link| !link.is_empty()))
    }
}

/// Picks the largest file with a known video container extension.
pub fn find_best_video_file(files: &[TransferFile]) -> Option<&TransferFile> {
    files
        .iter()
        .filter(|file| file.is_video())
        .reduce(|best, file| if file.size > best.size { file } else { best })
}

fn backend_failure(message: Option<String>, status: &str) -> ScoutError {
    ScoutError::backend(SERVICE, message.unwrap_or_else(|| format!("status {}", status)))
}

#[async_trait]
impl AvailabilityBackend for Premiumize {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn check_cached(&self, hashes: &[String]) -> Result<Vec<bool>> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self.api_key()?;
        let url = self.cache_check_url(hashes, &api_key)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ScoutError::UpstreamStatus {
                service: SERVICE.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: CacheCheckResponse = response.json().await?;
        if body.status != "success" {
            return Err(backend_failure(body.message, &body.status));
        }
        Ok(body.response)
    }

    async fn resolve_stream(&self, magnet: &str) -> Result<String> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .post(self.endpoint("transfer/directdl"))
            .form(&[("src", magnet), ("apikey", api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScoutError::UpstreamStatus {
                service: SERVICE.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: DirectDownloadResponse = response.json().await?;
        if body.status == "error" {
            return Err(backend_failure(body.message, &body.status));
        }

        find_best_video_file(&body.content)
            .and_then(TransferFile::playable_link)
            .map(str::to_string)
            .ok_or(ScoutError::NoVideoFile)
    }
}
