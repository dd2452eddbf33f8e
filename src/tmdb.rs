//! TMDB metadata provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::metadata::{MediaDetails, MetadataProvider};
use crate::{ContentType, Result, ScoutError};

/// TMDB connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
        }
    }
}

/// Looks titles up through TMDB's `/find` endpoint.
pub struct Tmdb {
    config: TmdbConfig,
    client: Client,
}

impl Tmdb {
    /// Creates a client for `api_key` against the public API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(TmdbConfig {
            api_key: api_key.into(),
            ..Default::default()
        })
    }

    /// Creates with custom configuration.
    pub fn with_config(config: TmdbConfig) -> Self {
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

    fn find_url(&self, imdb_id: &str) -> Result<Url> {
        let base = format!(
            "{}/find/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(imdb_id)
        );
        Ok(Url::parse_with_params(
            &base,
            [
                ("api_key", self.config.api_key.as_str()),
                ("external_source", "imdb_id"),
            ],
        )?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<MovieResult>,
    #[serde(default)]
    tv_results: Vec<TvResult>,
}

#[derive(Debug, Deserialize)]
struct MovieResult {
    title: String,
    #[serde(default)]
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TvResult {
    name: String,
    #[serde(default)]
    first_air_date: Option<String>,
}

/// Year of a `YYYY-MM-DD` date; empty or malformed dates give `None`.
fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

impl FindResponse {
    /// Movies win over shows when an id resolves to both.
    fn into_details(self) -> Option<MediaDetails> {
        if let Some(movie) = self.movie_results.into_iter().next() {
            return Some(MediaDetails {
                year: year_of(movie.release_date.as_deref()),
                title: movie.title,
                content_type: ContentType::Movie,
            });
        }
        self.tv_results.into_iter().next().map(|show| MediaDetails {
            year: year_of(show.first_air_date.as_deref()),
            title: show.name,
            content_type: ContentType::Series,
        })
    }
}

#[async_trait]
impl MetadataProvider for Tmdb {
    fn name(&self) -> &str {
        "TMDB"
    }

    async fn lookup(&self, imdb_id: &str) -> Result<Option<MediaDetails>> {
        if self.config.api_key.is_empty() {
            return Err(ScoutError::Config("TMDB API key is not set".to_string()));
        }

        let response = self.client.get(self.find_url(imdb_id)?).send().await?;
        if !response.status().is_success() {
            return Err(ScoutError::UpstreamStatus {
                service: "TMDB".to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: FindResponse = response.json().await?;
        let details = body.into_details();
        debug!("TMDB lookup for {} found {:?}", imdb_id, details);
        Ok(details)
    }
}
