//! Top-level configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregator::AggregatorConfig;
use crate::availability::AvailabilityConfig;
use crate::cache::CacheConfig;
use crate::premiumize::PremiumizeConfig;
use crate::tmdb::TmdbConfig;
use crate::{Result, ScoutError, SourceConfig};

/// Result-count limits applied by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Matched records sent to availability checks.
    #[serde(default = "default_max_streams")]
    pub max_streams: usize,
    /// Unfiltered records kept for movies when matching rejects everything.
    #[serde(default = "default_movie_fallback")]
    pub movie_fallback: usize,
    /// Unfiltered records kept for series when matching rejects everything.
    #[serde(default = "default_series_fallback")]
    pub series_fallback: usize,
    /// Hits returned by a plain search.
    #[serde(default = "default_search_results")]
    pub search_results: usize,
}

fn default_max_streams() -> usize {
    25
}

fn default_movie_fallback() -> usize {
    15
}

fn default_series_fallback() -> usize {
    10
}

fn default_search_results() -> usize {
    50
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_streams: default_max_streams(),
            movie_fallback: default_movie_fallback(),
            series_fallback: default_series_fallback(),
            search_results: default_search_results(),
        }
    }
}

/// Complete configuration, loadable from JSON. Every field has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub aggregation: AggregatorConfig,
    #[serde(default)]
    pub availability: AvailabilityConfig,
    #[serde(default)]
    pub premiumize: PremiumizeConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub limits: Limits,
}

impl ScoutConfig {
    /// Reads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .map_err(|e| ScoutError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&data)
    }

    /// Parses a JSON configuration document.
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| ScoutError::Config(e.to_string()))
    }

    /// Sets the TMDB API key.
    pub fn with_tmdb_key(mut self, key: impl Into<String>) -> Self {
        self.tmdb.api_key = key.into();
        self
    }

    /// Sets the Premiumize API key.
    pub fn with_premiumize_key(mut self, key: impl Into<String>) -> Self {
        self.premiumize.api_key = key.into();
        self
    }
}
