//! Listing source trait and configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{CandidateRecord, Result};

/// Configuration for a listing source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name, also used as the origin tag on records.
    #[serde(default = "default_name")]
    pub name: String,
    /// Base URL of the listing site.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds, applied by the HTTP fetcher.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Whether the source is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_name() -> String {
    "UIndex".to_string()
}

fn default_base_url() -> String {
    "https://uindex.org".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_enabled() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            base_url: default_base_url(),
            timeout: default_timeout(),
            enabled: default_enabled(),
        }
    }
}

/// A site that can be searched for candidate torrents.
///
/// Implementations issue exactly one request per call; retries and query
/// variants are the aggregator's business.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Returns the source configuration.
    fn config(&self) -> &SourceConfig;

    /// Searches the listing for one query string.
    async fn search(&self, query: &str) -> Result<Vec<CandidateRecord>>;

    /// Returns the source name.
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Returns whether the source is enabled.
    fn is_enabled(&self) -> bool {
        self.config().enabled
    }
}
