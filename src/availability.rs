//! Debrid availability checks and direct-link resolution.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{CandidateRecord, Result};

/// A cache/unlock service that can serve torrents as direct downloads.
#[async_trait]
pub trait AvailabilityBackend: Send + Sync {
    /// Service name for logs and display text.
    fn name(&self) -> &str;

    /// Checks which info hashes are instantly available.
    ///
    /// Returns one flag per input hash, in input order.
    async fn check_cached(&self, hashes: &[String]) -> Result<Vec<bool>>;

    /// Resolves a magnet link to a direct playable URL.
    async fn resolve_stream(&self, magnet: &str) -> Result<String>;
}

/// Batching and pacing for availability checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    /// Hashes per cache-check request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between batches in milliseconds.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

fn default_batch_size() -> usize {
    99
}

fn default_batch_delay_ms() -> u64 {
    500
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

/// Outcome of availability handling for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    /// Whether a direct link is being served.
    pub cached: bool,
    /// Direct link when resolved, otherwise the magnet URI.
    pub url: String,
    /// Resolution failure, if any.
    pub error: Option<String>,
}

impl Availability {
    fn magnet(record: &CandidateRecord) -> Self {
        Self {
            cached: false,
            url: record.magnet_uri.clone(),
            error: None,
        }
    }
}

/// Batches cache checks against a backend and resolves cached items.
pub struct AvailabilityChecker<B: ?Sized> {
    backend: std::sync::Arc<B>,
    config: AvailabilityConfig,
}

impl<B: AvailabilityBackend + ?Sized> AvailabilityChecker<B> {
    /// Creates a checker with default batching.
    pub fn new(backend: std::sync::Arc<B>) -> Self {
        Self::with_config(backend, AvailabilityConfig::default())
    }

    /// Creates with custom configuration.
    pub fn with_config(backend: std::sync::Arc<B>, config: AvailabilityConfig) -> Self {
        Self { backend, config }
    }

    /// Returns the backend name.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Checks cache status of `hashes`, batch by batch.
    ///
    /// Batches run sequentially with a pause in between. A failed batch
    /// marks all of its hashes as not cached; it is not retried.
    pub async fn check(&self, hashes: &[String]) -> HashMap<String, bool> {
        let mut statuses = HashMap::with_capacity(hashes.len());
        let batch_size = self.config.batch_size.max(1);
        let delay = Duration::from_millis(self.config.batch_delay_ms);
        let batches: Vec<&[String]> = hashes.chunks(batch_size).collect();
        let total = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            match self.backend.check_cached(batch).await {
                Ok(flags) => {
                    for (position, hash) in batch.iter().enumerate() {
                        let cached = flags.get(position).copied().unwrap_or(false);
                        statuses.insert(hash.clone(), cached);
                    }
                }
                Err(e) => {
                    warn!(
                        "{} cache check failed for batch {}/{}: {}",
                        self.backend.name(),
                        index + 1,
                        total,
                        e
                    );
                    for hash in batch {
                        statuses.insert(hash.clone(), false);
                    }
                }
            }

            if index + 1 < total && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        debug!(
            "Cache check complete: {} of {} cached",
            statuses.values().filter(|cached| **cached).count(),
            hashes.len()
        );
        statuses
    }

    /// Resolves direct links for every cached record, concurrently.
    ///
    /// Returns one entry per record, in record order. A failed resolution
    /// falls back to the magnet URI with the error attached and never
    /// affects its siblings.
    pub async fn resolve(
        &self,
        records: &[CandidateRecord],
        statuses: &HashMap<String, bool>,
    ) -> Vec<Availability> {
        let futures = records.iter().map(|record| async move {
            if !statuses.get(&record.info_hash).copied().unwrap_or(false) {
                return Availability::magnet(record);
            }

            match self.backend.resolve_stream(&record.magnet_uri).await {
                Ok(url) => {
                    debug!("Resolved stream URL for cached torrent: {}", record.title);
                    Availability {
                        cached: true,
                        url,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Failed to get stream URL for {}: {}", record.title, e);
                    Availability {
                        error: Some(e.to_string()),
                        ..Availability::magnet(record)
                    }
                }
            }
        });

        join_all(futures).await
    }
}
