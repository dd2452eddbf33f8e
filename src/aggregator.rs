//! Sequential multi-strategy collection with info-hash deduplication.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::planner::QueryStrategy;
use crate::{CandidateRecord, ListingSource};

/// Tuning for result aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Stop trying strategies once this many unique results are collected.
    #[serde(default = "default_min_results")]
    pub min_results: usize,
    /// Pause between strategy attempts in milliseconds.
    #[serde(default = "default_strategy_delay_ms")]
    pub strategy_delay_ms: u64,
}

fn default_min_results() -> usize {
    20
}

fn default_strategy_delay_ms() -> u64 {
    100
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            min_results: default_min_results(),
            strategy_delay_ms: default_strategy_delay_ms(),
        }
    }
}

/// Runs search strategies one after another and merges their results.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    /// Creates an aggregator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates with custom configuration.
    pub fn with_config(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Collects unique records across `strategies`.
    ///
    /// Strategies run strictly in order. A record whose info hash was already
    /// seen (from this or an earlier strategy) is dropped. A failing strategy
    /// is logged and skipped. Once `min_results` unique records are held no
    /// further strategies are tried.
    pub async fn collect(
        &self,
        source: &dyn ListingSource,
        strategies: &[QueryStrategy],
    ) -> Vec<CandidateRecord> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut collected = Vec::new();
        let delay = Duration::from_millis(self.config.strategy_delay_ms);

        for (attempt, strategy) in strategies.iter().enumerate() {
            if attempt > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            debug!("Trying strategy: {} - \"{}\"", strategy.label, strategy.query);

            let records = match source.search(&strategy.query).await {
                Ok(records) => records,
                Err(e) => {
                    warn!("Strategy \"{}\" failed on {}: {}", strategy.label, source.name(), e);
                    continue;
                }
            };

            let before = collected.len();
            collected.extend(
                records
                    .into_iter()
                    .filter(|r| !r.info_hash.is_empty() && seen.insert(r.info_hash.clone())),
            );
            debug!(
                "Strategy \"{}\" found {} unique results",
                strategy.label,
                collected.len() - before
            );

            if collected.len() >= self.config.min_results {
                break;
            }
        }

        debug!("Multi-strategy search found {} total unique results", collected.len());
        collected
    }
}
