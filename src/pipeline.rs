//! Request orchestration: scrape, match, check availability, rank.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::{Aggregator, AggregatorConfig};
use crate::availability::{AvailabilityBackend, AvailabilityChecker, AvailabilityConfig};
use crate::cache::ResponseCache;
use crate::config::{Limits, ScoutConfig};
use crate::fetcher_http::HttpFetcher;
use crate::matcher::filter_matches;
use crate::metadata::{ContentRequest, MediaDetails, MetadataProvider};
use crate::planner::plan;
use crate::premiumize::Premiumize;
use crate::ranker::{rank, MIN_INFO_HASH_LEN};
use crate::sources::UIndex;
use crate::stream::{assemble, sort_streams, StreamDescriptor};
use crate::tmdb::Tmdb;
use crate::{CandidateRecord, ContentType, ListingSource, Result, ScoutError, SearchHit};

/// Diagnostics for a completed stream request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub original_query: String,
    pub total_results: usize,
    pub filtered_results: usize,
    pub final_streams: usize,
    pub cached_streams: usize,
    pub processing_time_ms: u64,
    pub media: MediaDetails,
}

/// Diagnostics for a failed stream request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFailure {
    pub error: String,
    pub step: String,
    pub processing_time_ms: u64,
}

/// Request diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DebugInfo {
    Success(RequestSummary),
    Failure(RequestFailure),
}

/// Result of a stream request. Always well-formed, even on failure.
#[derive(Debug, Clone, Serialize)]
pub struct StreamResponse {
    pub streams: Vec<StreamDescriptor>,
    #[serde(rename = "_debug")]
    pub debug: DebugInfo,
}

impl StreamResponse {
    /// Returns the failure diagnostics, if the request failed.
    pub fn failure(&self) -> Option<&RequestFailure> {
        match &self.debug {
            DebugInfo::Failure(failure) => Some(failure),
            DebugInfo::Success(_) => None,
        }
    }
}

/// Result of a plain search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub total_results: usize,
    pub results: Vec<SearchHit>,
}

/// A failure tagged with the pipeline step that produced it.
struct StepError {
    step: &'static str,
    error: ScoutError,
}

trait AtStep<T> {
    fn at_step(self, step: &'static str) -> std::result::Result<T, StepError>;
}

impl<T> AtStep<T> for Result<T> {
    fn at_step(self, step: &'static str) -> std::result::Result<T, StepError> {
        self.map_err(|error| StepError { step, error })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// The stream finder.
///
/// Owns one listing source, one metadata provider and one availability
/// backend, and shares a process-wide [`ResponseCache`].
pub struct StreamScout {
    source: Arc<dyn ListingSource>,
    metadata: Arc<dyn MetadataProvider>,
    backend: Arc<dyn AvailabilityBackend>,
    cache: Arc<ResponseCache>,
    aggregator: Aggregator,
    availability: AvailabilityConfig,
    limits: Limits,
}

impl StreamScout {
    /// Creates a pipeline over the given collaborators with default settings.
    pub fn new(
        source: Arc<dyn ListingSource>,
        metadata: Arc<dyn MetadataProvider>,
        backend: Arc<dyn AvailabilityBackend>,
    ) -> Self {
        Self {
            source,
            metadata,
            backend,
            cache: Arc::new(ResponseCache::default()),
            aggregator: Aggregator::new(),
            availability: AvailabilityConfig::default(),
            limits: Limits::default(),
        }
    }

    /// Builds the production pipeline: UIndex over HTTP, TMDB, Premiumize.
    pub fn from_config(config: &ScoutConfig) -> Self {
        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(config.source.timeout))
            .with_service(config.source.name.clone());
        let source = UIndex::with_config(Arc::new(fetcher), config.source.clone());
        // one pooled client for both JSON APIs
        let api_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.source.timeout))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let metadata = Tmdb::with_config(config.tmdb.clone()).with_client(api_client.clone());
        let backend = Premiumize::with_config(config.premiumize.clone()).with_client(api_client);

        Self::new(Arc::new(source), Arc::new(metadata), Arc::new(backend))
            .with_cache(Arc::new(ResponseCache::new(config.cache.clone())))
            .with_aggregation(config.aggregation.clone())
            .with_availability(config.availability.clone())
            .with_limits(config.limits.clone())
    }

    /// Shares an existing cache.
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Sets aggregation tuning.
    pub fn with_aggregation(mut self, config: AggregatorConfig) -> Self {
        self.aggregator = Aggregator::with_config(config);
        self
    }

    /// Sets availability batching.
    pub fn with_availability(mut self, config: AvailabilityConfig) -> Self {
        self.availability = config;
        self
    }

    /// Sets result limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the shared cache.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Finds, deduplicates and ranks records for a query, through the cache.
    pub async fn fetch_ranked(&self, query: &str, content_type: ContentType) -> Vec<CandidateRecord> {
        if let Some(records) = self.cache.get(query, content_type).await {
            return records;
        }

        if !self.source.is_enabled() {
            warn!("Source {} is disabled", self.source.name());
            return Vec::new();
        }

        let strategies = plan(query, content_type);
        if strategies.is_empty() {
            warn!("No usable search strategies for \"{}\"", query);
            return Vec::new();
        }

        let collected = self.aggregator.collect(self.source.as_ref(), &strategies).await;
        if collected.is_empty() {
            debug!("No results found from any search strategy");
            return Vec::new();
        }

        let ranked = rank(collected);
        self.cache.insert(query, content_type, ranked.clone()).await;
        debug!("Processed {} results for \"{}\"", ranked.len(), query);
        ranked
    }

    /// Plain search: ranked hits for a free-text query.
    pub async fn search(&self, query: &str, content_type: ContentType) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScoutError::InvalidQuery("Query cannot be empty".into()));
        }

        let records = self.fetch_ranked(query, content_type).await;
        Ok(SearchResponse {
            query: query.to_string(),
            content_type,
            total_results: records.len(),
            results: records
                .iter()
                .take(self.limits.search_results)
                .map(SearchHit::from)
                .collect(),
        })
    }

    /// Resolves a `(type, id)` request into ranked streams.
    ///
    /// Never fails: any error yields an empty stream list with the failing
    /// step in the diagnostics. A panic inside a collaborator is reported
    /// at step `internal`.
    pub async fn streams(&self, content_type: ContentType, id: &str) -> StreamResponse {
        let start = Instant::now();
        self.cache.maybe_cleanup().await;
        info!("Processing {} with id {}", content_type, id);

        let outcome = AssertUnwindSafe(self.run_streams(content_type, id, start))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(StepError {
                    step: "internal",
                    error: ScoutError::Other(panic_message(payload.as_ref())),
                })
            });

        match outcome {
            Ok((streams, summary)) => {
                info!(
                    "Processed {} streams ({} cached) in {}ms",
                    summary.final_streams, summary.cached_streams, summary.processing_time_ms
                );
                StreamResponse {
                    streams,
                    debug: DebugInfo::Success(summary),
                }
            }
            Err(StepError { step, error }) => {
                let processing_time_ms = elapsed_ms(start);
                warn!("Stream request failed at {} after {}ms: {}", step, processing_time_ms, error);
                StreamResponse {
                    streams: Vec::new(),
                    debug: DebugInfo::Failure(RequestFailure {
                        error: error.to_string(),
                        step: step.to_string(),
                        processing_time_ms,
                    }),
                }
            }
        }
    }

    async fn run_streams(
        &self,
        content_type: ContentType,
        id: &str,
        start: Instant,
    ) -> std::result::Result<(Vec<StreamDescriptor>, RequestSummary), StepError> {
        let request = ContentRequest::parse(content_type, id).at_step("parse_id")?;

        let media = self
            .metadata
            .lookup(&request.imdb_id)
            .await
            .and_then(|found| found.ok_or_else(|| ScoutError::NotFound(request.imdb_id.clone())))
            .at_step("metadata_lookup")?;
        info!("Found {} via {}", media, self.metadata.name());

        let query = request.search_query(&media);
        let results = self.fetch_ranked(&query, content_type).await;

        let fallback = match content_type {
            ContentType::Movie => self.limits.movie_fallback,
            ContentType::Series => self.limits.series_fallback,
        };
        let mut filtered = filter_matches(&results, &request.match_context(&media), fallback);
        filtered.truncate(self.limits.max_streams);

        let mut seen = HashSet::new();
        let hashes: Vec<String> = filtered
            .iter()
            .map(|r| r.info_hash.clone())
            .filter(|hash| hash.len() >= MIN_INFO_HASH_LEN && seen.insert(hash.clone()))
            .collect();

        let mut summary = RequestSummary {
            original_query: query,
            total_results: results.len(),
            filtered_results: filtered.len(),
            final_streams: 0,
            cached_streams: 0,
            processing_time_ms: 0,
            media,
        };

        if hashes.is_empty() {
            debug!("No valid info hashes found");
            summary.processing_time_ms = elapsed_ms(start);
            return Ok((Vec::new(), summary));
        }

        let checker =
            AvailabilityChecker::with_config(Arc::clone(&self.backend), self.availability.clone());
        let statuses = checker.check(&hashes).await;
        let outcomes = checker.resolve(&filtered, &statuses).await;

        let mut streams: Vec<StreamDescriptor> = filtered
            .iter()
            .zip(&outcomes)
            .map(|(record, availability)| assemble(record, availability, checker.backend_name()))
            .collect();
        sort_streams(&mut streams);

        summary.final_streams = streams.len();
        summary.cached_streams = streams.iter().filter(|s| s.cached).count();
        summary.processing_time_ms = elapsed_ms(start);
        Ok((streams, summary))
    }
}
