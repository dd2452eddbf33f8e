//! End-to-end pipeline tests over canned listing pages.
//!
//! The UIndex source and parser run for real; page fetching, metadata and the
//! debrid backend are replaced with in-memory fakes.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_test::assert_ok;

use stream_scout::aggregator::AggregatorConfig;
use stream_scout::availability::{AvailabilityBackend, AvailabilityConfig};
use stream_scout::fetcher::PageFetcher;
use stream_scout::matcher::is_exact_movie_match;
use stream_scout::metadata::{MediaDetails, MetadataProvider};
use stream_scout::pipeline::DebugInfo;
use stream_scout::sources::UIndex;
use stream_scout::{ContentType, Result, ScoutError, SourceConfig, StreamScout};

const INCEPTION_HASH: &str = "AABBCCDDEEFF00112233445566778899AABBCCDD";
const EPISODE_HASH: &str = "1111111111111111111111111111111111111111";
const WRONG_EPISODE_HASH: &str = "2222222222222222222222222222222222222222";

fn listing_row(hash: &str, title: &str, size: &str, seeders: u32, leechers: u32) -> String {
    format!(
        "<tr>\
         <td><a href=\"/search.php?c=1\">Movies</a></td>\
         <td><a href=\"magnet:?xt=urn:btih:{hash}&amp;dn=release\"><img src=\"/magnet.png\"></a> \
         <a href=\"/details.php?id=1\">{title}</a></td>\
         <td>{size}</td><td>1 day</td><td>{seeders}</td><td>{leechers}</td>\
         </tr>"
    )
}

fn listing_page(rows: &[String]) -> String {
    format!(
        "<html><body><table class=\"maintable\">\
         <tr><th>Cat</th><th>Name</th><th>Size</th><th>Age</th><th>S</th><th>L</th></tr>\
         {}</table></body></html>",
        rows.concat()
    )
}

/// Serves one page for every URL and records the URLs requested.
struct FixtureFetcher {
    page: Option<String>,
    requested: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    fn serving(page: String) -> Arc<Self> {
        Arc::new(Self {
            page: Some(page),
            requested: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            page: None,
            requested: Mutex::new(Vec::new()),
        })
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.page.clone().ok_or_else(|| ScoutError::UpstreamStatus {
            service: "UIndex".to_string(),
            status: 503,
        })
    }
}

struct FixedMetadata(MediaDetails);

#[async_trait]
impl MetadataProvider for FixedMetadata {
    fn name(&self) -> &str {
        "Fixed"
    }

    async fn lookup(&self, _imdb_id: &str) -> Result<Option<MediaDetails>> {
        Ok(Some(self.0.clone()))
    }
}

struct FakeDebrid {
    cached: HashSet<String>,
}

#[async_trait]
impl AvailabilityBackend for FakeDebrid {
    fn name(&self) -> &str {
        "FakeDebrid"
    }

    async fn check_cached(&self, hashes: &[String]) -> Result<Vec<bool>> {
        Ok(hashes.iter().map(|h| self.cached.contains(h)).collect())
    }

    async fn resolve_stream(&self, magnet: &str) -> Result<String> {
        Ok(format!("https://debrid.example/dl?src={}", magnet.len()))
    }
}

fn build(fetcher: Arc<FixtureFetcher>, media: MediaDetails, cached: &[&str]) -> StreamScout {
    let source = UIndex::with_config(
        fetcher,
        SourceConfig {
            base_url: "http://uindex.test".to_string(),
            ..Default::default()
        },
    );
    let backend = FakeDebrid {
        cached: cached.iter().map(|h| h.to_string()).collect(),
    };

    StreamScout::new(Arc::new(source), Arc::new(FixedMetadata(media)), Arc::new(backend))
        .with_aggregation(AggregatorConfig {
            min_results: 20,
            strategy_delay_ms: 0,
        })
        .with_availability(AvailabilityConfig {
            batch_size: 99,
            batch_delay_ms: 0,
        })
}

fn inception() -> MediaDetails {
    MediaDetails {
        title: "Inception".to_string(),
        year: Some(2010),
        content_type: ContentType::Movie,
    }
}

fn breaking_bad() -> MediaDetails {
    MediaDetails {
        title: "Breaking Bad".to_string(),
        year: Some(2008),
        content_type: ContentType::Series,
    }
}

#[tokio::test]
async fn test_search_extracts_single_record() {
    let page = listing_page(&[listing_row(
        INCEPTION_HASH,
        "Inception 2010 1080p BluRay",
        "2.1 GB",
        250,
        12,
    )]);
    let fetcher = FixtureFetcher::serving(page);
    let scout = build(fetcher.clone(), inception(), &[]);

    let response = assert_ok!(scout.search("Inception 2010", ContentType::Movie).await);

    assert_eq!(response.total_results, 1);
    let hit = &response.results[0];
    assert_eq!(hit.title, "Inception 2010 1080p BluRay");
    assert_eq!(hit.quality, "1080p");
    assert_eq!(hit.info_hash, INCEPTION_HASH);
    assert_eq!(hit.size, "2.1 GB");
    assert!(is_exact_movie_match(&hit.title, "Inception", Some(2010)));

    let records = scout.fetch_ranked("Inception 2010", ContentType::Movie).await;
    let expected = 2.1 * 1024.0 * 1024.0 * 1024.0;
    assert!((records[0].size_bytes as f64 - expected).abs() < 1.0);

    assert_eq!(
        fetcher.requested(),
        vec!["http://uindex.test/search.php?search=Inception%202010&c=0"]
    );
}

#[tokio::test]
async fn test_movie_streams_end_to_end() {
    let page = listing_page(&[
        listing_row(INCEPTION_HASH, "Inception 2010 1080p BluRay", "2.1 GB", 250, 12),
        listing_row(
            "CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC",
            "Inception 2010 2160p UHD",
            "20 GB",
            30,
            2,
        ),
        listing_row(
            "DDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDDD",
            "Interstellar 2014 1080p",
            "3 GB",
            900,
            50,
        ),
    ]);
    let scout = build(FixtureFetcher::serving(page), inception(), &[INCEPTION_HASH]);

    let response = scout.streams(ContentType::Movie, "tt1375666").await;

    assert_eq!(response.streams.len(), 2);
    let first = &response.streams[0];
    assert!(first.cached);
    assert_eq!(first.meta.info_hash, INCEPTION_HASH);
    assert!(first.url.starts_with("https://debrid.example/"));
    assert!(first.display_title.contains("Instant streaming via FakeDebrid"));

    let second = &response.streams[1];
    assert!(!second.cached);
    assert!(second.url.starts_with("magnet:?xt=urn:btih:CCCC"));
    assert!(second.behavior_hints.not_web_ready);

    match &response.debug {
        DebugInfo::Success(summary) => {
            assert_eq!(summary.original_query, "Inception 2010");
            assert_eq!(summary.total_results, 3);
            assert_eq!(summary.filtered_results, 2);
            assert_eq!(summary.cached_streams, 1);
            assert_eq!(summary.media, inception());
        }
        DebugInfo::Failure(failure) => panic!("unexpected failure: {:?}", failure),
    }
}

#[tokio::test]
async fn test_series_streams_filter_episode() {
    let page = listing_page(&[
        listing_row(EPISODE_HASH, "Breaking.Bad.S01E02.720p.HDTV", "400 MB", 40, 4),
        listing_row(WRONG_EPISODE_HASH, "Breaking.Bad.S01E03.1080p.WEB", "1.2 GB", 80, 8),
    ]);
    let fetcher = FixtureFetcher::serving(page);
    let scout = build(fetcher.clone(), breaking_bad(), &[]);

    let response = scout.streams(ContentType::Series, "tt0903747:1:2").await;

    assert_eq!(response.streams.len(), 1);
    assert_eq!(response.streams[0].meta.info_hash, EPISODE_HASH);

    let requested = fetcher.requested();
    assert_eq!(requested.len(), 2);
    assert!(requested[0].contains("Breaking%20Bad%202008%20S01E02"));
    assert!(requested[1].contains("Breaking%20Bad%202008%2001x02"));
}

#[tokio::test]
async fn test_source_failure_yields_no_streams() {
    let fetcher = FixtureFetcher::failing();
    let scout = build(fetcher.clone(), inception(), &[]);

    let response = scout.streams(ContentType::Movie, "tt1375666").await;

    assert!(response.streams.is_empty());
    assert!(response.failure().is_none());
    assert_eq!(fetcher.requested().len(), 1);
}

#[tokio::test]
async fn test_page_without_table_yields_no_results() {
    let fetcher = FixtureFetcher::serving("<html><body>No results</body></html>".to_string());
    let scout = build(fetcher, inception(), &[]);

    let response = assert_ok!(scout.search("Inception 2010", ContentType::Movie).await);
    assert_eq!(response.total_results, 0);
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_repeat_request_served_from_cache() {
    let page = listing_page(&[listing_row(
        INCEPTION_HASH,
        "Inception 2010 1080p BluRay",
        "2.1 GB",
        250,
        12,
    )]);
    let fetcher = FixtureFetcher::serving(page);
    let scout = build(fetcher.clone(), inception(), &[]);

    scout.streams(ContentType::Movie, "tt1375666").await;
    scout.streams(ContentType::Movie, "tt1375666").await;

    assert_eq!(fetcher.requested().len(), 1);
    assert_eq!(scout.cache().keys().await, vec!["Inception 2010:movie"]);

    let stats = scout.cache().stats().await;
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.max_entries, 1000);
    assert_eq!(stats.ttl_secs, 1800);
}
