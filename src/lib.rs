//! # stream-scout
//!
//! A scrape-match-rank pipeline that turns a movie or episode into a ranked
//! list of playable torrent streams.
//!
//! For each request the pipeline:
//!
//! - Resolves an IMDb id to a title and year through a metadata provider
//! - Expands the title into search strategies and scrapes a listing site
//! - Deduplicates by info hash and ranks by quality, size and seeders
//! - Filters releases against the expected title, year or episode
//! - Checks a debrid backend for instantly available torrents
//! - Assembles and orders stream descriptors
//!
//! ## Example
//!
//! ```rust,no_run
//! use stream_scout::{ContentType, ScoutConfig, StreamScout};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScoutConfig::default()
//!         .with_tmdb_key("tmdb-key")
//!         .with_premiumize_key("premiumize-key");
//!     let scout = StreamScout::from_config(&config);
//!
//!     let response = scout.streams(ContentType::Movie, "tt1375666").await;
//!     for stream in &response.streams {
//!         println!("{}: {}", stream.display_name, stream.url);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod record;
mod source;

pub mod aggregator;
pub mod availability;
pub mod cache;
pub mod config;
pub mod extract;
pub mod fetcher;
pub mod fetcher_http;
pub mod matcher;
pub mod metadata;
pub mod pipeline;
pub mod planner;
pub mod premiumize;
pub mod quality;
pub mod ranker;
pub mod sources;
pub mod stream;
pub mod tmdb;

pub use config::ScoutConfig;
pub use error::{Result, ScoutError};
pub use pipeline::{SearchResponse, StreamResponse, StreamScout};
pub use record::{extract_info_hash, parse_size, CandidateRecord, ContentType, SearchHit};
pub use source::{ListingSource, SourceConfig};
