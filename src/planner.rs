//! Query planning: one user query becomes an ordered list of search variants.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ContentType;

static RAW_IMDB_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^tt\d+$").unwrap());
static TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d{4}\)\s*$").unwrap());
static SPECIAL_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s.-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static GENERIC_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(movie|film|dvd|bluray|bd)\b").unwrap());
static EPISODE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)S(\d+)E(\d+)").unwrap());

/// One phrasing of a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStrategy {
    /// Text sent to the listing source.
    pub query: String,
    /// Human label for logs.
    pub label: String,
}

impl QueryStrategy {
    fn new(query: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            label: label.into(),
        }
    }
}

/// Normalizes a title into a search query.
///
/// Returns `None` for a raw IMDb identifier (those must be resolved to a
/// title first) and for queries that clean down to nothing.
pub fn clean_query(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if RAW_IMDB_ID.is_match(raw) {
        warn!("Raw IMDb id '{}' passed to query planner; resolve it to a title first", raw);
        return None;
    }

    let cleaned = TRAILING_YEAR.replace(raw, "");
    let cleaned = SPECIAL_CHARS.replace_all(&cleaned, " ");
    let cleaned = collapse_whitespace(&cleaned);

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Expands a query into ordered search strategies.
///
/// The cleaned query always comes first. Movies add a variant without
/// generic words such as "film"; series add an `NxMM` rewrite of an
/// `SxxEyy` marker. A variant equal to its predecessor is dropped.
pub fn plan(raw: &str, content_type: ContentType) -> Vec<QueryStrategy> {
    let Some(base) = clean_query(raw) else {
        return Vec::new();
    };

    let mut strategies = vec![QueryStrategy::new(base.clone(), "Original cleaned")];

    match content_type {
        ContentType::Movie => {
            let simplified = collapse_whitespace(&GENERIC_WORDS.replace_all(&base, ""));
            if !simplified.is_empty() && simplified != base {
                push_distinct(&mut strategies, QueryStrategy::new(simplified, "Simplified movie"));
            }
        }
        ContentType::Series => {
            let alternate = EPISODE_MARKER.replace(raw, "${1}x${2}");
            if alternate != raw {
                if let Some(query) = clean_query(&alternate) {
                    push_distinct(
                        &mut strategies,
                        QueryStrategy::new(query, "Alternative episode format"),
                    );
                }
            }
        }
    }

    debug!("Planned {} strategies for \"{}\"", strategies.len(), raw);
    strategies
}

fn push_distinct(strategies: &mut Vec<QueryStrategy>, strategy: QueryStrategy) {
    if strategies.last().map(|s| s.query.as_str()) != Some(strategy.query.as_str()) {
        strategies.push(strategy);
    }
}
