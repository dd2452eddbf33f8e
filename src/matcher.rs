//! Heuristic title matching of release names against expected content.
//!
//! A candidate passes when enough significant words of the expected title
//! occur in it and, for movies, its year is close enough or, for series, it
//! carries the requested season/episode in one of the common notations.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::CandidateRecord;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[.*?\]").unwrap());
static PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*?\)").unwrap());
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:19|20)\d{2}").unwrap());

const STOP_WORDS: [&str; 7] = ["the", "and", "or", "in", "on", "at", "to"];

const MOVIE_THRESHOLD: f64 = 0.7;
const EPISODE_THRESHOLD: f64 = 0.6;

/// What a request expects the release to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchContext {
    Movie {
        title: String,
        year: Option<i32>,
    },
    Series {
        title: String,
        season: u32,
        episode: u32,
    },
}

impl MatchContext {
    /// Returns whether `candidate` matches this context.
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Movie { title, year } => is_exact_movie_match(candidate, title, *year),
            Self::Series {
                title,
                season,
                episode,
            } => is_exact_episode_match(candidate, title, *season, *episode),
        }
    }
}

/// Strips markup, bracketed and parenthesized annotations, and extra spaces.
fn clean_candidate(candidate: &str) -> String {
    let text = MARKUP.replace_all(candidate, "");
    let text = BRACKETED.replace_all(&text, "");
    let text = PARENTHESIZED.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Significant lowercase words of an expected title.
fn significant_words(expected: &str) -> Vec<String> {
    let lowered = expected.to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lowered, " ");
    let normalized = WHITESPACE.replace_all(&stripped, " ");

    normalized
        .trim()
        .split(' ')
        .filter(|word| word.chars().count() > 2)
        .filter(|word| !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Fraction of `words` found as substrings of `haystack`.
///
/// An empty word list scores 0 so that titles made only of stop words never
/// match on their own.
fn word_overlap(haystack: &str, words: &[String]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let found = words.iter().filter(|w| haystack.contains(w.as_str())).count();
    found as f64 / words.len() as f64
}

/// Checks a release name against a movie title and optional year.
///
/// Requires 70% word overlap. If the release carries a year-like number it
/// must be within one year of `year`; releases without one pass.
pub fn is_exact_movie_match(candidate: &str, title: &str, year: Option<i32>) -> bool {
    if candidate.is_empty() || title.is_empty() {
        return false;
    }

    let cleaned = clean_candidate(candidate);
    let lowered = cleaned.to_lowercase();
    let overlap = word_overlap(&lowered, &significant_words(title));

    if overlap < MOVIE_THRESHOLD {
        debug!("Movie match failed for \"{}\" - {:.2} match", cleaned, overlap);
        return false;
    }

    let year_matches = match (YEAR.find(&cleaned), year) {
        (Some(found), Some(expected)) => found
            .as_str()
            .parse::<i32>()
            .map(|found| (found - expected).abs() <= 1)
            .unwrap_or(true),
        _ => true,
    };

    debug!(
        "Year match {} for \"{}\" ({:?})",
        if year_matches { "passed" } else { "failed" },
        cleaned,
        year
    );
    year_matches
}

fn episode_patterns(season: u32, episode: u32) -> Vec<Regex> {
    let ss = format!("{:02}", season);
    let ee = format!("{:02}", episode);

    [
        format!(r"(?i)s{ss}e{ee}"),
        format!(r"(?i){season}x{ee}"),
        format!(r"(?i)[^0-9]{season}{ee}[^0-9]"),
        format!(r"(?i)season\s*{season}\s*episode\s*{episode}"),
        format!(r"(?i)s{ss}\.?e{ee}"),
        format!(r"(?i){ss}{ee}"),
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
}

/// Checks a release name against a show title, season and episode.
///
/// Requires 60% word overlap plus one recognizable episode notation.
pub fn is_exact_episode_match(candidate: &str, title: &str, season: u32, episode: u32) -> bool {
    if candidate.is_empty() || title.is_empty() {
        return false;
    }

    let cleaned = clean_candidate(candidate);
    let lowered = cleaned.to_lowercase();
    let overlap = word_overlap(&lowered, &significant_words(title));

    if overlap < EPISODE_THRESHOLD {
        debug!("Show match failed for \"{}\" - {:.2} match", cleaned, overlap);
        return false;
    }

    let matched = episode_patterns(season, episode)
        .iter()
        .any(|pattern| pattern.is_match(&lowered));

    debug!(
        "Episode match {} for \"{}\" S{:02}E{:02}",
        if matched { "passed" } else { "failed" },
        cleaned,
        season,
        episode
    );
    matched
}

/// Keeps the records matching `context`.
///
/// When a non-empty input loses every record, the first `fallback_len`
/// records of the input are returned instead, trading precision for recall.
pub fn filter_matches(
    records: &[CandidateRecord],
    context: &MatchContext,
    fallback_len: usize,
) -> Vec<CandidateRecord> {
    let matched: Vec<CandidateRecord> = records
        .iter()
        .filter(|r| context.matches(&r.title))
        .cloned()
        .collect();

    debug!("Filtering kept {} of {} results", matched.len(), records.len());

    if matched.is_empty() && !records.is_empty() {
        debug!("Exact filtering removed all results, using broader match");
        return records.iter().take(fallback_len).cloned().collect();
    }
    matched
}
