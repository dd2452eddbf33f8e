//! Listing extraction interface and shared scraping helpers.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::CandidateRecord;

/// Marker every magnet link to a BitTorrent info hash starts with.
pub const MAGNET_MARKER: &str = "magnet:?xt=urn:btih:";

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Turns one listing page into candidate records.
///
/// Implementations must not fail as a whole because one row is malformed:
/// such rows are skipped and extraction continues. Each supported site gets
/// its own implementation; aggregation and ranking never look at markup.
pub trait ListingParser: Send + Sync {
    /// Parses the markup of a single result page.
    fn parse_listing(&self, markup: &str) -> Vec<CandidateRecord>;
}

/// Returns whether a page plausibly contains a torrent table.
pub fn looks_like_listing(markup: &str) -> bool {
    markup.contains("<table") && markup.contains("magnet:")
}

/// Collects the text content of an element, trimmed, with non-breaking
/// spaces folded into plain spaces.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}

/// Parses the first run of digits in `text`, or 0.
pub fn leading_number(text: &str) -> u32 {
    LEADING_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
