//! Candidate record types and the field normalizers that feed them.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::quality::extract_quality;
use crate::ScoutError;

static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d.,]+)\s*(KiB|MiB|GiB|TiB|KB|MB|GB|TB|B)").unwrap()
});

static INFO_HASH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)btih:([a-f0-9]{40}|[a-z2-7]{32})").unwrap());

/// Label used when a listing row carries no recognizable size.
pub const UNKNOWN_SIZE: &str = "Unknown";

/// Kind of content being looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Series,
}

impl ContentType {
    /// Returns the lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "series" => Ok(Self::Series),
            other => Err(ScoutError::UnknownContentType(other.to_string())),
        }
    }
}

/// One parsed listing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Decoded display title.
    pub title: String,
    /// Magnet URI of the torrent.
    pub magnet_uri: String,
    /// Canonical uppercase info hash (40 hex or 32 base32 chars).
    pub info_hash: String,
    /// Size as printed by the listing.
    pub size_label: String,
    /// Size in bytes, derived from `size_label`.
    pub size_bytes: u64,
    /// Quality label derived from the title, possibly empty.
    pub quality: String,
    /// Listing category.
    pub category: String,
    pub seeders: u32,
    pub leechers: u32,
    /// Origin tag of the listing site.
    pub source: String,
}

impl CandidateRecord {
    /// Creates a record; quality is derived from the title.
    pub fn new(
        title: impl Into<String>,
        magnet_uri: impl Into<String>,
        info_hash: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let quality = extract_quality(&title);
        Self {
            title,
            magnet_uri: magnet_uri.into(),
            info_hash: info_hash.into(),
            size_label: UNKNOWN_SIZE.to_string(),
            size_bytes: 0,
            quality,
            category: "Unknown".to_string(),
            seeders: 0,
            leechers: 0,
            source: String::new(),
        }
    }

    /// Sets the size label and its byte count together.
    pub fn with_size(mut self, label: impl Into<String>) -> Self {
        self.size_label = label.into();
        self.size_bytes = parse_size(&self.size_label);
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets seeder and leecher counts.
    pub fn with_peers(mut self, seeders: u32, leechers: u32) -> Self {
        self.seeders = seeders;
        self.leechers = leechers;
        self
    }

    /// Sets the origin tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// Search-facing view of a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub title: String,
    pub quality: String,
    pub size: String,
    pub seeders: u32,
    pub leechers: u32,
    pub magnet_link: String,
    pub info_hash: String,
    pub source: String,
}

impl From<&CandidateRecord> for SearchHit {
    fn from(record: &CandidateRecord) -> Self {
        Self {
            title: record.title.clone(),
            quality: record.quality.clone(),
            size: record.size_label.clone(),
            seeders: record.seeders,
            leechers: record.leechers,
            magnet_link: record.magnet_uri.clone(),
            info_hash: record.info_hash.clone(),
            source: record.source.clone(),
        }
    }
}

/// Converts a size label such as `"1.5 GB"` into bytes.
///
/// Units are binary (`KB` and `KiB` both mean 1024). Labels without a
/// recognizable number and unit yield 0.
pub fn parse_size(label: &str) -> u64 {
    let label = label.trim();
    if label.is_empty() || label == "-" || label.eq_ignore_ascii_case("unknown") {
        return 0;
    }

    let Some(caps) = SIZE_PATTERN.captures(label) else {
        return 0;
    };

    let value = parse_leading_float(&caps[1].replacen(',', ".", 1));
    let multiplier: u64 = match caps[2].to_ascii_uppercase().as_str() {
        "B" => 1,
        "KB" | "KIB" => 1024,
        "MB" | "MIB" => 1024_u64.pow(2),
        "GB" | "GIB" => 1024_u64.pow(3),
        "TB" | "TIB" => 1024_u64.pow(4),
        _ => 1,
    };

    (value * multiplier as f64) as u64
}

/// Parses the longest numeric prefix, so `"1.2.3"` reads as `1.2`.
fn parse_leading_float(text: &str) -> f64 {
    let mut seen_dot = false;
    let end = text
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                false
            } else {
                !c.is_ascii_digit()
            }
        })
        .map(|(i, _)| i)
        .unwrap_or(text.len());

    text[..end].parse().unwrap_or(0.0)
}

/// Extracts the canonical uppercase info hash from a magnet URI.
pub fn extract_info_hash(magnet: &str) -> Option<String> {
    INFO_HASH_PATTERN
        .captures(magnet)
        .map(|caps| caps[1].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

    #[test]
    fn test_parse_size_gigabytes() {
        assert_eq!(parse_size("1.5 GB"), (1.5 * GIB) as u64);
        assert_eq!(parse_size("2 GiB"), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_placeholders() {
        assert_eq!(parse_size("-"), 0);
        assert_eq!(parse_size("bogus"), 0);
        assert_eq!(parse_size("Unknown"), 0);
        assert_eq!(parse_size(""), 0);
    }

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("512 B"), 512);
        assert_eq!(parse_size("10 KB"), 10 * 1024);
        assert_eq!(parse_size("700 MiB"), 700 * 1024 * 1024);
        assert_eq!(parse_size("1 TB"), 1024_u64.pow(4));
    }

    #[test]
    fn test_parse_size_decimal_comma() {
        assert_eq!(parse_size("1,5 GB"), (1.5 * GIB) as u64);
    }

    #[test]
    fn test_parse_size_case_insensitive() {
        assert_eq!(parse_size("3 gb"), 3 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("1.2.3"), 1.2);
        assert_eq!(parse_leading_float("42"), 42.0);
        assert_eq!(parse_leading_float("."), 0.0);
    }

    #[test]
    fn test_extract_info_hash_hex() {
        let magnet = "magnet:?xt=urn:btih:aabbccddeeff00112233445566778899aabbccdd&dn=x";
        assert_eq!(
            extract_info_hash(magnet).as_deref(),
            Some("AABBCCDDEEFF00112233445566778899AABBCCDD")
        );
    }

    #[test]
    fn test_extract_info_hash_base32() {
        let magnet = "magnet:?xt=urn:btih:abcdefghijklmnopqrstuvwxyz234567";
        assert_eq!(
            extract_info_hash(magnet).as_deref(),
            Some("ABCDEFGHIJKLMNOPQRSTUVWXYZ234567")
        );
    }

    #[test]
    fn test_extract_info_hash_missing() {
        assert!(extract_info_hash("magnet:?xt=urn:btih:short").is_none());
        assert!(extract_info_hash("https://example.com").is_none());
    }

    #[test]
    fn test_record_size_invariant() {
        let record = CandidateRecord::new("Title", "magnet:?", "HASH").with_size("2 MB");
        assert_eq!(record.size_bytes, 2 * 1024 * 1024);
        assert_eq!(record.size_label, "2 MB");
    }

    #[test]
    fn test_record_derives_quality() {
        let record = CandidateRecord::new("Show.S01E01.720p.WEB", "magnet:?", "HASH");
        assert_eq!(record.quality, "720p");
    }

    #[test]
    fn test_content_type_from_str() {
        assert_eq!("movie".parse::<ContentType>().unwrap(), ContentType::Movie);
        assert_eq!("series".parse::<ContentType>().unwrap(), ContentType::Series);
        assert!(matches!(
            "tv".parse::<ContentType>(),
            Err(ScoutError::UnknownContentType(_))
        ));
    }

    #[test]
    fn test_content_type_serialization() {
        assert_eq!(serde_json::to_string(&ContentType::Series).unwrap(), "\"series\"");
    }

    #[test]
    fn test_search_hit_serialization() {
        let record = CandidateRecord::new("Title 1080p", "magnet:?xt", "ABCD")
            .with_size("1 GB")
            .with_source("UIndex");
        let hit = SearchHit::from(&record);
        let json = serde_json::to_string(&hit).unwrap();
        assert!(json.contains("\"magnetLink\":\"magnet:?xt\""));
        assert!(json.contains("\"infoHash\":\"ABCD\""));
        assert!(json.contains("\"quality\":\"1080p\""));
    }
}
