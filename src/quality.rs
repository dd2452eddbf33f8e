//! Release quality detection and ranking.
//!
//! Two tables live here and are deliberately independent: the ordered
//! pattern list decides which label a title gets, and the rank table decides
//! how labels compare. `remux` is matched after `bluray` but outranks `1080p`.

use std::sync::LazyLock;

use regex::Regex;

static QUALITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(2160p|4k|uhd)\b",
        r"(?i)\b(1080p)\b",
        r"(?i)\b(720p)\b",
        r"(?i)\b(480p|sd)\b",
        r"(?i)\b(webrip|web-rip)\b",
        r"(?i)\b(bluray|blu-ray|bdremux|bd)\b",
        r"(?i)\b(remux)\b",
        r"(?i)\b(hdrip|hdr)\b",
        r"(?i)\b(cam|ts|tc)\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Returns the lowercase quality label of the first matching pattern.
///
/// Patterns are tried in priority order, so a title carrying both `2160p`
/// and `BluRay` is labelled `2160p`. Returns an empty string when nothing
/// matches.
pub fn extract_quality(title: &str) -> String {
    QUALITY_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(title))
        .map(|caps| caps[1].to_lowercase())
        .unwrap_or_default()
}

/// Ranking weight of a quality label. Unknown labels weigh 0.
pub fn quality_rank(label: &str) -> u8 {
    match label {
        "2160p" | "4k" | "uhd" => 6,
        "remux" => 5,
        "1080p" => 4,
        "720p" => 3,
        "webrip" => 2,
        "480p" => 1,
        _ => 0,
    }
}

/// Display symbol for a quality label.
pub fn quality_symbol(label: &str) -> &'static str {
    let label = label.to_lowercase();
    if label.contains("2160") || label.contains("4k") || label.contains("uhd") {
        "🔥"
    } else if label.contains("1080") {
        "⭐"
    } else if label.contains("720") {
        "✅"
    } else if label.contains("480") {
        "📺"
    } else {
        "🎬"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_pattern_wins() {
        assert_eq!(extract_quality("Movie.Title.2160p.BluRay.x264"), "2160p");
        assert_eq!(extract_quality("Movie 1080p BluRay REMUX"), "1080p");
    }

    #[test]
    fn test_extract_quality_variants() {
        assert_eq!(extract_quality("Film 4K HDR"), "4k");
        assert_eq!(extract_quality("Film.UHD.2019"), "uhd");
        assert_eq!(extract_quality("Show S01E01 720p"), "720p");
        assert_eq!(extract_quality("Old Movie SD"), "sd");
        assert_eq!(extract_quality("Film.WEBRip.x265"), "webrip");
        assert_eq!(extract_quality("Film Blu-Ray"), "blu-ray");
        assert_eq!(extract_quality("Film REMUX"), "remux");
        assert_eq!(extract_quality("Film HDRip"), "hdrip");
        assert_eq!(extract_quality("Film CAM"), "cam");
    }

    #[test]
    fn test_extract_quality_none() {
        assert_eq!(extract_quality("Some Movie 2010"), "");
        assert_eq!(extract_quality(""), "");
    }

    #[test]
    fn test_extract_quality_requires_word_boundary() {
        assert_eq!(extract_quality("Tsunami"), "");
        assert_eq!(extract_quality("Cameron"), "");
    }

    #[test]
    fn test_quality_rank_table() {
        assert_eq!(quality_rank("2160p"), 6);
        assert_eq!(quality_rank("uhd"), 6);
        assert_eq!(quality_rank("remux"), 5);
        assert_eq!(quality_rank("1080p"), 4);
        assert_eq!(quality_rank("720p"), 3);
        assert_eq!(quality_rank("webrip"), 2);
        assert_eq!(quality_rank("480p"), 1);
        assert_eq!(quality_rank("cam"), 0);
        assert_eq!(quality_rank("bluray"), 0);
        assert_eq!(quality_rank(""), 0);
    }

    #[test]
    fn test_quality_symbol() {
        assert_eq!(quality_symbol("2160P"), "🔥");
        assert_eq!(quality_symbol("4k"), "🔥");
        assert_eq!(quality_symbol("1080P"), "⭐");
        assert_eq!(quality_symbol("720p"), "✅");
        assert_eq!(quality_symbol("480p"), "📺");
        assert_eq!(quality_symbol("Unknown"), "🎬");
    }
}
