//! Stream descriptor assembly and final ordering.
//!
//! Display strings are rendered once and never read back: ordering uses the
//! typed `cached`, `quality_rank` and `seeders` fields only.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::availability::Availability;
use crate::quality::{quality_rank, quality_symbol};
use crate::CandidateRecord;

/// Groups streams of the same addon for binge playback.
pub const BINGE_GROUP: &str = "stream-scout";

/// Player hints attached to a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    pub binge_group: String,
    pub not_web_ready: bool,
}

/// Machine-readable stream metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMeta {
    pub info_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One playable stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescriptor {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "title")]
    pub display_title: String,
    pub url: String,
    pub behavior_hints: BehaviorHints,
    pub cached: bool,
    pub quality_rank: u8,
    pub seeders: u32,
    pub meta: StreamMeta,
}

impl StreamDescriptor {
    /// Whether URL resolution failed for this stream.
    pub fn is_errored(&self) -> bool {
        self.meta.error.is_some()
    }
}

fn display_name(record: &CandidateRecord, availability: &Availability) -> String {
    let quality = if record.quality.is_empty() {
        "Unknown".to_string()
    } else {
        record.quality.to_uppercase()
    };

    let mut marker = String::new();
    if availability.cached {
        marker.push_str("⚡ ");
    }
    if availability.error.is_some() {
        marker.push_str("⚠️ ");
    }

    let parts = [
        marker,
        quality_symbol(&quality).to_string(),
        quality,
        record.size_label.clone(),
        format!("👥 {}/{}", record.seeders, record.leechers),
        record.source.clone(),
    ];

    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn display_title(record: &CandidateRecord, availability: &Availability, backend: &str) -> String {
    let delivery = if availability.cached {
        format!("Instant streaming via {}", backend)
    } else {
        "Download via magnet link".to_string()
    };

    let mut lines = vec![
        format!("🎬 {}", record.title),
        format!(
            "📡 {} | 🌱 {} seeds | 🔥 {} peers",
            record.source, record.seeders, record.leechers
        ),
        format!("⚡ {}", delivery),
    ];
    if !record.category.is_empty() {
        lines.push(format!("📂 {}", record.category));
    }
    if let Some(error) = &availability.error {
        lines.push(format!("⚠️ Stream error: {}", error));
    }
    lines.join("\n")
}

/// Builds the stream for one record and its availability outcome.
pub fn assemble(record: &CandidateRecord, availability: &Availability, backend: &str) -> StreamDescriptor {
    StreamDescriptor {
        display_name: display_name(record, availability),
        display_title: display_title(record, availability, backend),
        url: availability.url.clone(),
        behavior_hints: BehaviorHints {
            binge_group: BINGE_GROUP.to_string(),
            not_web_ready: !availability.cached,
        },
        cached: availability.cached,
        quality_rank: quality_rank(&record.quality),
        seeders: record.seeders,
        meta: StreamMeta {
            info_hash: record.info_hash.clone(),
            error: availability.error.clone(),
        },
    }
}

/// Orders streams: errored last, cached first, then quality, then seeders.
pub fn sort_streams(streams: &mut [StreamDescriptor]) {
    streams.sort_by_key(|s| {
        (
            s.is_errored(),
            !s.cached,
            Reverse(s.quality_rank),
            Reverse(s.seeders),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, seeders: u32) -> CandidateRecord {
        CandidateRecord::new(title, format!("magnet:?xt=urn:btih:{}", title), "A".repeat(40))
            .with_size("2.1 GB")
            .with_category("Movies")
            .with_peers(seeders, 3)
            .with_source("UIndex")
    }

    fn magnet(record: &CandidateRecord) -> Availability {
        Availability {
            cached: false,
            url: record.magnet_uri.clone(),
            error: None,
        }
    }

    fn cached() -> Availability {
        Availability {
            cached: true,
            url: "https://cdn.example/file.mkv".to_string(),
            error: None,
        }
    }

    #[test]
    fn test_display_name_cached() {
        let r = record("Inception 2010 1080p BluRay", 42);
        let stream = assemble(&r, &cached(), "Premiumize");
        assert_eq!(
            stream.display_name,
            "⚡  | ⭐ | 1080P | 2.1 GB | 👥 42/3 | UIndex"
        );
    }

    #[test]
    fn test_display_name_uncached_unknown_quality() {
        let r = record("Inception 2010", 1);
        let stream = assemble(&r, &magnet(&r), "Premiumize");
        assert_eq!(stream.display_name, "🎬 | Unknown | 2.1 GB | 👥 1/3 | UIndex");
    }

    #[test]
    fn test_display_title_lines() {
        let r = record("Inception 2010 2160p", 7);
        let stream = assemble(&r, &cached(), "Premiumize");
        let lines: Vec<&str> = stream.display_title.lines().collect();
        assert_eq!(
            lines,
            vec![
                "🎬 Inception 2010 2160p",
                "📡 UIndex | 🌱 7 seeds | 🔥 3 peers",
                "⚡ Instant streaming via Premiumize",
                "📂 Movies",
            ]
        );
    }

    #[test]
    fn test_assemble_resolution_error() {
        let r = record("Inception 2010 720p", 7);
        let availability = Availability {
            error: Some("No suitable video file found".to_string()),
            ..magnet(&r)
        };
        let stream = assemble(&r, &availability, "Premiumize");

        assert!(!stream.cached);
        assert!(stream.is_errored());
        assert!(stream.behavior_hints.not_web_ready);
        assert_eq!(stream.url, r.magnet_uri);
        assert!(stream.display_name.starts_with("⚠️  | ✅ | 720P"));
        assert!(stream
            .display_title
            .ends_with("⚠️ Stream error: No suitable video file found"));
        assert!(stream.display_title.contains("Download via magnet link"));
    }

    #[test]
    fn test_assemble_typed_fields() {
        let r = record("Film REMUX", 12);
        let stream = assemble(&r, &cached(), "Premiumize");
        assert!(stream.cached);
        assert!(!stream.behavior_hints.not_web_ready);
        assert_eq!(stream.quality_rank, 5);
        assert_eq!(stream.seeders, 12);
        assert_eq!(stream.meta.info_hash, "A".repeat(40));
    }

    #[test]
    fn test_serialize_field_names() {
        let r = record("Inception 2010 1080p", 1);
        let json = serde_json::to_value(assemble(&r, &magnet(&r), "Premiumize")).unwrap();
        assert!(json.get("name").is_some());
        assert!(json.get("title").is_some());
        assert_eq!(json["behaviorHints"]["notWebReady"], true);
        assert_eq!(json["qualityRank"], 4);
        assert!(json["meta"].get("error").is_none());
    }

    #[test]
    fn test_sort_streams() {
        let hd = record("Film 1080p", 5);
        let uhd = record("Film 2160p", 1);
        let popular_hd = record("Film 1080p Popular", 500);
        let errored = record("Film 2160p Broken", 900);

        let mut streams = vec![
            assemble(&popular_hd, &magnet(&popular_hd), "P"),
            assemble(
                &errored,
                &Availability {
                    error: Some("boom".to_string()),
                    ..magnet(&errored)
                },
                "P",
            ),
            assemble(&uhd, &magnet(&uhd), "P"),
            assemble(&hd, &cached(), "P"),
        ];
        sort_streams(&mut streams);

        let order: Vec<String> = streams
            .iter()
            .map(|s| s.display_title.lines().next().unwrap().to_string())
            .collect();
        assert_eq!(
            order,
            vec![
                "🎬 Film 1080p",
                "🎬 Film 2160p",
                "🎬 Film 1080p Popular",
                "🎬 Film 2160p Broken",
            ]
        );
    }
}
