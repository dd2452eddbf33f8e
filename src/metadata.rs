//! Content identifiers and the metadata lookup seam.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::matcher::MatchContext;
use crate::{ContentType, Result, ScoutError};

/// Canonical details of a title, as returned by a metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDetails {
    pub title: String,
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub content_type: ContentType,
}

impl fmt::Display for MediaDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({})", self.title, year),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Resolves an IMDb id to canonical title details.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Looks up `imdb_id`; `Ok(None)` means the id is unknown.
    async fn lookup(&self, imdb_id: &str) -> Result<Option<MediaDetails>>;
}

/// Episode coordinates of a series request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Episode {
    pub season: u32,
    pub episode: u32,
}

/// A parsed `(type, id)` stream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub content_type: ContentType,
    pub imdb_id: String,
    pub episode: Option<Episode>,
}

/// Normalizes an IMDb id: `tt`-prefixed ids pass, bare digits gain the prefix.
pub fn normalize_imdb_id(id: &str) -> Option<String> {
    if id.starts_with("tt") {
        Some(id.to_string())
    } else if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("tt{}", id))
    } else {
        None
    }
}

impl ContentRequest {
    /// Parses a content id for `content_type`.
    ///
    /// Movie ids are IMDb ids. Series ids are `<imdb>:<season>:<episode>` and
    /// must carry both numbers.
    pub fn parse(content_type: ContentType, id: &str) -> Result<Self> {
        let (raw_id, episode) = match content_type {
            ContentType::Movie => (id, None),
            ContentType::Series => {
                let mut parts = id.split(':');
                let raw_id = parts.next().unwrap_or_default();
                let season = parse_number(parts.next(), "season", id)?;
                let episode = parse_number(parts.next(), "episode", id)?;
                (raw_id, Some(Episode { season, episode }))
            }
        };

        let imdb_id = normalize_imdb_id(raw_id)
            .ok_or_else(|| ScoutError::InvalidContentId(format!("'{}' is not an IMDb id", raw_id)))?;

        Ok(Self {
            content_type,
            imdb_id,
            episode,
        })
    }

    /// Builds the listing search query for resolved `details`.
    pub fn search_query(&self, details: &MediaDetails) -> String {
        let mut query = match details.year {
            Some(year) => format!("{} {}", details.title, year),
            None => details.title.clone(),
        };
        if let Some(Episode { season, episode }) = self.episode {
            query.push_str(&format!(" S{:02}E{:02}", season, episode));
        }
        query
    }

    /// Builds the matcher context for resolved `details`.
    pub fn match_context(&self, details: &MediaDetails) -> MatchContext {
        match self.episode {
            Some(Episode { season, episode }) => MatchContext::Series {
                title: details.title.clone(),
                season,
                episode,
            },
            None => MatchContext::Movie {
                title: details.title.clone(),
                year: details.year,
            },
        }
    }
}

fn parse_number(part: Option<&str>, what: &str, id: &str) -> Result<u32> {
    part.filter(|p| !p.is_empty())
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| ScoutError::InvalidContentId(format!("missing {} in series id '{}'", what, id)))
}
