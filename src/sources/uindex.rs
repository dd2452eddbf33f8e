//! UIndex torrent listing.
//!
//! Scrapes the server-rendered search page of uindex.org. Each result is a
//! table row: category, name (magnet icon + details link), size, age,
//! seeders, leechers.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::extract::{element_text, leading_number, looks_like_listing, ListingParser, MAGNET_MARKER};
use crate::fetcher::PageFetcher;
use crate::record::{extract_info_hash, UNKNOWN_SIZE};
use crate::{CandidateRecord, ListingSource, Result, SourceConfig};

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static MAGNET_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href^="magnet:?xt=urn:btih:"]"#).unwrap());

static SIZE_LABEL: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?i)([\d.,]+\s*(?:KiB|MiB|GiB|TiB|KB|MB|GB|TB|B))").unwrap()
});

/// Why a row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowSkip {
    NoMagnet,
    TooFewCells(usize),
    ShortTitle,
    NoInfoHash,
}

/// Parser for UIndex result pages.
#[derive(Debug, Clone)]
pub struct UIndexParser {
    source_tag: String,
}

impl UIndexParser {
    /// Creates a parser that stamps records with `source_tag`.
    pub fn new(source_tag: impl Into<String>) -> Self {
        Self {
            source_tag: source_tag.into(),
        }
    }

    fn parse_row(&self, row: ElementRef<'_>) -> std::result::Result<CandidateRecord, RowSkip> {
        let magnet = row
            .select(&MAGNET_ANCHOR)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
            .ok_or(RowSkip::NoMagnet)?;

        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "td")
            .collect();

        if cells.len() < 3 {
            return Err(RowSkip::TooFewCells(cells.len()));
        }

        let title = title_from_cell(cells[1]);
        if title.chars().count() < 3 {
            return Err(RowSkip::ShortTitle);
        }

        let size_text = element_text(cells[2]);
        let size_label = SIZE_LABEL
            .captures(&size_text)
            .map(|caps| caps[1].trim().to_string())
            .unwrap_or_else(|| UNKNOWN_SIZE.to_string());

        let category = cells[0]
            .select(&ANCHOR)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let seeders = cells.get(4).map(|c| leading_number(&element_text(*c))).unwrap_or(0);
        let leechers = cells.get(5).map(|c| leading_number(&element_text(*c))).unwrap_or(0);

        let info_hash = extract_info_hash(&magnet).ok_or(RowSkip::NoInfoHash)?;

        Ok(CandidateRecord::new(title, magnet, info_hash)
            .with_size(size_label)
            .with_category(category)
            .with_peers(seeders, leechers)
            .with_source(self.source_tag.clone()))
    }
}

/// Picks the release name out of the name cell.
///
/// Preference: the details-page link, then the second text anchor, then the
/// only text anchor.
fn title_from_cell(cell: ElementRef<'_>) -> String {
    let anchors: Vec<(Option<&str>, String)> = cell
        .select(&ANCHOR)
        .map(|a| (a.value().attr("href"), element_text(a)))
        .filter(|(_, text)| !text.is_empty())
        .collect();

    if let Some((_, text)) = anchors
        .iter()
        .find(|(href, _)| href.is_some_and(|h| h.contains("details.php")))
    {
        return text.clone();
    }

    match anchors.len() {
        0 => String::new(),
        1 => anchors[0].1.clone(),
        _ => anchors[1].1.clone(),
    }
}

impl ListingParser for UIndexParser {
    fn parse_listing(&self, markup: &str) -> Vec<CandidateRecord> {
        let document = Html::parse_document(markup);
        let mut records = Vec::new();

        let rows: Vec<ElementRef<'_>> = document
            .select(&ROW)
            .filter(|row| {
                let html = row.html();
                html.contains(MAGNET_MARKER) && html.contains("<td")
            })
            .collect();

        debug!("Processing {} potential torrent rows", rows.len());

        for (index, row) in rows.into_iter().enumerate() {
            match self.parse_row(row) {
                Ok(record) => records.push(record),
                Err(reason) => debug!("Skipping row {}: {:?}", index, reason),
            }
        }

        debug!("Parsed {} torrents", records.len());
        records
    }
}

/// UIndex listing source.
pub struct UIndex {
    config: SourceConfig,
    fetcher: Arc<dyn PageFetcher>,
    parser: UIndexParser,
}

impl UIndex {
    /// Creates a UIndex source that fetches pages through `fetcher`.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_config(fetcher, SourceConfig::default())
    }

    /// Creates with custom configuration.
    pub fn with_config(fetcher: Arc<dyn PageFetcher>, config: SourceConfig) -> Self {
        let parser = UIndexParser::new(config.name.clone());
        Self {
            config,
            fetcher,
            parser,
        }
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search.php?search={}&c=0",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl ListingSource for UIndex {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn search(&self, query: &str) -> Result<Vec<CandidateRecord>> {
        let url = self.search_url(query);
        debug!("Searching {} for \"{}\"", self.config.name, query);

        let html = self.fetcher.fetch(&url).await?;

        if !looks_like_listing(&html) {
            debug!("Page doesn't contain expected torrent table");
            return Ok(Vec::new());
        }

        Ok(self.parser.parse_listing(&html))
    }
}
