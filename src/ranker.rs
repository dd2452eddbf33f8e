//! Validity filtering and quality-first ordering of candidate records.

use std::cmp::Reverse;

use crate::quality::quality_rank;
use crate::CandidateRecord;

/// Minimum info hash length accepted (base32 hashes are 32 chars).
pub const MIN_INFO_HASH_LEN: usize = 32;

/// Returns whether a record is fit to rank.
pub fn is_rankable(record: &CandidateRecord) -> bool {
    record.title.chars().count() > 3 && record.info_hash.len() >= MIN_INFO_HASH_LEN
}

/// Drops invalid records and sorts the rest.
///
/// Order: quality rank, then size, then seeders, all descending. Resolution
/// dominates size, which dominates popularity.
pub fn rank(records: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    let mut ranked: Vec<CandidateRecord> = records.into_iter().filter(is_rankable).collect();
    ranked.sort_by_key(|r| {
        (
            Reverse(quality_rank(&r.quality)),
            Reverse(r.size_bytes),
            Reverse(r.seeders),
        )
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(n: u8) -> String {
        format!("{:0>40}", n)
    }

    fn record(title: &str, size: &str, seeders: u32, n: u8) -> CandidateRecord {
        CandidateRecord::new(title, "magnet:?", hash(n))
            .with_size(size)
            .with_peers(seeders, 0)
    }

    fn titles(records: &[CandidateRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_quality_dominates_size_and_seeders() {
        let a = record("Movie A 1080p", "5 GB", 10, 1);
        let b = record("Movie B 720p", "10 GB", 100, 2);
        let ranked = rank(vec![b, a]);
        assert_eq!(titles(&ranked), vec!["Movie A 1080p", "Movie B 720p"]);
    }

    #[test]
    fn test_size_breaks_quality_tie() {
        let small = record("Small 1080p", "2 GB", 500, 1);
        let large = record("Large 1080p", "8 GB", 1, 2);
        let ranked = rank(vec![small, large]);
        assert_eq!(titles(&ranked), vec!["Large 1080p", "Small 1080p"]);
    }

    #[test]
    fn test_seeders_break_size_tie() {
        let few = record("Few 720p", "1 GB", 3, 1);
        let many = record("Many 720p", "1 GB", 30, 2);
        let ranked = rank(vec![few, many]);
        assert_eq!(titles(&ranked), vec!["Many 720p", "Few 720p"]);
    }

    #[test]
    fn test_remux_outranks_1080p() {
        let remux = record("Film REMUX", "1 GB", 1, 1);
        let hd = record("Film 1080p", "30 GB", 100, 2);
        let ranked = rank(vec![hd, remux]);
        assert_eq!(titles(&ranked), vec!["Film REMUX", "Film 1080p"]);
    }

    #[test]
    fn test_unranked_quality_sorts_last() {
        let cam = record("Film CAM", "9 GB", 900, 1);
        let sd = record("Film 480p", "1 GB", 1, 2);
        let ranked = rank(vec![cam, sd]);
        assert_eq!(titles(&ranked), vec!["Film 480p", "Film CAM"]);
    }

    #[test]
    fn test_filters_short_titles_and_hashes() {
        let short_title = record("Abc", "1 GB", 1, 1);
        let short_hash = CandidateRecord::new("Valid Title", "magnet:?", "ABC123");
        let good = record("Valid Title", "1 GB", 1, 3);
        let ranked = rank(vec![short_title, short_hash, good]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].info_hash, hash(3));
    }

    #[test]
    fn test_base32_hash_is_rankable() {
        let record = CandidateRecord::new("Valid Title", "magnet:?", "A".repeat(32));
        assert!(is_rankable(&record));
    }
}
