use crate::record::SightingRecord;
use log::info;
use std::collections::HashSet;

pub struct MergeOutcome {
    pub sightings: Vec<SightingRecord>,
    /// Incoming records that were not already present.
    pub added: usize,
}

/// Append every incoming sighting whose id is not yet present, keeping the
/// existing order first and the incoming order after it. Applying the same
/// batch twice adds nothing the second time.
pub fn merge_sightings(existing: &[SightingRecord], incoming: Vec<SightingRecord>) -> MergeOutcome {
    let mut seen: HashSet<String> = existing.iter().map(|s| s.id.clone()).collect();
    let mut sightings = existing.to_vec();

    let mut added = 0;
    for sighting in incoming {
        if seen.insert(sighting.id.clone()) {
            sightings.push(sighting);
            added += 1;
        }
    }

    info!("Added {} new sightings", added);
    MergeOutcome { sightings, added }
}

/// Drop repeated ids, keeping the first occurrence. Used where a batch becomes
/// the whole history without being merged into anything.
pub fn dedup(sightings: Vec<SightingRecord>) -> Vec<SightingRecord> {
    let mut seen = HashSet::new();
    sightings
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SightingBuilder;

    fn with_id(id: &str) -> SightingRecord {
        let mut record = SightingBuilder::new(format!("Bird {id}"), "2024-01-01T00:00:00Z").build();
        record.id = id.to_string();
        record
    }

    fn ids(sightings: &[SightingRecord]) -> Vec<&str> {
        sightings.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_merge_appends_only_new() {
        let existing = vec![with_id("a1")];
        let outcome = merge_sightings(&existing, vec![with_id("a1"), with_id("b2")]);
        assert_eq!(ids(&outcome.sightings), vec!["a1", "b2"]);
        assert_eq!(outcome.added, 1);
    }

    #[test]
    fn test_merge_dedups_within_batch() {
        let outcome = merge_sightings(&[], vec![with_id("c3"), with_id("d4"), with_id("c3")]);
        assert_eq!(ids(&outcome.sightings), vec!["c3", "d4"]);
        assert_eq!(outcome.added, 2);
    }

    #[test]
    fn test_merge_keeps_existing_version() {
        let mut old = with_id("a1");
        old.count = "1".into();
        let mut new = with_id("a1");
        new.count = "7".into();

        let outcome = merge_sightings(&[old], vec![new]);
        assert_eq!(outcome.sightings[0].count, "1");
        assert_eq!(outcome.added, 0);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let existing = vec![with_id("a1"), with_id("e5")];
        let batch = vec![with_id("b2"), with_id("a1"), with_id("f6")];

        let once = merge_sightings(&existing, batch.clone());
        let twice = merge_sightings(&once.sightings, batch);
        assert_eq!(once.sightings, twice.sightings);
        assert_eq!(twice.added, 0);
    }

    #[test]
    fn test_merge_is_monotone() {
        let existing = vec![with_id("a1"), with_id("b2")];
        let batch = vec![with_id("b2"), with_id("c3"), with_id("c3"), with_id("d4")];
        let outcome = merge_sightings(&existing, batch);

        for id in ["a1", "b2", "c3", "d4"] {
            assert_eq!(outcome.sightings.iter().filter(|s| s.id == id).count(), 1);
        }
        assert_eq!(ids(&outcome.sightings), vec!["a1", "b2", "c3", "d4"]);
    }

    #[test]
    fn test_same_four_fields_collapse() {
        let first = SightingBuilder::new("Blue Jay", "2024-01-01T00:00:00Z")
            .location("Park")
            .date("2024-01-01")
            .observer("Alice")
            .count("1")
            .build();
        let second = SightingBuilder::new("Blue Jay", "2024-01-01T00:00:00Z")
            .location("Park")
            .date("2024-01-01")
            .observer("Alice")
            .count("4")
            .build();

        let outcome = merge_sightings(&[], vec![first, second]);
        assert_eq!(outcome.sightings.len(), 1);
        assert_eq!(outcome.sightings[0].count, "1");
    }

    #[test]
    fn test_dedup() {
        let kept = dedup(vec![with_id("x"), with_id("y"), with_id("x")]);
        assert_eq!(ids(&kept), vec!["x", "y"]);
    }
}
