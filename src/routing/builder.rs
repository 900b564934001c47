//! Routing map construction from partition metadata.
//!
//! Two entry points:
//! - [`RoutingMap::try_create_complete`] builds a map from a full listing
//! - [`RoutingMap::try_combine`] layers split/merge children over an
//!   existing map
//!
//! Both distinguish between corrupted metadata (overlapping ranges), which is
//! an error, and metadata that simply does not cover the whole key space yet,
//! which yields `None` so the caller can fetch again.

use crate::core::error::{RoutingError, RoutingResult};
use crate::routing::map::RoutingMap;
use crate::routing::range::{
    PartitionKeyRange, MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY,
    MIN_INCLUSIVE_EFFECTIVE_PARTITION_KEY,
};
use std::collections::{HashMap, HashSet};

/// Outcome of checking a sorted range list against the key space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    /// Ranges tile `["", "FF")` exactly.
    Complete,
    /// No ranges at all.
    Empty,
    /// Part of the key space is not covered.
    Gap { after: String, before: String },
    /// Two ranges claim the same keys.
    Overlap { left: String, right: String },
}

/// Check a list of ranges sorted by `min_inclusive` for completeness.
///
/// Overlaps anywhere in the list win over gaps, so corrupt metadata is
/// never reported as merely incomplete.
pub fn check_coverage(sorted: &[&PartitionKeyRange]) -> Coverage {
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Coverage::Empty;
    };

    let mut first_gap = None;
    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if prev.min_inclusive >= prev.max_exclusive {
            return Coverage::Overlap {
                left: prev.id.clone(),
                right: next.id.clone(),
            };
        }
        match prev.max_exclusive.cmp(&next.min_inclusive) {
            std::cmp::Ordering::Greater => {
                return Coverage::Overlap {
                    left: prev.id.clone(),
                    right: next.id.clone(),
                }
            }
            std::cmp::Ordering::Less if first_gap.is_none() => {
                first_gap = Some(Coverage::Gap {
                    after: prev.max_exclusive.clone(),
                    before: next.min_inclusive.clone(),
                });
            }
            std::cmp::Ordering::Less | std::cmp::Ordering::Equal => {}
        }
    }

    if last.min_inclusive >= last.max_exclusive
        || last.max_exclusive.as_str() > MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY
    {
        return Coverage::Overlap {
            left: last.id.clone(),
            right: MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY.to_string(),
        };
    }
    if first.min_inclusive != MIN_INCLUSIVE_EFFECTIVE_PARTITION_KEY {
        return Coverage::Gap {
            after: MIN_INCLUSIVE_EFFECTIVE_PARTITION_KEY.to_string(),
            before: first.min_inclusive.clone(),
        };
    }
    if let Some(gap) = first_gap {
        return gap;
    }
    if last.max_exclusive != MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY {
        return Coverage::Gap {
            after: last.max_exclusive.clone(),
            before: MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY.to_string(),
        };
    }
    Coverage::Complete
}

fn sort_by_min<T>(entries: &mut [(PartitionKeyRange, T)]) {
    entries.sort_by(|(a, _), (b, _)| {
        a.min_inclusive
            .cmp(&b.min_inclusive)
            .then_with(|| a.max_exclusive.cmp(&b.max_exclusive))
    });
}

impl<T: Clone> RoutingMap<T> {
    /// Build a routing map from an unordered full listing of ranges.
    ///
    /// Returns `Ok(None)` when the ranges leave part of the key space
    /// uncovered and `Err(InvalidRoutingMap)` when they overlap or repeat an id.
    pub fn try_create_complete(
        ranges: &[(PartitionKeyRange, T)],
        collection_unique_id: &str,
        change_feed_next_if_none_match: Option<String>,
    ) -> RoutingResult<Option<Self>> {
        let mut seen = HashSet::with_capacity(ranges.len());
        for (range, _) in ranges {
            if !seen.insert(range.id.as_str()) {
                return Err(RoutingError::invalid_routing_map(
                    collection_unique_id,
                    format!("duplicate partition key range id {}", range.id),
                ));
            }
        }

        let mut entries = ranges.to_vec();
        sort_by_min(&mut entries);

        let sorted: Vec<&PartitionKeyRange> = entries.iter().map(|(r, _)| r).collect();
        match check_coverage(&sorted) {
            Coverage::Complete => {}
            Coverage::Overlap { left, right } => {
                tracing::error!(
                    collection = %collection_unique_id,
                    left = %left,
                    right = %right,
                    "partition key ranges overlap"
                );
                return Err(RoutingError::invalid_routing_map(
                    collection_unique_id,
                    format!("ranges {} and {} overlap", left, right),
                ));
            }
            Coverage::Gap { after, before } => {
                tracing::debug!(
                    collection = %collection_unique_id,
                    after = %after,
                    before = %before,
                    "partition key ranges incomplete"
                );
                return Ok(None);
            }
            Coverage::Empty => {
                tracing::debug!(collection = %collection_unique_id, "no partition key ranges");
                return Ok(None);
            }
        }

        tracing::debug!(
            collection = %collection_unique_id,
            ranges = entries.len(),
            "routing map built"
        );

        Ok(Some(Self::from_sorted_entries(
            entries,
            HashSet::new(),
            collection_unique_id.to_string(),
            change_feed_next_if_none_match,
        )))
    }

    /// Layer split/merge results over this map.
    ///
    /// Every parent id named by the new ranges becomes gone and is dropped.
    /// The new ranges must exactly cover what their parents covered; on any
    /// gap or overlap this returns `None` and `self` is left as it was.
    pub fn try_combine(
        &self,
        new_ranges: &[(PartitionKeyRange, T)],
        change_feed_next_if_none_match: Option<String>,
    ) -> Option<Self> {
        let mut gone_range_ids = self.gone_range_ids.clone();
        gone_range_ids.extend(
            new_ranges
                .iter()
                .flat_map(|(range, _)| range.parents.iter().cloned()),
        );

        let mut by_id: HashMap<String, (PartitionKeyRange, T)> = self
            .entries
            .iter()
            .filter(|(range, _)| !gone_range_ids.contains(&range.id))
            .map(|entry| (entry.0.id.clone(), entry.clone()))
            .collect();

        for entry in new_ranges {
            if !gone_range_ids.contains(&entry.0.id) {
                by_id.insert(entry.0.id.clone(), entry.clone());
            }
        }

        let mut entries: Vec<(PartitionKeyRange, T)> = by_id.into_values().collect();
        sort_by_min(&mut entries);

        let sorted: Vec<&PartitionKeyRange> = entries.iter().map(|(r, _)| r).collect();
        let coverage = check_coverage(&sorted);
        if coverage != Coverage::Complete {
            tracing::warn!(
                collection = %self.collection_unique_id,
                new_ranges = new_ranges.len(),
                coverage = ?coverage,
                "rejected routing map combine"
            );
            return None;
        }

        tracing::debug!(
            collection = %self.collection_unique_id,
            ranges = entries.len(),
            gone = gone_range_ids.len(),
            "routing map combined"
        );

        Some(Self::from_sorted_entries(
            entries,
            gone_range_ids,
            self.collection_unique_id.clone(),
            change_feed_next_if_none_match.or_else(|| self.change_feed_next_if_none_match.clone()),
        ))
    }
}

/// Build a routing map from an unordered full listing of ranges.
///
/// See [`RoutingMap::try_create_complete`].
pub fn try_create_complete_routing_map<T: Clone>(
    ranges: &[(PartitionKeyRange, T)],
    collection_unique_id: &str,
) -> RoutingResult<Option<RoutingMap<T>>> {
    RoutingMap::try_create_complete(ranges, collection_unique_id, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkr(id: &str, min: &str, max: &str) -> PartitionKeyRange {
        PartitionKeyRange::new(id, min, max)
    }

    #[test]
    fn coverage_detects_each_case() {
        let a = pkr("a", "", "10");
        let b = pkr("b", "10", "FF");
        assert_eq!(check_coverage(&[&a, &b]), Coverage::Complete);
        assert_eq!(check_coverage(&[]), Coverage::Empty);

        let c = pkr("c", "20", "FF");
        assert!(matches!(check_coverage(&[&a, &c]), Coverage::Gap { .. }));

        let d = pkr("d", "05", "FF");
        assert!(matches!(check_coverage(&[&a, &d]), Coverage::Overlap { .. }));

        let tail = pkr("t", "10", "F0");
        assert!(matches!(check_coverage(&[&a, &tail]), Coverage::Gap { .. }));

        let head = pkr("h", "01", "10");
        assert!(matches!(check_coverage(&[&head, &b]), Coverage::Gap { .. }));
    }

    #[test]
    fn overlap_after_gap_is_overlap() {
        let a = pkr("0", "", "10");
        let b = pkr("1", "20", "30");
        let c = pkr("2", "25", "FF");
        assert_eq!(
            check_coverage(&[&a, &b, &c]),
            Coverage::Overlap {
                left: "1".to_string(),
                right: "2".to_string(),
            }
        );
    }

    #[test]
    fn inverted_range_is_overlap() {
        let a = pkr("a", "", "10");
        let inverted = pkr("x", "10", "10");
        let b = pkr("b", "10", "FF");
        assert!(matches!(
            check_coverage(&[&a, &inverted, &b]),
            Coverage::Overlap { .. }
        ));
    }

    #[test]
    fn create_sorts_input() {
        let ranges = vec![
            (pkr("2", "0000000050", "FF"), "s2"),
            (pkr("0", "", "0000000030"), "s0"),
            (pkr("1", "0000000030", "0000000050"), "s1"),
        ];
        let map = try_create_complete_routing_map(&ranges, "coll").unwrap().unwrap();
        let ids: Vec<_> = map.ordered_ranges().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(map.get_owner_by_id("1"), Some(&"s1"));
    }

    #[test]
    fn create_rejects_duplicate_ids() {
        let ranges = vec![(pkr("0", "", "10"), ()), (pkr("0", "10", "FF"), ())];
        let err = try_create_complete_routing_map(&ranges, "coll").unwrap_err();
        assert!(err.is_data_corruption());
    }

    #[test]
    fn create_empty_is_incomplete() {
        let ranges: Vec<(PartitionKeyRange, ())> = Vec::new();
        assert!(try_create_complete_routing_map(&ranges, "coll").unwrap().is_none());
    }

    #[test]
    fn combine_keeps_continuation_when_none_given() {
        let ranges = vec![(pkr("0", "", "FF"), ())];
        let map = RoutingMap::try_create_complete(&ranges, "coll", Some("etag-1".to_string()))
            .unwrap()
            .unwrap();

        let children = vec![
            (pkr("1", "", "80").with_parents(["0"]), ()),
            (pkr("2", "80", "FF").with_parents(["0"]), ()),
        ];
        let combined = map.try_combine(&children, None).unwrap();
        assert_eq!(combined.change_feed_next_if_none_match(), Some("etag-1"));

        let combined = map
            .try_combine(&children, Some("etag-2".to_string()))
            .unwrap();
        assert_eq!(combined.change_feed_next_if_none_match(), Some("etag-2"));
    }
}
