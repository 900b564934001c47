//! Immutable routing map for one collection.
//!
//! A routing map is a complete assignment of the effective partition key
//! space to partition key ranges:
//!
//! - ranges are sorted by `min_inclusive`
//! - adjacent ranges share a boundary (no gaps, no overlaps)
//! - the first range starts at `""` and the last one ends at `"FF"`
//!
//! Maps are only produced by [`RoutingMap::try_create_complete`] and
//! [`RoutingMap::try_combine`], both of which enforce these invariants, so
//! lookups never have to handle holes.

use crate::routing::range::{PartitionKeyRange, Range, MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Complete, gap-free assignment of key ranges to owners.
///
/// `T` is an opaque owner identity (for example a server address set) and is
/// only stored and handed back.
#[derive(Debug, Clone)]
pub struct RoutingMap<T> {
    /// Ranges with their owners, sorted by `min_inclusive`.
    pub(crate) entries: Vec<(PartitionKeyRange, T)>,

    /// Range id to position in `entries`.
    pub(crate) index_by_id: HashMap<String, usize>,

    /// Ids superseded by splits or merges anywhere in this map's lineage.
    pub(crate) gone_range_ids: HashSet<String>,

    /// Identifier of the collection this map belongs to.
    pub(crate) collection_unique_id: String,

    /// Change feed continuation to use for the next incremental fetch.
    pub(crate) change_feed_next_if_none_match: Option<String>,
}

impl<T> RoutingMap<T> {
    /// Build a map from entries already verified to be sorted and complete.
    pub(crate) fn from_sorted_entries(
        entries: Vec<(PartitionKeyRange, T)>,
        gone_range_ids: HashSet<String>,
        collection_unique_id: String,
        change_feed_next_if_none_match: Option<String>,
    ) -> Self {
        let index_by_id = entries
            .iter()
            .enumerate()
            .map(|(i, (range, _))| (range.id.clone(), i))
            .collect();
        Self {
            entries,
            index_by_id,
            gone_range_ids,
            collection_unique_id,
            change_feed_next_if_none_match,
        }
    }

    /// Identifier of the owning collection.
    pub fn collection_unique_id(&self) -> &str {
        &self.collection_unique_id
    }

    /// Continuation token for the next incremental metadata fetch.
    pub fn change_feed_next_if_none_match(&self) -> Option<&str> {
        self.change_feed_next_if_none_match.as_deref()
    }

    /// Number of ranges in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a map built through the public constructors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranges in ascending key order.
    pub fn ordered_ranges(&self) -> impl ExactSizeIterator<Item = &PartitionKeyRange> {
        self.entries.iter().map(|(range, _)| range)
    }

    /// Ranges with their owners in ascending key order.
    pub fn ordered_entries(&self) -> impl ExactSizeIterator<Item = (&PartitionKeyRange, &T)> {
        self.entries.iter().map(|(range, owner)| (range, owner))
    }

    /// Find the range owning an effective partition key.
    ///
    /// A key equal to a shared boundary belongs to the range starting there.
    /// Keys at or beyond the exclusive maximum have no owner.
    pub fn get_range_by_effective_partition_key(&self, key: &str) -> Option<&PartitionKeyRange> {
        self.position_of_key(key).map(|i| &self.entries[i].0)
    }

    /// Find the owner of an effective partition key.
    pub fn get_owner_by_effective_partition_key(&self, key: &str) -> Option<&T> {
        self.position_of_key(key).map(|i| &self.entries[i].1)
    }

    fn position_of_key(&self, key: &str) -> Option<usize> {
        if self.entries.is_empty() || key >= MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY {
            return None;
        }
        let after = self
            .entries
            .partition_point(|(range, _)| range.min_inclusive.as_str() <= key);
        Some(after.saturating_sub(1))
    }

    /// Look up a range by id.
    pub fn get_range_by_id(&self, range_id: &str) -> Option<&PartitionKeyRange> {
        self.index_by_id
            .get(range_id)
            .map(|&i| &self.entries[i].0)
    }

    /// Look up the owner of a range by id.
    pub fn get_owner_by_id(&self, range_id: &str) -> Option<&T> {
        self.index_by_id
            .get(range_id)
            .map(|&i| &self.entries[i].1)
    }

    /// Ranges intersecting a single query range, ascending.
    pub fn get_overlapping_range(&self, query: &Range) -> Vec<&PartitionKeyRange> {
        self.get_overlapping_ranges(std::slice::from_ref(query))
    }

    /// Ranges intersecting any of the query ranges, ascending and without duplicates.
    pub fn get_overlapping_ranges(&self, queries: &[Range]) -> Vec<&PartitionKeyRange> {
        let mut found: BTreeMap<&str, usize> = BTreeMap::new();

        for query in queries {
            if query.is_empty() {
                continue;
            }

            let start = self
                .entries
                .partition_point(|(range, _)| range.min_inclusive <= query.min)
                .saturating_sub(1);

            for (offset, (range, _)) in self.entries[start..].iter().enumerate() {
                if range.min_inclusive > query.max {
                    break;
                }
                if range.overlaps(query) {
                    found.insert(range.min_inclusive.as_str(), start + offset);
                }
            }
        }

        found.into_values().map(|i| &self.entries[i].0).collect()
    }

    /// Check whether a range id was superseded by a split or merge.
    pub fn is_gone(&self, range_id: &str) -> bool {
        self.gone_range_ids.contains(range_id)
    }

    /// All superseded range ids.
    pub fn gone_range_ids(&self) -> impl Iterator<Item = &str> {
        self.gone_range_ids.iter().map(String::as_str)
    }
}
