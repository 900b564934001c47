//! Partition key ranges and query ranges.
//!
//! Effective partition keys are upper-case hex strings ordered byte-wise. The
//! key space is `["", "FF")`. Stored partition key ranges are always
//! half-open; query ranges carry explicit inclusive flags on both ends.

use crate::core::error::{RoutingError, RoutingResult};
use serde::{Deserialize, Serialize};

/// Inclusive lower bound of the effective partition key space.
pub const MIN_INCLUSIVE_EFFECTIVE_PARTITION_KEY: &str = "";

/// Exclusive upper bound of the effective partition key space.
pub const MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY: &str = "FF";

/// A half-open interval `[min_inclusive, max_exclusive)` owned by one partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionKeyRange {
    /// Range identifier, unique within a routing map.
    pub id: String,
    /// Inclusive lower bound.
    pub min_inclusive: String,
    /// Exclusive upper bound.
    pub max_exclusive: String,
    /// Ids of the ranges this one was split or merged from, oldest first.
    #[serde(default)]
    pub parents: Vec<String>,
}

impl PartitionKeyRange {
    /// Create a range with no lineage.
    pub fn new(
        id: impl Into<String>,
        min_inclusive: impl Into<String>,
        max_exclusive: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            min_inclusive: min_inclusive.into(),
            max_exclusive: max_exclusive.into(),
            parents: Vec::new(),
        }
    }

    /// Attach split/merge lineage.
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether an effective partition key falls inside this range.
    pub fn contains(&self, key: &str) -> bool {
        self.min_inclusive.as_str() <= key && key < self.max_exclusive.as_str()
    }

    /// Check whether a query range intersects this range.
    pub fn overlaps(&self, query: &Range) -> bool {
        if query.is_empty() || self.min_inclusive >= self.max_exclusive {
            return false;
        }
        // Storage side is [min, max): its max never touches, its min always does.
        let lower_ok = match query.max.as_str().cmp(self.min_inclusive.as_str()) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => query.max_inclusive,
            std::cmp::Ordering::Less => false,
        };
        lower_ok && query.min.as_str() < self.max_exclusive.as_str()
    }
}

impl std::fmt::Display for PartitionKeyRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:[\"{}\", \"{}\")",
            self.id, self.min_inclusive, self.max_exclusive
        )
    }
}

/// A query interval over effective partition keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub min: String,
    pub max: String,
    pub min_inclusive: bool,
    pub max_inclusive: bool,
}

impl Range {
    /// Create a range with explicit bound flags.
    pub fn new(
        min: impl Into<String>,
        max: impl Into<String>,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
            min_inclusive,
            max_inclusive,
        }
    }

    /// Create a range, rejecting bounds that are out of order.
    ///
    /// Lookups treat an inverted range as empty; this is for input that
    /// should never be inverted in the first place.
    pub fn try_new(
        min: impl Into<String>,
        max: impl Into<String>,
        min_inclusive: bool,
        max_inclusive: bool,
    ) -> RoutingResult<Self> {
        let range = Self::new(min, max, min_inclusive, max_inclusive);
        if range.min > range.max {
            return Err(RoutingError::invalid_range(format!(
                "min {:?} is greater than max {:?}",
                range.min, range.max
            )));
        }
        Ok(range)
    }

    /// Create a `[min, max)` range.
    pub fn half_open(min: impl Into<String>, max: impl Into<String>) -> Self {
        Self::new(min, max, true, false)
    }

    /// Create a range matching exactly one key.
    pub fn point(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(value.clone(), value, true, true)
    }

    /// The whole effective partition key space.
    pub fn full() -> Self {
        Self::half_open(
            MIN_INCLUSIVE_EFFECTIVE_PARTITION_KEY,
            MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY,
        )
    }

    /// A range is empty when it contains no key at all.
    pub fn is_empty(&self) -> bool {
        match self.min.cmp(&self.max) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => !(self.min_inclusive && self.max_inclusive),
            std::cmp::Ordering::Less => false,
        }
    }

    /// Check if this range matches exactly one key.
    pub fn is_single_value(&self) -> bool {
        self.min_inclusive && self.max_inclusive && self.min == self.max
    }

    /// Check if a key falls inside this range.
    pub fn contains(&self, value: &str) -> bool {
        let min = self.min.as_str();
        let max = self.max.as_str();
        (self.min_inclusive && min == value)
            || (self.max_inclusive && max == value)
            || (min < value && value < max)
    }

    /// Check whether two ranges share at least one key.
    ///
    /// Touching bounds only count when both touching ends are inclusive.
    pub fn check_overlapping(a: &Range, b: &Range) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }

        let a_min_vs_b_max = a.min.cmp(&b.max);
        let b_min_vs_a_max = b.min.cmp(&a.max);

        if a_min_vs_b_max.is_gt() || b_min_vs_a_max.is_gt() {
            return false;
        }
        if a_min_vs_b_max.is_eq() && !(a.min_inclusive && b.max_inclusive) {
            return false;
        }
        if b_min_vs_a_max.is_eq() && !(b.min_inclusive && a.max_inclusive) {
            return false;
        }
        true
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\"{}\", \"{}\"{}",
            if self.min_inclusive { '[' } else { '(' },
            self.min,
            self.max,
            if self.max_inclusive { ']' } else { ')' }
        )
    }
}

/// Check that query ranges are ascending and pairwise disjoint.
pub fn is_sorted_and_non_overlapping(ranges: &[Range]) -> bool {
    ranges.windows(2).all(|pair| {
        let (prev, next) = (&pair[0], &pair[1]);
        match prev.max.cmp(&next.min) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Equal => !(prev.max_inclusive && next.min_inclusive),
            std::cmp::Ordering::Greater => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ranges() {
        assert!(Range::half_open("05", "05").is_empty());
        assert!(Range::new("05", "05", false, true).is_empty());
        assert!(Range::half_open("10", "05").is_empty());
        assert!(!Range::point("05").is_empty());
        assert!(Range::point("05").is_single_value());
        assert!(!Range::full().is_empty());
    }

    #[test]
    fn try_new_rejects_inverted_bounds() {
        let err = Range::try_new("20", "10", true, false).unwrap_err();
        assert!(matches!(err, RoutingError::InvalidRange { .. }));
        assert!(Range::try_new("10", "10", true, true).is_ok());
    }

    #[test]
    fn contains_honours_flags() {
        let r = Range::new("10", "20", false, true);
        assert!(!r.contains("10"));
        assert!(r.contains("15"));
        assert!(r.contains("20"));
        assert!(!r.contains("21"));
    }

    #[test]
    fn touching_ranges_overlap_only_when_both_inclusive() {
        let left = Range::half_open("00", "10");
        let right = Range::half_open("10", "20");
        assert!(!Range::check_overlapping(&left, &right));

        let left_closed = Range::new("00", "10", true, true);
        assert!(Range::check_overlapping(&left_closed, &right));
        assert!(Range::check_overlapping(&right, &left_closed));

        let far = Range::half_open("30", "40");
        assert!(!Range::check_overlapping(&left, &far));
    }

    #[test]
    fn partition_key_range_overlap_with_query_flags() {
        let pkr = PartitionKeyRange::new("1", "10", "20");

        // Query ending exactly at the stored min only touches when inclusive.
        assert!(!pkr.overlaps(&Range::half_open("05", "10")));
        assert!(pkr.overlaps(&Range::new("05", "10", true, true)));

        // Stored max is exclusive whatever the query says.
        assert!(!pkr.overlaps(&Range::new("20", "30", true, true)));
        assert!(pkr.overlaps(&Range::new("1F", "30", false, false)));

        assert!(pkr.overlaps(&Range::point("10")));
        assert!(!pkr.overlaps(&Range::point("20")));
        assert!(!pkr.overlaps(&Range::half_open("15", "15")));
    }

    #[test]
    fn partition_key_range_contains_lower_bound_only() {
        let pkr = PartitionKeyRange::new("1", "10", "20");
        assert!(pkr.contains("10"));
        assert!(pkr.contains("1FFF"));
        assert!(!pkr.contains("20"));
        assert!(!pkr.contains("0F"));
    }

    #[test]
    fn sorted_and_non_overlapping() {
        let ok = vec![Range::half_open("00", "10"), Range::half_open("10", "20")];
        assert!(is_sorted_and_non_overlapping(&ok));

        let touching = vec![
            Range::new("00", "10", true, true),
            Range::half_open("10", "20"),
        ];
        assert!(!is_sorted_and_non_overlapping(&touching));

        let unsorted = vec![Range::half_open("10", "20"), Range::half_open("00", "05")];
        assert!(!is_sorted_and_non_overlapping(&unsorted));
    }

    #[test]
    fn deserializes_camel_case() {
        let json = r#"{"id":"3","minInclusive":"10","maxExclusive":"FF","parents":["0"]}"#;
        let pkr: PartitionKeyRange = serde_json::from_str(json).unwrap();
        assert_eq!(pkr, PartitionKeyRange::new("3", "10", "FF").with_parents(["0"]));

        let no_parents = r#"{"id":"4","minInclusive":"","maxExclusive":"10"}"#;
        let pkr: PartitionKeyRange = serde_json::from_str(no_parents).unwrap();
        assert!(pkr.parents.is_empty());
    }
}
