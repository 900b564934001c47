//! Per-collection routing map cache.
//!
//! Routing maps are immutable, so the cache only ever swaps `Arc`s. Readers
//! clone the current `Arc` and keep using that snapshot for as long as they
//! like; a refresh installs a new map without disturbing them.
//!
//! Refreshes are computed outside the lock. [`RoutingMapCache::install_if_current`]
//! only installs when the map the refresh started from is still the current
//! one, so two racing refreshes cannot overwrite a newer map with an older one.

use crate::routing::map::RoutingMap;
use crate::routing::range::PartitionKeyRange;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Holds the current routing map of every known collection.
pub struct RoutingMapCache<T> {
    maps: RwLock<HashMap<String, Arc<RoutingMap<T>>>>,
}

impl<T> RoutingMapCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            maps: RwLock::new(HashMap::new()),
        }
    }

    /// Get the current map snapshot for a collection.
    pub fn get(&self, collection: &str) -> Option<Arc<RoutingMap<T>>> {
        self.maps.read().get(collection).cloned()
    }

    /// Install a map unconditionally, returning the one it replaced.
    pub fn install(
        &self,
        collection: impl Into<String>,
        map: Arc<RoutingMap<T>>,
    ) -> Option<Arc<RoutingMap<T>>> {
        let collection = collection.into();
        tracing::debug!(collection = %collection, ranges = map.len(), "routing map installed");
        self.maps.write().insert(collection, map)
    }

    /// Install a map only if the current one is `expected`.
    ///
    /// `expected == None` means the collection must not have a map yet.
    /// Returns whether the map was installed.
    pub fn install_if_current(
        &self,
        collection: &str,
        expected: Option<&Arc<RoutingMap<T>>>,
        map: Arc<RoutingMap<T>>,
    ) -> bool {
        let mut maps = self.maps.write();
        let is_current = match (maps.get(collection), expected) {
            (None, None) => true,
            (Some(current), Some(expected)) => Arc::ptr_eq(current, expected),
            _ => false,
        };

        if !is_current {
            tracing::debug!(collection = %collection, "routing map install lost race");
            return false;
        }

        tracing::debug!(collection = %collection, ranges = map.len(), "routing map installed");
        maps.insert(collection.to_string(), map);
        true
    }

    /// Drop the cached map for a collection.
    pub fn invalidate(&self, collection: &str) -> Option<Arc<RoutingMap<T>>> {
        let removed = self.maps.write().remove(collection);
        if removed.is_some() {
            tracing::info!(collection = %collection, "routing map invalidated");
        }
        removed
    }

    /// Check whether a range id is gone in the collection's current map.
    ///
    /// Unknown collections report `false`.
    pub fn is_gone(&self, collection: &str, range_id: &str) -> bool {
        self.get(collection)
            .is_some_and(|map| map.is_gone(range_id))
    }

    /// Get cache statistics.
    pub fn stats(&self) -> RoutingCacheStats {
        let maps = self.maps.read();
        RoutingCacheStats {
            collection_count: maps.len(),
            total_ranges: maps.values().map(|m| m.len()).sum(),
            total_gone_ranges: maps.values().map(|m| m.gone_range_ids.len()).sum(),
        }
    }
}

impl<T: Clone> RoutingMapCache<T> {
    /// Combine split/merge results into the current map and install the result.
    ///
    /// Returns the new map, or `None` when the collection has no map, the
    /// combine was rejected, or another refresh got there first. In every
    /// `None` case the caller should fall back to a full rebuild.
    pub fn try_combine_and_install(
        &self,
        collection: &str,
        new_ranges: &[(PartitionKeyRange, T)],
        change_feed_next_if_none_match: Option<String>,
    ) -> Option<Arc<RoutingMap<T>>> {
        let current = self.get(collection)?;
        let combined = Arc::new(current.try_combine(new_ranges, change_feed_next_if_none_match)?);
        self.install_if_current(collection, Some(&current), Arc::clone(&combined))
            .then_some(combined)
    }
}

impl<T> Default for RoutingMapCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingCacheStats {
    /// Number of collections with a map.
    pub collection_count: usize,
    /// Ranges across all maps.
    pub total_ranges: usize,
    /// Gone range ids across all maps.
    pub total_gone_ranges: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_range_map() -> Arc<RoutingMap<()>> {
        let ranges = vec![(PartitionKeyRange::new("0", "", "FF"), ())];
        Arc::new(RoutingMap::try_create_complete(&ranges, "coll", None).unwrap().unwrap())
    }

    #[test]
    fn install_if_current_rejects_stale_expectation() {
        let cache = RoutingMapCache::new();
        let first = single_range_map();
        assert!(cache.install_if_current("coll", None, Arc::clone(&first)));
        assert!(!cache.install_if_current("coll", None, single_range_map()));

        let stale = single_range_map();
        assert!(!cache.install_if_current("coll", Some(&stale), single_range_map()));

        let second = single_range_map();
        assert!(cache.install_if_current("coll", Some(&first), Arc::clone(&second)));
        assert!(Arc::ptr_eq(&cache.get("coll").unwrap(), &second));
    }

    #[test]
    fn readers_keep_their_snapshot() {
        let cache = RoutingMapCache::new();
        cache.install("coll", single_range_map());
        let snapshot = cache.get("coll").unwrap();

        let split = vec![
            (PartitionKeyRange::new("1", "", "80").with_parents(["0"]), ()),
            (PartitionKeyRange::new("2", "80", "FF").with_parents(["0"]), ()),
        ];
        let combined = cache.try_combine_and_install("coll", &split, None).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.is_gone("0"));
        assert_eq!(combined.len(), 2);
        assert!(cache.is_gone("coll", "0"));
        assert_eq!(
            cache.stats(),
            RoutingCacheStats {
                collection_count: 1,
                total_ranges: 2,
                total_gone_ranges: 1,
            }
        );
    }

    #[test]
    fn combine_without_map_or_with_bad_cover_returns_none() {
        let cache: RoutingMapCache<()> = RoutingMapCache::new();
        let child = vec![(PartitionKeyRange::new("1", "", "80").with_parents(["0"]), ())];
        assert!(cache.try_combine_and_install("coll", &child, None).is_none());

        cache.install("coll", single_range_map());
        assert!(cache.try_combine_and_install("coll", &child, None).is_none());
        assert_eq!(cache.get("coll").unwrap().len(), 1);
    }

    #[test]
    fn invalidate_removes_map() {
        let cache = RoutingMapCache::new();
        cache.install("coll", single_range_map());
        assert!(cache.invalidate("coll").is_some());
        assert!(cache.get("coll").is_none());
        assert!(!cache.is_gone("coll", "0"));
        assert!(cache.invalidate("coll").is_none());
    }
}
