//! Regional endpoint cache.
//!
//! Tracks which regional endpoints serve reads and writes, in the order the
//! client should try them, and demotes endpoints that recently failed.
//!
//! # Ordering
//!
//! Read endpoints follow the preferred location list, with regions the client
//! did not list appended in the account's order. Write endpoints follow the
//! same rule only when multi-region writes are in effect; otherwise they keep
//! the account's order so the write hub stays first.
//!
//! # Unavailability
//!
//! A failed endpoint is demoted to the back of its list until its TTL
//! passes. Expiry is evaluated when a list is read; nothing runs in the
//! background. A demoted endpoint is never dropped, so a full outage still
//! yields a non-empty list.
//!
//! # Concurrency
//!
//! The topology lives in an `Arc` snapshot replaced wholesale under a write
//! lock, so readers see either the old or the new topology and never a mix.
//! Getters only take read locks, plus a short write lock when they find
//! expired entries to prune.

use crate::core::config::LocationConfig;
use crate::core::time::{Clock, SystemClock, Tick};
use crate::location::request::{OperationKind, ServiceRequest};
use crate::location::topology::{AccountRegion, DatabaseAccount};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default time an endpoint stays demoted after a failure.
pub const DEFAULT_UNAVAILABLE_TTL: Duration = Duration::from_secs(5 * 60);

/// Static settings of a location cache.
#[derive(Debug, Clone)]
pub struct LocationCacheOptions {
    /// Endpoint used when discovery is off or no region is known.
    pub default_endpoint: Url,
    /// Regions in order of preference.
    pub preferred_locations: Vec<String>,
    /// Whether account regions are used at all.
    pub enable_endpoint_discovery: bool,
    /// Whether the client wants to write to any write region.
    pub use_multiple_write_locations: bool,
    /// How long a failed endpoint stays demoted.
    pub unavailable_ttl: Duration,
}

impl LocationCacheOptions {
    /// Options with discovery on, single-region writes and the default TTL.
    pub fn new(default_endpoint: Url) -> Self {
        Self {
            default_endpoint,
            preferred_locations: Vec::new(),
            enable_endpoint_discovery: true,
            use_multiple_write_locations: false,
            unavailable_ttl: DEFAULT_UNAVAILABLE_TTL,
        }
    }

    /// Build options from configuration.
    pub fn from_config(config: &LocationConfig) -> anyhow::Result<Self> {
        Ok(Self {
            default_endpoint: config.default_endpoint_url()?,
            preferred_locations: config.preferred_locations.clone(),
            enable_endpoint_discovery: config.enable_endpoint_discovery,
            use_multiple_write_locations: config.use_multiple_write_locations,
            unavailable_ttl: config.unavailable_ttl(),
        })
    }
}

/// Result of [`LocationCache::should_refresh_endpoints`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshDecision {
    /// The topology should be fetched again.
    pub should_refresh: bool,
    /// Traffic can continue on another endpoint while the refresh runs.
    pub can_refresh_in_background: bool,
}

impl RefreshDecision {
    const NONE: Self = Self {
        should_refresh: false,
        can_refresh_in_background: true,
    };

    fn refresh(endpoint_count: usize) -> Self {
        Self {
            should_refresh: true,
            can_refresh_in_background: endpoint_count > 1,
        }
    }
}

/// Topology snapshot, replaced as a whole.
#[derive(Debug, Default)]
struct LocationsInfo {
    preferred_locations: Vec<String>,
    account: DatabaseAccount,
    /// Write region names, in selection order.
    write_locations: Vec<String>,
    /// Read region names, in selection order.
    read_locations: Vec<String>,
    write_endpoint_by_location: HashMap<String, Url>,
    read_endpoint_by_location: HashMap<String, Url>,
    write_endpoints: Vec<Url>,
    read_endpoints: Vec<Url>,
}

impl LocationsInfo {
    fn build(
        account: DatabaseAccount,
        preferred_locations: Vec<String>,
        order_writes_by_preference: bool,
    ) -> Self {
        let write_order: &[String] = if order_writes_by_preference {
            &preferred_locations
        } else {
            &[]
        };
        let (write_locations, write_endpoint_by_location, write_endpoints) =
            order_regions(&account.writable_locations, write_order);
        let (read_locations, read_endpoint_by_location, read_endpoints) =
            order_regions(&account.readable_locations, &preferred_locations);

        Self {
            preferred_locations,
            account,
            write_locations,
            read_locations,
            write_endpoint_by_location,
            read_endpoint_by_location,
            write_endpoints,
            read_endpoints,
        }
    }

    fn has_topology(&self) -> bool {
        !self.write_endpoints.is_empty() || !self.read_endpoints.is_empty()
    }
}

/// Order regions by preference, then the rest in account order.
///
/// Repeated region names keep their first occurrence.
fn order_regions(
    regions: &[AccountRegion],
    preferred: &[String],
) -> (Vec<String>, HashMap<String, Url>, Vec<Url>) {
    let mut by_location: HashMap<String, Url> = HashMap::with_capacity(regions.len());
    let mut account_order: Vec<&str> = Vec::with_capacity(regions.len());
    for region in regions {
        if !by_location.contains_key(&region.name) {
            by_location.insert(region.name.clone(), region.database_account_endpoint.clone());
            account_order.push(&region.name);
        }
    }

    let mut names: Vec<String> = preferred
        .iter()
        .filter(|name| by_location.contains_key(name.as_str()))
        .cloned()
        .collect();
    for name in account_order {
        if !preferred.iter().any(|p| p == name) {
            names.push(name.to_string());
        }
    }

    let endpoints = names
        .iter()
        .filter_map(|name| by_location.get(name).cloned())
        .collect();
    (names, by_location, endpoints)
}

/// Endpoint -> expiry of its demotion.
#[derive(Debug, Default)]
struct Unavailability {
    read: HashMap<Url, Tick>,
    write: HashMap<Url, Tick>,
}

impl Unavailability {
    fn for_kind(&self, kind: OperationKind) -> &HashMap<Url, Tick> {
        match kind {
            OperationKind::Read => &self.read,
            OperationKind::Write => &self.write,
        }
    }

    fn for_kind_mut(&mut self, kind: OperationKind) -> &mut HashMap<Url, Tick> {
        match kind {
            OperationKind::Read => &mut self.read,
            OperationKind::Write => &mut self.write,
        }
    }
}

fn is_demoted(entries: &HashMap<Url, Tick>, endpoint: &Url, now: Tick) -> bool {
    entries
        .get(endpoint)
        .is_some_and(|expiry| now.is_before(*expiry))
}

/// Regional endpoint lists with failure demotion.
pub struct LocationCache {
    default_endpoint: Url,
    enable_endpoint_discovery: bool,
    use_multiple_write_locations: bool,
    unavailable_ttl: Duration,
    clock: Arc<dyn Clock>,
    locations: RwLock<Arc<LocationsInfo>>,
    unavailable: RwLock<Unavailability>,
}

impl LocationCache {
    /// Create a cache using the system clock.
    pub fn new(options: LocationCacheOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock::new()))
    }

    /// Create a cache with an explicit clock.
    pub fn with_clock(options: LocationCacheOptions, clock: Arc<dyn Clock>) -> Self {
        let info = LocationsInfo {
            preferred_locations: options.preferred_locations,
            ..LocationsInfo::default()
        };
        Self {
            default_endpoint: options.default_endpoint,
            enable_endpoint_discovery: options.enable_endpoint_discovery,
            use_multiple_write_locations: options.use_multiple_write_locations,
            unavailable_ttl: options.unavailable_ttl,
            clock,
            locations: RwLock::new(Arc::new(info)),
            unavailable: RwLock::new(Unavailability::default()),
        }
    }

    /// Create a cache from configuration.
    pub fn from_config(config: &LocationConfig) -> anyhow::Result<Self> {
        Ok(Self::new(LocationCacheOptions::from_config(config)?))
    }

    /// Endpoint used when nothing better is known.
    pub fn default_endpoint(&self) -> &Url {
        &self.default_endpoint
    }

    fn snapshot(&self) -> Arc<LocationsInfo> {
        self.locations.read().clone()
    }

    fn writes_by_preference(&self, account: &DatabaseAccount) -> bool {
        self.use_multiple_write_locations && account.enable_multiple_write_locations
    }

    /// Apply a freshly polled account topology.
    pub fn on_database_account_read(&self, account: DatabaseAccount) {
        let mut locations = self.locations.write();
        let preferred = locations.preferred_locations.clone();
        let by_preference = self.writes_by_preference(&account);
        let info = LocationsInfo::build(account, preferred, by_preference);

        tracing::info!(
            write_locations = ?info.write_locations,
            read_locations = ?info.read_locations,
            multiple_write_locations = by_preference,
            "account topology applied"
        );

        *locations = Arc::new(info);
    }

    /// Replace the preferred location list and reorder endpoints accordingly.
    pub fn on_location_preference_changed(&self, preferred_locations: Vec<String>) {
        let mut locations = self.locations.write();
        let account = locations.account.clone();
        let by_preference = self.writes_by_preference(&account);
        let info = LocationsInfo::build(account, preferred_locations, by_preference);

        tracing::info!(
            preferred_locations = ?info.preferred_locations,
            "preferred locations changed"
        );

        *locations = Arc::new(info);
    }

    /// Demote an endpoint for reads until the TTL passes.
    pub fn mark_endpoint_unavailable_for_read(&self, endpoint: &Url) {
        self.mark_endpoint_unavailable(endpoint, OperationKind::Read);
    }

    /// Demote an endpoint for writes until the TTL passes.
    pub fn mark_endpoint_unavailable_for_write(&self, endpoint: &Url) {
        self.mark_endpoint_unavailable(endpoint, OperationKind::Write);
    }

    fn mark_endpoint_unavailable(&self, endpoint: &Url, kind: OperationKind) {
        let expiry = self.clock.now().add(self.unavailable_ttl);
        self.unavailable
            .write()
            .for_kind_mut(kind)
            .insert(endpoint.clone(), expiry);

        tracing::warn!(
            endpoint = %endpoint,
            operation = %kind,
            until = %expiry,
            "endpoint marked unavailable"
        );
    }

    /// Check whether an endpoint is currently demoted for an operation kind.
    pub fn is_endpoint_unavailable(&self, endpoint: &Url, kind: OperationKind) -> bool {
        let now = self.clock.now();
        is_demoted(self.unavailable.read().for_kind(kind), endpoint, now)
    }

    /// Write endpoints in selection order, demoted ones last. Never empty.
    pub fn write_endpoints(&self) -> Vec<Url> {
        let info = self.snapshot();
        self.ordered_endpoints(&info.write_endpoints, OperationKind::Write)
    }

    /// Read endpoints in selection order, demoted ones last. Never empty.
    pub fn read_endpoints(&self) -> Vec<Url> {
        let info = self.snapshot();
        self.ordered_endpoints(&info.read_endpoints, OperationKind::Read)
    }

    fn ordered_endpoints(&self, endpoints: &[Url], kind: OperationKind) -> Vec<Url> {
        if !self.enable_endpoint_discovery || endpoints.is_empty() {
            return vec![self.default_endpoint.clone()];
        }

        let now = self.clock.now();
        let (mut available, demoted, has_expired) = {
            let unavailable = self.unavailable.read();
            let entries = unavailable.for_kind(kind);
            let (demoted, available): (Vec<Url>, Vec<Url>) = endpoints
                .iter()
                .cloned()
                .partition(|endpoint| is_demoted(entries, endpoint, now));
            let has_expired = entries.values().any(|expiry| now.is_at_or_after(*expiry));
            (available, demoted, has_expired)
        };

        if has_expired {
            self.prune_expired(kind, now);
        }

        available.extend(demoted);
        available
    }

    fn prune_expired(&self, kind: OperationKind, now: Tick) {
        let mut unavailable = self.unavailable.write();
        unavailable.for_kind_mut(kind).retain(|endpoint, expiry| {
            let keep = now.is_before(*expiry);
            if !keep {
                tracing::info!(endpoint = %endpoint, operation = %kind, "endpoint available again");
            }
            keep
        });
    }

    /// Read region names in selection order.
    pub fn available_read_locations(&self) -> Vec<String> {
        self.snapshot().read_locations.clone()
    }

    /// Write region names in selection order.
    pub fn available_write_locations(&self) -> Vec<String> {
        self.snapshot().write_locations.clone()
    }

    /// Region serving an endpoint, if the topology knows it.
    pub fn location_of(&self, endpoint: &Url) -> Option<String> {
        let info = self.snapshot();
        info.write_endpoint_by_location
            .iter()
            .chain(info.read_endpoint_by_location.iter())
            .find(|(_, url)| *url == endpoint)
            .map(|(name, _)| name.clone())
    }

    /// Whether writes may go to any write region.
    ///
    /// Requires both the client setting and the account capability.
    pub fn can_use_multiple_write_locations(&self) -> bool {
        self.writes_by_preference(&self.snapshot().account)
    }

    /// Pick the endpoint a request should be sent to.
    pub fn resolve_service_endpoint(&self, request: &ServiceRequest) -> Url {
        if let Some(endpoint) = &request.endpoint_override {
            return endpoint.clone();
        }
        if !self.enable_endpoint_discovery {
            return self.default_endpoint.clone();
        }

        let endpoint = match request.kind() {
            OperationKind::Read => self.read_endpoints().swap_remove(0),
            OperationKind::Write => {
                let mut endpoints = self.write_endpoints();
                let index = if self.can_use_multiple_write_locations() {
                    request.alternate_index.unwrap_or(0) % endpoints.len()
                } else {
                    0
                };
                endpoints.swap_remove(index)
            }
        };

        tracing::trace!(
            endpoint = %endpoint,
            resource_type = ?request.resource_type,
            master = request.resource_type.is_master_resource(),
            operation = ?request.operation_type,
            "resolved service endpoint"
        );
        endpoint
    }

    /// Decide whether the account topology should be fetched again.
    ///
    /// A refresh is due when the top read endpoint (or, with multi-region
    /// writes, the top write endpoint) is demoted or no longer matches the
    /// most preferred region.
    pub fn should_refresh_endpoints(&self) -> RefreshDecision {
        if !self.enable_endpoint_discovery {
            return RefreshDecision::NONE;
        }

        let info = self.snapshot();
        if !info.has_topology() {
            return RefreshDecision::refresh(0);
        }

        let now = self.clock.now();
        let unavailable = self.unavailable.read();
        let most_preferred = info.preferred_locations.first();
        let mismatched_write_capability =
            self.use_multiple_write_locations && !info.account.enable_multiple_write_locations;

        let read_endpoints = &info.read_endpoints;
        if let Some(top) = read_endpoints.first() {
            if is_demoted(&unavailable.read, top, now) {
                return RefreshDecision::refresh(read_endpoints.len());
            }
        }

        if let Some(location) = most_preferred {
            match info.read_endpoint_by_location.get(location) {
                Some(endpoint) if read_endpoints.first() == Some(endpoint) => {}
                _ => return RefreshDecision::refresh(read_endpoints.len()),
            }
        }

        let write_endpoints = &info.write_endpoints;
        let top_write = write_endpoints.first();
        let decision = if !self.writes_by_preference(&info.account) {
            match top_write {
                Some(top) if is_demoted(&unavailable.write, top, now) => {
                    RefreshDecision::refresh(write_endpoints.len())
                }
                _ if mismatched_write_capability => RefreshDecision::refresh(write_endpoints.len()),
                _ => RefreshDecision::NONE,
            }
        } else if let Some(location) = most_preferred {
            match info.write_endpoint_by_location.get(location) {
                Some(endpoint) if top_write == Some(endpoint) => match top_write {
                    Some(top) if is_demoted(&unavailable.write, top, now) => {
                        RefreshDecision::refresh(write_endpoints.len())
                    }
                    _ => RefreshDecision::NONE,
                },
                _ => RefreshDecision::refresh(write_endpoints.len()),
            }
        } else {
            match top_write {
                Some(top) if is_demoted(&unavailable.write, top, now) => {
                    RefreshDecision::refresh(write_endpoints.len())
                }
                _ => RefreshDecision::NONE,
            }
        };

        if decision.should_refresh {
            tracing::debug!(
                background = decision.can_refresh_in_background,
                "endpoint refresh recommended"
            );
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::ManualClock;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn region(name: &str) -> AccountRegion {
        let host = name.to_lowercase().replace(' ', "");
        AccountRegion::new(name, url(&format!("https://acct-{}.example.net/", host)))
    }

    #[test]
    fn order_regions_prefers_then_appends_in_account_order() {
        let regions = vec![region("L1"), region("L2"), region("L3"), region("L4")];
        let preferred = vec!["L3".to_string(), "L9".to_string(), "L1".to_string()];
        let (names, by_location, endpoints) = order_regions(&regions, &preferred);
        assert_eq!(names, vec!["L3", "L1", "L2", "L4"]);
        assert_eq!(by_location.len(), 4);
        assert_eq!(endpoints[0], region("L3").database_account_endpoint);
    }

    #[test]
    fn order_regions_keeps_first_duplicate() {
        let mut dup = region("L1");
        dup.database_account_endpoint = url("https://other.example.net/");
        let regions = vec![region("L1"), dup];
        let (names, _, endpoints) = order_regions(&regions, &[]);
        assert_eq!(names, vec!["L1"]);
        assert_eq!(endpoints, vec![region("L1").database_account_endpoint]);
    }

    #[test]
    fn expired_entries_are_pruned_on_read() {
        let clock = ManualClock::new();
        let mut options = LocationCacheOptions::new(url("https://acct.example.net/"));
        options.unavailable_ttl = Duration::from_secs(10);
        let cache = LocationCache::with_clock(options, Arc::new(clock.clone()));
        cache.on_database_account_read(DatabaseAccount {
            writable_locations: vec![region("L1")],
            readable_locations: vec![region("L1"), region("L2")],
            enable_multiple_write_locations: false,
        });

        let l1 = region("L1").database_account_endpoint;
        cache.mark_endpoint_unavailable_for_read(&l1);
        assert_eq!(cache.unavailable.read().read.len(), 1);

        clock.advance(Duration::from_secs(10));
        let endpoints = cache.read_endpoints();
        assert_eq!(endpoints[0], l1);
        assert!(cache.unavailable.read().read.is_empty());
    }
}
