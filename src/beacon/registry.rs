//! Ordered collection of narratable beacons

use super::{Beacon, BeaconId};
use crate::spatial::SpatialHandle;
use log::{debug, info};
use std::sync::Arc;

/// Callback fired after the registry is cleared
///
/// Collaborators with per-beacon side tables (icon tracking, colliders)
/// reset themselves here.
pub type ClearListener = Box<dyn Fn() + Send + Sync>;

/// Beacons in insertion order
///
/// Owns the beacons; everything else holds `Arc` clones for the duration of
/// a pass or `Weak` back-references.
pub struct BeaconRegistry {
    beacons: Vec<Arc<Beacon>>,
    listeners: Vec<ClearListener>,
}

impl BeaconRegistry {
    pub fn new() -> Self {
        Self {
            beacons: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Append a beacon. A beacon whose id is already present is ignored.
    pub fn insert(&mut self, beacon: Arc<Beacon>) -> bool {
        if self.contains(beacon.id()) {
            debug!("Beacon {} already registered", beacon.id());
            return false;
        }
        debug!("Registering beacon {}: {:?}", beacon.id(), beacon.text());
        self.beacons.push(beacon);
        true
    }

    /// Snapshot of all beacons in insertion order
    pub fn all(&self) -> Vec<Arc<Beacon>> {
        self.beacons.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Beacon>> {
        self.beacons.iter()
    }

    pub fn contains(&self, id: BeaconId) -> bool {
        self.beacons.iter().any(|b| b.id() == id)
    }

    /// Resolve a spatial hit to a registered beacon
    pub fn by_spatial_handle(&self, handle: SpatialHandle) -> Option<Arc<Beacon>> {
        self.beacons
            .iter()
            .find(|b| b.spatial_handle() == handle)
            .cloned()
    }

    pub fn remove(&mut self, id: BeaconId) -> Option<Arc<Beacon>> {
        let idx = self.beacons.iter().position(|b| b.id() == id)?;
        Some(self.beacons.remove(idx))
    }

    /// Remove every beacon and notify listeners
    pub fn clear(&mut self) {
        info!("Clearing {} beacons", self.beacons.len());
        self.beacons.clear();
        for listener in &self.listeners {
            listener();
        }
    }

    pub fn on_cleared(&mut self, listener: ClearListener) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.beacons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beacons.is_empty()
    }
}

impl Default for BeaconRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn beacon(text: &str) -> Arc<Beacon> {
        Arc::new(Beacon::new(text, SpatialHandle::next()))
    }

    #[test]
    fn test_insertion_order() {
        let mut registry = BeaconRegistry::new();
        for text in ["one", "two", "three"] {
            registry.insert(beacon(text));
        }

        let texts: Vec<_> = registry.all().iter().map(|b| b.text().to_string()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        // Restartable
        assert_eq!(registry.all().len(), 3);
    }

    #[test]
    fn test_duplicate_insert_ignored() {
        let mut registry = BeaconRegistry::new();
        let b = beacon("same");
        assert!(registry.insert(b.clone()));
        assert!(!registry.insert(b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut registry = BeaconRegistry::new();
        let a = beacon("a");
        let b = beacon("b");
        let c = beacon("c");
        registry.insert(a.clone());
        registry.insert(b.clone());
        registry.insert(c.clone());

        assert!(registry.remove(b.id()).is_some());
        assert!(registry.remove(b.id()).is_none());
        let ids: Vec<_> = registry.iter().map(|x| x.id()).collect();
        assert_eq!(ids, vec![a.id(), c.id()]);
    }

    #[test]
    fn test_lookup_by_spatial_handle() {
        let mut registry = BeaconRegistry::new();
        let b = beacon("door");
        registry.insert(b.clone());

        let found = registry.by_spatial_handle(b.spatial_handle()).unwrap();
        assert_eq!(found.id(), b.id());
        assert!(registry.by_spatial_handle(SpatialHandle::next()).is_none());
    }

    #[test]
    fn test_clear_notifies_listeners() {
        let mut registry = BeaconRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        registry.on_cleared(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        registry.insert(beacon("x"));
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
