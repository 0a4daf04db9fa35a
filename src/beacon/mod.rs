//! Text beacons
//!
//! A beacon is a spatially anchored unit of narratable text. The placement
//! subsystem creates them; the narrator only reads them and flips the
//! first-time flag.

pub mod registry;

pub use registry::BeaconRegistry;

use crate::spatial::SpatialHandle;
use crate::speech::OutputId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Stable beacon identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeaconId(Uuid);

impl BeaconId {
    pub fn new() -> Self {
        BeaconId(Uuid::new_v4())
    }
}

impl Default for BeaconId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Spatially anchored narratable text
#[derive(Debug)]
pub struct Beacon {
    id: BeaconId,
    text: String,
    spatial: SpatialHandle,
    /// Set once narrated by a first-time-only pass
    first_time_read: AtomicBool,
}

impl Beacon {
    pub fn new(text: impl Into<String>, spatial: SpatialHandle) -> Self {
        Self {
            id: BeaconId::new(),
            text: text.into(),
            spatial,
            first_time_read: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> BeaconId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spatial_handle(&self) -> SpatialHandle {
        self.spatial
    }

    /// Positional audio output owned by this beacon
    pub fn audio_output(&self) -> OutputId {
        OutputId::Beacon(self.id)
    }

    pub fn first_time_read(&self) -> bool {
        self.first_time_read.load(Ordering::Acquire)
    }

    /// Mark as read; returns the previous value
    pub fn mark_first_time_read(&self) -> bool {
        self.first_time_read.swap(true, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_beacon() {
        let handle = SpatialHandle::next();
        let beacon = Beacon::new("Exit", handle);
        assert_eq!(beacon.text(), "Exit");
        assert_eq!(beacon.spatial_handle(), handle);
        assert!(!beacon.first_time_read());
        assert_eq!(beacon.audio_output(), OutputId::Beacon(beacon.id()));
    }

    #[test]
    fn test_mark_first_time_read() {
        let beacon = Beacon::new("Room 101", SpatialHandle::next());
        assert!(!beacon.mark_first_time_read());
        assert!(beacon.first_time_read());
        assert!(beacon.mark_first_time_read());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Beacon::new("a", SpatialHandle::next());
        let b = Beacon::new("a", SpatialHandle::next());
        assert_ne!(a.id(), b.id());
    }
}
