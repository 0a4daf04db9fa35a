//! Narration playback orchestration
//!
//! [`Narrator`] is the cloneable handle shared by the command surface and
//! the tasks it spawns. A pass (read all / spotlight) and at most one
//! repeat run as cooperative tokio tasks; they meet at three suspension
//! points: the capture grace period, the per-clip wait, and the
//! wait-for-repeat checkpoint before each beacon.

mod controller;
mod scheduler;

pub use scheduler::{PassEnd, PassReport};

use crate::beacon::{Beacon, BeaconId, BeaconRegistry};
use crate::spatial::{PoseSource, SpatialFilter, SpatialHandle};
use crate::speech::SpeechGateway;
use crate::state::config::Config;
use crate::state::PlaybackSession;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Spoken when a pass starts with no beacons at all
pub const NO_BEACONS_PROMPT: &str = "No text found. Try the command, 'capture text.'";

/// Spoken when a spotlight pass finds nothing in view
pub const NO_HITS_PROMPT: &str = "No text in this direction. Try again or say read all text.";

/// Fixed narration parameters
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationSettings {
    /// Pause before a first-time-only pass
    pub capture_grace: Duration,
    pub spotlight_radius: f32,
    pub spotlight_depth: f32,
    pub spotlight_angle: f32,
    /// Rate change per speed command
    pub rate_step: f32,
}

impl NarrationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            capture_grace: config.capture_grace(),
            spotlight_radius: config.spotlight_radius(),
            spotlight_depth: config.spotlight_depth(),
            spotlight_angle: config.spotlight_angle(),
            rate_step: config.rate_step(),
        }
    }
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            capture_grace: Duration::from_secs(5),
            spotlight_radius: 1.0,
            spotlight_depth: 20.0,
            spotlight_angle: 120.0,
            rate_step: 0.25,
        }
    }
}

struct Inner {
    registry: Mutex<BeaconRegistry>,
    session: Mutex<PlaybackSession>,
    gateway: Arc<dyn SpeechGateway>,
    spatial: Arc<dyn SpatialFilter>,
    pose: Arc<dyn PoseSource>,
    settings: NarrationSettings,

    /// Cancellation for the running pass, if any
    pass_cancel: Mutex<Option<CancellationToken>>,

    /// Wakes whoever is waiting out a clip
    skip: Notify,

    /// Fired when a repeat ends; the pass checkpoint waits on it
    repeat_done: Notify,
}

/// Handle to the narration session
#[derive(Clone)]
pub struct Narrator {
    inner: Arc<Inner>,
}

impl Narrator {
    /// Build a narrator with its collaborators injected once
    pub fn new(
        gateway: Arc<dyn SpeechGateway>,
        spatial: Arc<dyn SpatialFilter>,
        pose: Arc<dyn PoseSource>,
        settings: NarrationSettings,
        session: PlaybackSession,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(BeaconRegistry::new()),
                session: Mutex::new(session),
                gateway,
                spatial,
                pose,
                settings,
                pass_cancel: Mutex::new(None),
                skip: Notify::new(),
                repeat_done: Notify::new(),
            }),
        }
    }

    /// Snapshot of the session state
    pub fn session(&self) -> PlaybackSession {
        self.inner.session.lock().clone()
    }

    /// Create and register a beacon anchored at `spatial`
    pub fn add_beacon(&self, text: impl Into<String>, spatial: SpatialHandle) -> Arc<Beacon> {
        let beacon = Arc::new(Beacon::new(text, spatial));
        self.inner.registry.lock().insert(beacon.clone());
        beacon
    }

    /// Unregister a beacon and free its audio output
    pub fn remove_beacon(&self, id: BeaconId) -> Option<Arc<Beacon>> {
        let removed = self.inner.registry.lock().remove(id)?;
        self.inner.gateway.release(removed.audio_output());
        Some(removed)
    }

    /// Run `f` against the registry
    pub fn with_registry<R>(&self, f: impl FnOnce(&mut BeaconRegistry) -> R) -> R {
        f(&mut self.inner.registry.lock())
    }

    /// Snapshot of registered beacons in insertion order
    pub fn beacons(&self) -> Vec<Arc<Beacon>> {
        self.inner.registry.lock().all()
    }
}
