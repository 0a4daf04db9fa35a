//! Narration session state
//!
//! `PlaybackSession` is the single record of what the narrator is doing:
//! which pass is active, what was read last, and how fast to speak. The
//! scheduler and the interrupt commands are the only writers.

pub mod config;

use crate::beacon::Beacon;
use crate::spatial::Vec3;
use crate::{NarratorError, Result};
use log::{debug, info};
use std::sync::{Arc, Weak};

/// Text replayed when nothing has been narrated yet
pub const NOTHING_TO_REPEAT: &str = "No text to repeat.";

/// What the narrator is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    ReadingAll,
    ReadingSpotlight,
    /// Replaying the last narration; entered from any other mode
    Repeating,
}

/// Mutable state of the single narration session
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    /// Active pass, `Idle` between passes
    pass: Mode,

    /// Beacon currently or most recently narrated; never owning
    current_beacon: Weak<Beacon>,

    /// Last narrated text, replayed by repeat when idle
    last_text: String,

    /// Stop was requested and the pass has not reached its checkpoint yet
    cancel_requested: bool,

    /// A narration pass is active
    running: bool,

    /// A repeat is playing; passes wait at their checkpoint
    repeating: bool,

    speaking_rate: f32,
    rate_bounds: (f32, f32),

    /// Where the head-locked narration emitter sits
    narration_origin: Vec3,
}

impl PlaybackSession {
    /// New idle session speaking at `rate`, clamped to `rate_bounds`
    pub fn new(rate: f32, rate_bounds: (f32, f32)) -> Self {
        let (min, max) = rate_bounds;
        Self {
            pass: Mode::Idle,
            current_beacon: Weak::new(),
            last_text: NOTHING_TO_REPEAT.to_string(),
            cancel_requested: false,
            running: false,
            repeating: false,
            speaking_rate: rate.clamp(min, max),
            rate_bounds,
            narration_origin: Vec3::ZERO,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.repeating {
            Mode::Repeating
        } else {
            self.pass
        }
    }

    /// Mode of the active pass, ignoring any repeat in progress
    pub fn pass_mode(&self) -> Mode {
        self.pass
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_repeating(&self) -> bool {
        self.repeating
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn speaking_rate(&self) -> f32 {
        self.speaking_rate
    }

    pub fn narration_origin(&self) -> Vec3 {
        self.narration_origin
    }

    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    /// Most recently narrated beacon, if it still exists
    pub fn current_beacon(&self) -> Option<Arc<Beacon>> {
        self.current_beacon.upgrade()
    }

    /// Claim the session for a pass. Only one pass may be active.
    pub fn begin_pass(&mut self, mode: Mode) -> Result<()> {
        if self.running {
            return Err(NarratorError::PassActive);
        }
        debug!("Pass started: {:?}", mode);
        self.pass = mode;
        self.running = true;
        self.cancel_requested = false;
        Ok(())
    }

    /// Release the session after a pass, however it ended
    pub fn end_pass(&mut self) {
        debug!("Pass finished: {:?}", self.pass);
        self.pass = Mode::Idle;
        self.running = false;
        self.cancel_requested = false;
        self.narration_origin = Vec3::ZERO;
    }

    /// Anchor narration at the spot the pass was aimed from
    pub fn set_narration_origin(&mut self, origin: Vec3) {
        self.narration_origin = origin;
    }

    /// Record `beacon` as the latest narration
    pub fn record_narration(&mut self, beacon: &Arc<Beacon>) {
        self.current_beacon = Arc::downgrade(beacon);
        self.last_text = beacon.text().to_string();
    }

    /// Flag a stop for the running pass. Returns false when idle.
    pub fn request_cancel(&mut self) -> bool {
        if self.running {
            self.cancel_requested = true;
        }
        self.cancel_requested
    }

    /// Consume a pending stop at a checkpoint
    pub fn take_cancel(&mut self) -> bool {
        std::mem::take(&mut self.cancel_requested)
    }

    /// Claim the repeat slot. Only one repeat may play at a time.
    pub fn begin_repeat(&mut self) -> bool {
        if self.repeating {
            return false;
        }
        self.repeating = true;
        true
    }

    pub fn end_repeat(&mut self) {
        self.repeating = false;
    }

    /// Forget the repeat buffer (beacons were cleared)
    pub fn reset_repeat_buffer(&mut self) {
        self.last_text = NOTHING_TO_REPEAT.to_string();
        self.current_beacon = Weak::new();
    }

    /// Add `delta` to the speaking rate, clamped; returns the new rate
    pub fn adjust_rate(&mut self, delta: f32) -> f32 {
        let (min, max) = self.rate_bounds;
        self.speaking_rate = (self.speaking_rate + delta).clamp(min, max);
        info!("Speaking rate now {:.2}", self.speaking_rate);
        self.speaking_rate
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(1.0, (0.25, 4.0))
    }
}
