//! Beacon Narrator - narration playback for spatial text beacons
//!
//! Reads spatially anchored text beacons aloud on command, either all of
//! them or only those in the viewer's spotlight, with stop, skip, repeat
//! and speed control over in-flight speech.

pub mod beacon;
pub mod error;
pub mod input;
pub mod narration;
pub mod spatial;
pub mod speech;
pub mod state;

pub use error::{NarratorError, Result};
pub use narration::{NarrationSettings, Narrator};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "beacon-narrator";
