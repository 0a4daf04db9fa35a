//! Speech gateway backends

// Dry-run backend; no audio device needed
pub mod silent;

// Remote REST synthesis
pub mod cloud;

// OS speech engine via the tts crate
#[cfg(feature = "native-tts")]
pub mod native;
