//! Speech synthesis and audio routing

pub mod backends;
pub mod gateway;
#[cfg(feature = "cloud-tts")]
pub mod player;

pub use backends::silent::{PlaybackEvent, SilentSynth};
pub use gateway::{create_gateway, estimate_duration, Clip, OutputId, OutputRouter, SpeechGateway};
