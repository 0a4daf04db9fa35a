//! Speech gateway abstraction
//!
//! The narrator drives speech through this trait: synthesize a clip, route
//! it to an audio output, play, replay or stop it. Backends differ in how
//! audio is produced; the routing model is shared.

use crate::beacon::BeaconId;
use crate::state::config::Config;
use crate::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Shortest clip any estimate will produce
const MIN_CLIP: Duration = Duration::from_millis(300);

/// Audio output slot a clip is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputId {
    /// Head-locked output used for prompts and fallbacks
    Default,
    /// Positional output attached to a beacon
    Beacon(BeaconId),
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputId::Default => write!(f, "default"),
            OutputId::Beacon(id) => write!(f, "beacon:{}", id),
        }
    }
}

/// Synthesized speech ready to play
#[derive(Debug, Clone)]
pub struct Clip {
    text: String,
    duration: Duration,
    samples: Arc<Vec<i16>>,
    sample_rate: u32,
}

impl Clip {
    /// Clip with decoded mono PCM
    pub fn from_pcm(text: impl Into<String>, samples: Vec<i16>, sample_rate: u32) -> Self {
        let duration = if sample_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(samples.len() as f64 / f64::from(sample_rate))
        };
        Self {
            text: text.into(),
            duration,
            samples: Arc::new(samples),
            sample_rate,
        }
    }

    /// Clip whose audio is produced elsewhere (OS engine, dry run)
    pub fn without_audio(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            duration,
            samples: Arc::new(Vec::new()),
            sample_rate: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Text-to-speech gateway consumed by the narrator
#[async_trait]
pub trait SpeechGateway: Send + Sync {
    /// Synthesize `text` at `rate` (1.0 is normal speed)
    async fn synthesize(&self, text: &str, rate: f32) -> Result<Clip>;

    /// Route subsequent playback to `output`
    fn set_output(&self, output: OutputId);

    /// Output playback is currently routed to
    fn output(&self) -> OutputId;

    /// Load `clip` into the current output and start it
    fn play(&self, clip: &Clip) -> Result<()>;

    /// Restart the clip loaded in the current output.
    /// Returns its duration, or `None` when the output has nothing loaded.
    fn replay(&self) -> Option<Duration>;

    /// Silence the current output
    fn stop(&self);

    /// Drop whatever is loaded in a beacon output that no longer exists
    fn release(&self, output: OutputId);
}

/// Rough spoken length of `text` at `rate`
pub fn estimate_duration(text: &str, rate: f32, words_per_minute: f32) -> Duration {
    let words = text.split_whitespace().count().max(1) as f32;
    let wpm = words_per_minute.max(1.0) * rate.max(0.01);
    Duration::from_secs_f32(words * 60.0 / wpm).max(MIN_CLIP)
}

#[derive(Debug)]
struct RouterState {
    output: OutputId,
    loaded: HashMap<OutputId, Clip>,
    playing: Option<OutputId>,
}

/// Per-output clip bookkeeping shared by backends
///
/// Every output keeps the last clip loaded into it, so a replay after the
/// routing moved back restarts the right audio.
#[derive(Debug)]
pub struct OutputRouter {
    state: Mutex<RouterState>,
}

impl OutputRouter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RouterState {
                output: OutputId::Default,
                loaded: HashMap::new(),
                playing: None,
            }),
        }
    }

    pub fn set_output(&self, output: OutputId) {
        debug!("Routing speech to {}", output);
        self.state.lock().output = output;
    }

    pub fn output(&self) -> OutputId {
        self.state.lock().output
    }

    /// Load and start `clip` on the current output, returning that output
    pub fn load(&self, clip: &Clip) -> OutputId {
        let mut state = self.state.lock();
        let output = state.output;
        state.loaded.insert(output, clip.clone());
        state.playing = Some(output);
        output
    }

    /// Clip to restart on the current output
    pub fn restart(&self) -> Option<(Clip, OutputId)> {
        let mut state = self.state.lock();
        let output = state.output;
        let clip = state.loaded.get(&output).cloned()?;
        state.playing = Some(output);
        Some((clip, output))
    }

    /// Stop the current output; returns it
    pub fn stop(&self) -> OutputId {
        let mut state = self.state.lock();
        let output = state.output;
        if state.playing == Some(output) {
            state.playing = None;
        }
        output
    }

    /// Forget the clip held by a beacon output that no longer exists
    pub fn release(&self, output: OutputId) {
        if output != OutputId::Default {
            let mut state = self.state.lock();
            state.loaded.remove(&output);
            if state.playing == Some(output) {
                state.playing = None;
            }
        }
    }

    pub fn playing(&self) -> Option<OutputId> {
        self.state.lock().playing
    }
}

impl Default for OutputRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the gateway selected by `[speech] backend`
///
/// Falls back to the silent backend when the requested one cannot start,
/// so narration logic stays usable without audio hardware or network.
pub fn create_gateway(config: &Config) -> Result<Arc<dyn SpeechGateway>> {
    let backend = config.backend();
    info!("Creating speech gateway: {}", backend);

    match backend.as_str() {
        "cloud" => create_cloud(config),
        "native" => create_native(config),
        "silent" => Ok(Arc::new(super::backends::silent::SilentSynth::new(
            config.words_per_minute(),
        ))),
        other => {
            warn!("Unknown speech backend '{}', using silent backend", other);
            Ok(Arc::new(super::backends::silent::SilentSynth::new(
                config.words_per_minute(),
            )))
        }
    }
}

#[cfg(feature = "cloud-tts")]
fn create_cloud(config: &Config) -> Result<Arc<dyn SpeechGateway>> {
    use super::backends::cloud::CloudSynth;

    let api_key = config.api_key().ok_or_else(|| {
        crate::NarratorError::Config("[speech] api_key is required for the cloud backend".into())
    })?;
    match CloudSynth::new(config.endpoint(), api_key, config.language_code()) {
        Ok(synth) => {
            info!("✓ Cloud synthesis backend ready");
            Ok(Arc::new(synth))
        }
        Err(e) => {
            warn!("✗ Cloud synthesis unavailable ({}), using silent backend", e);
            Ok(Arc::new(super::backends::silent::SilentSynth::new(
                config.words_per_minute(),
            )))
        }
    }
}

#[cfg(not(feature = "cloud-tts"))]
fn create_cloud(config: &Config) -> Result<Arc<dyn SpeechGateway>> {
    warn!("Built without the cloud-tts feature, using silent backend");
    Ok(Arc::new(super::backends::silent::SilentSynth::new(
        config.words_per_minute(),
    )))
}

#[cfg(feature = "native-tts")]
fn create_native(config: &Config) -> Result<Arc<dyn SpeechGateway>> {
    use super::backends::native::NativeSynth;

    match NativeSynth::new(config.words_per_minute()) {
        Ok(synth) => {
            info!("✓ Successfully initialized native TTS backend");
            Ok(Arc::new(synth))
        }
        Err(e) => {
            warn!("✗ Native TTS unavailable ({}), using silent backend", e);
            Ok(Arc::new(super::backends::silent::SilentSynth::new(
                config.words_per_minute(),
            )))
        }
    }
}

#[cfg(not(feature = "native-tts"))]
fn create_native(config: &Config) -> Result<Arc<dyn SpeechGateway>> {
    warn!("Built without the native-tts feature, using silent backend");
    Ok(Arc::new(super::backends::silent::SilentSynth::new(
        config.words_per_minute(),
    )))
}
