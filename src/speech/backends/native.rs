//! Native TTS backend using the tts crate
//!
//! Speaks through the platform engine (Speech Dispatcher, AVFoundation,
//! SAPI). The engine plays audio itself and reports no clip length, so
//! durations are estimated from the word rate.

use crate::speech::gateway::{estimate_duration, Clip, OutputId, OutputRouter, SpeechGateway};
use crate::{NarratorError, Result};
use async_trait::async_trait;
use log::{debug, error, warn};
use parking_lot::Mutex;
use std::time::Duration;
use tts::Tts as TtsCrate;

pub struct NativeSynth {
    tts: Mutex<TtsCrate>,
    router: OutputRouter,
    words_per_minute: f32,
}

impl NativeSynth {
    pub fn new(words_per_minute: f32) -> Result<Self> {
        debug!("Creating native TTS backend");

        let tts = TtsCrate::default()
            .map_err(|e| NarratorError::Synthesis(format!("Failed to initialize TTS: {}", e)))?;

        Ok(Self {
            tts: Mutex::new(tts),
            router: OutputRouter::new(),
            words_per_minute,
        })
    }

    /// Map a rate multiplier onto the engine's own scale
    fn apply_rate(&self, rate: f32) {
        let mut tts = self.tts.lock();
        if !tts.supported_features().rate {
            warn!("Rate control not supported on this platform");
            return;
        }
        let target = (tts.normal_rate() * rate).clamp(tts.min_rate(), tts.max_rate());
        if let Err(e) = tts.set_rate(target) {
            warn!("Failed to set rate: {}", e);
        }
    }

    fn speak(&self, text: &str) -> Result<()> {
        self.tts.lock().speak(text, true).map_err(|e| {
            error!("Failed to speak: {}", e);
            NarratorError::Synthesis(format!("Speak failed: {}", e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl SpeechGateway for NativeSynth {
    async fn synthesize(&self, text: &str, rate: f32) -> Result<Clip> {
        self.apply_rate(rate);
        Ok(Clip::without_audio(
            text,
            estimate_duration(text, rate, self.words_per_minute),
        ))
    }

    fn set_output(&self, output: OutputId) {
        // The OS engine has a single, non-positional output
        self.router.set_output(output);
    }

    fn output(&self) -> OutputId {
        self.router.output()
    }

    fn play(&self, clip: &Clip) -> Result<()> {
        self.router.load(clip);
        debug!("Speaking: {}", clip.text());
        self.speak(clip.text())
    }

    fn replay(&self) -> Option<Duration> {
        let (clip, _) = self.router.restart()?;
        match self.speak(clip.text()) {
            Ok(()) => Some(clip.duration()),
            Err(_) => None,
        }
    }

    fn stop(&self) {
        self.router.stop();
        if let Err(e) = self.tts.lock().stop() {
            error!("Failed to cancel speech: {}", e);
        }
    }

    fn release(&self, output: OutputId) {
        self.router.release(output);
    }
}
