//! Silent backend
//!
//! Produces no audio. Clip lengths come from a word-rate estimate (or a
//! fixed length), and every routing/playback call is recorded so a dry run
//! can be inspected afterwards.

use crate::speech::gateway::{estimate_duration, Clip, OutputId, OutputRouter, SpeechGateway};
use crate::{NarratorError, Result};
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;

/// Something the silent backend was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Routing changed
    Output(OutputId),
    /// Clip started from scratch
    Play { text: String, output: OutputId, rate: f32 },
    /// Loaded clip restarted
    Replay { text: String, output: OutputId },
    /// Output silenced
    Stop(OutputId),
}

pub struct SilentSynth {
    router: OutputRouter,
    words_per_minute: f32,
    fixed: Option<Duration>,
    /// Simulated round trip of a remote synthesizer
    latency: Duration,
    failing: HashSet<String>,
    events: Mutex<Vec<PlaybackEvent>>,
    /// Rate of the most recent synthesis, attached to the next Play event
    last_rate: Mutex<f32>,
}

impl SilentSynth {
    pub fn new(words_per_minute: f32) -> Self {
        Self {
            router: OutputRouter::new(),
            words_per_minute,
            fixed: None,
            latency: Duration::ZERO,
            failing: HashSet::new(),
            events: Mutex::new(Vec::new()),
            last_rate: Mutex::new(1.0),
        }
    }

    /// Every clip lasts exactly `duration`, whatever the text or rate
    pub fn with_fixed_duration(mut self, duration: Duration) -> Self {
        self.fixed = Some(duration);
        self
    }

    /// Every synthesis takes `latency` before the clip is ready
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Synthesis of `text` fails, as a broken network call would
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events.lock().clone()
    }

    /// Texts started with `play`, in order
    pub fn played(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Play { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn playing(&self) -> Option<OutputId> {
        self.router.playing()
    }

    fn record(&self, event: PlaybackEvent) {
        debug!("Silent backend: {:?}", event);
        self.events.lock().push(event);
    }
}

impl Default for SilentSynth {
    fn default() -> Self {
        Self::new(160.0)
    }
}

#[async_trait]
impl SpeechGateway for SilentSynth {
    async fn synthesize(&self, text: &str, rate: f32) -> Result<Clip> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.contains(text) {
            return Err(NarratorError::Synthesis(format!(
                "synthesis refused for {:?}",
                text
            )));
        }
        *self.last_rate.lock() = rate;
        let duration = self
            .fixed
            .unwrap_or_else(|| estimate_duration(text, rate, self.words_per_minute));
        Ok(Clip::without_audio(text, duration))
    }

    fn set_output(&self, output: OutputId) {
        self.router.set_output(output);
        self.record(PlaybackEvent::Output(output));
    }

    fn output(&self) -> OutputId {
        self.router.output()
    }

    fn play(&self, clip: &Clip) -> Result<()> {
        let output = self.router.load(clip);
        let rate = *self.last_rate.lock();
        self.record(PlaybackEvent::Play {
            text: clip.text().to_string(),
            output,
            rate,
        });
        Ok(())
    }

    fn replay(&self) -> Option<Duration> {
        let (clip, output) = self.router.restart()?;
        self.record(PlaybackEvent::Replay {
            text: clip.text().to_string(),
            output,
        });
        Some(clip.duration())
    }

    fn stop(&self) {
        let output = self.router.stop();
        self.record(PlaybackEvent::Stop(output));
    }

    fn release(&self, output: OutputId) {
        self.router.release(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_playback() {
        let synth = SilentSynth::default().with_fixed_duration(Duration::from_secs(2));
        let clip = synth.synthesize("hello there", 1.5).await.unwrap();
        assert_eq!(clip.duration(), Duration::from_secs(2));

        synth.play(&clip).unwrap();
        synth.stop();

        assert_eq!(
            synth.events(),
            vec![
                PlaybackEvent::Play {
                    text: "hello there".into(),
                    output: OutputId::Default,
                    rate: 1.5
                },
                PlaybackEvent::Stop(OutputId::Default),
            ]
        );
        assert_eq!(synth.played(), vec!["hello there"]);
    }

    #[tokio::test]
    async fn test_replay_without_clip() {
        let synth = SilentSynth::default();
        assert!(synth.replay().is_none());
        assert!(synth.events().is_empty());
    }

    #[tokio::test]
    async fn test_failing_text() {
        let synth = SilentSynth::default().failing_on("bad");
        assert!(matches!(
            synth.synthesize("bad", 1.0).await,
            Err(NarratorError::Synthesis(_))
        ));
        assert!(synth.synthesize("good", 1.0).await.is_ok());
    }
}
