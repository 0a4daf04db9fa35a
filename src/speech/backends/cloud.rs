//! Cloud synthesis backend
//!
//! Talks to a Google-style `text:synthesize` REST endpoint. Audio comes back
//! as base64 LINEAR16 WAV inside a JSON body; the clip length is read from
//! the decoded WAV rather than estimated. The HTTP client and audio output
//! need the `cloud-tts` feature; request and response handling do not.

#![cfg_attr(not(feature = "cloud-tts"), allow(dead_code))]

use crate::speech::gateway::Clip;
use crate::{NarratorError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

#[cfg(feature = "cloud-tts")]
pub use client::CloudSynth;

/// Default synthesis endpoint
pub const DEFAULT_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1beta1/text:synthesize";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    audio_content: String,
}

/// JSON body asking for LINEAR16 audio of `text` at `rate`
fn request_body<'a>(text: &'a str, rate: f32, language_code: &'a str) -> SynthesisRequest<'a> {
    SynthesisRequest {
        input: SynthesisInput { text },
        voice: VoiceSelection { language_code },
        audio_config: AudioConfig {
            audio_encoding: "LINEAR16",
            speaking_rate: rate,
        },
    }
}

/// Turn a synthesis response body into a playable clip
pub fn decode_response(text: &str, body: &str) -> Result<Clip> {
    let response: SynthesisResponse = serde_json::from_str(body)?;
    if response.audio_content.is_empty() {
        return Err(NarratorError::Synthesis("Empty audioContent".into()));
    }

    let wav = STANDARD
        .decode(response.audio_content.as_bytes())
        .map_err(|e| NarratorError::Synthesis(format!("Invalid base64 audio: {}", e)))?;

    decode_wav(text, &wav)
}

/// Decode LINEAR16 WAV bytes, keeping the first channel
fn decode_wav(text: &str, wav: &[u8]) -> Result<Clip> {
    let reader = hound::WavReader::new(Cursor::new(wav))
        .map_err(|e| NarratorError::Synthesis(format!("Invalid WAV audio: {}", e)))?;

    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(NarratorError::Synthesis(format!(
            "Unsupported sample format: {:?}/{} bits",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let channels = usize::from(spec.channels.max(1));
    let samples = reader
        .into_samples::<i16>()
        .step_by(channels)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| NarratorError::Synthesis(format!("Truncated WAV audio: {}", e)))?;

    debug!(
        "Decoded {} frames at {} Hz for {:?}",
        samples.len(),
        spec.sample_rate,
        text
    );
    Ok(Clip::from_pcm(text, samples, spec.sample_rate))
}

#[cfg(feature = "cloud-tts")]
mod client {
    use super::{decode_response, request_body};
    use crate::speech::gateway::{Clip, OutputId, OutputRouter, SpeechGateway};
    use crate::speech::player::AudioPlayer;
    use crate::{NarratorError, Result};
    use async_trait::async_trait;
    use log::{debug, error, info};
    use std::time::Duration;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    /// Remote text-to-speech played on the default audio device
    ///
    /// Every beacon output shares the one device; the router remembers which
    /// clip each output holds so a replay restarts the right audio.
    pub struct CloudSynth {
        client: reqwest::Client,
        endpoint: String,
        api_key: String,
        language_code: String,
        router: OutputRouter,
        player: AudioPlayer,
    }

    impl CloudSynth {
        pub fn new(endpoint: String, api_key: String, language_code: String) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()?;
            let player = AudioPlayer::open()?;

            info!("Cloud synthesis endpoint: {}", endpoint);
            Ok(Self {
                client,
                endpoint,
                api_key,
                language_code,
                router: OutputRouter::new(),
                player,
            })
        }
    }

    #[async_trait]
    impl SpeechGateway for CloudSynth {
        async fn synthesize(&self, text: &str, rate: f32) -> Result<Clip> {
            debug!("Synthesizing {:?} at rate {}", text, rate);

            let response = self
                .client
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(&request_body(text, rate, &self.language_code))
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                error!("Synthesis request failed with {}", status);
                return Err(NarratorError::Synthesis(format!(
                    "Synthesis endpoint returned {}",
                    status
                )));
            }

            let clip = decode_response(text, &body)?;
            info!("Clip length: {:.2}s", clip.duration().as_secs_f32());
            Ok(clip)
        }

        fn set_output(&self, output: OutputId) {
            self.router.set_output(output);
        }

        fn output(&self) -> OutputId {
            self.router.output()
        }

        fn play(&self, clip: &Clip) -> Result<()> {
            let output = self.router.load(clip);
            debug!("Playing {:?} on {}", clip.text(), output);
            self.player.play(clip.samples(), clip.sample_rate())
        }

        fn replay(&self) -> Option<Duration> {
            let (clip, output) = self.router.restart()?;
            debug!("Replaying {:?} on {}", clip.text(), output);
            match self.player.play(clip.samples(), clip.sample_rate()) {
                Ok(()) => Some(clip.duration()),
                Err(e) => {
                    error!("Replay failed: {}", e);
                    None
                }
            }
        }

        fn stop(&self) {
            let output = self.router.stop();
            self.player.stop();
            debug!("Stopped {}", output);
        }

        fn release(&self, output: OutputId) {
            self.router.release(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wav_bytes(frames: usize, sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames * usize::from(channels) {
                writer.write_sample((i % 100) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_response() {
        let audio = STANDARD.encode(wav_bytes(12_000, 24_000, 1));
        let body = format!(r#"{{"audioContent":"{}","timepoints":[]}}"#, audio);

        let clip = decode_response("Exit sign", &body).unwrap();
        assert_eq!(clip.text(), "Exit sign");
        assert_eq!(clip.duration(), Duration::from_millis(500));
        assert_eq!(clip.samples().len(), 12_000);
    }

    #[test]
    fn test_decode_stereo_keeps_one_channel() {
        let audio = STANDARD.encode(wav_bytes(8_000, 16_000, 2));
        let body = format!(r#"{{"audioContent":"{}"}}"#, audio);

        let clip = decode_response("x", &body).unwrap();
        assert_eq!(clip.samples().len(), 8_000);
        assert_eq!(clip.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_malformed_responses() {
        // Error payloads carry no audioContent
        let missing = r#"{"error":{"code":403,"message":"denied"}}"#;
        assert!(matches!(
            decode_response("x", missing),
            Err(NarratorError::Synthesis(_))
        ));

        let bad_base64 = r#"{"audioContent":"%%%"}"#;
        assert!(matches!(
            decode_response("x", bad_base64),
            Err(NarratorError::Synthesis(_))
        ));

        let not_wav = format!(r#"{{"audioContent":"{}"}}"#, STANDARD.encode(b"not a wav"));
        assert!(matches!(
            decode_response("x", &not_wav),
            Err(NarratorError::Synthesis(_))
        ));

        assert!(decode_response("x", r#"{"audioContent":""}"#).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(request_body("Hello", 1.25, "en-US")).unwrap();

        assert_eq!(body["input"]["text"], "Hello");
        assert_eq!(body["voice"]["languageCode"], "en-US");
        assert_eq!(body["audioConfig"]["audioEncoding"], "LINEAR16");
        assert_eq!(body["audioConfig"]["speakingRate"], 1.25);
    }
}
