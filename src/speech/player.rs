//! PCM playback on the default audio device
//!
//! rodio's output stream is not `Send`, so it lives on a dedicated thread
//! and the gateway talks to it over a channel.

use crate::{NarratorError, Result};
use log::{debug, error};
use parking_lot::Mutex;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use std::sync::mpsc::{self, Sender};
use std::thread;

enum PlayerCommand {
    Play {
        samples: Vec<i16>,
        sample_rate: u32,
    },
    Stop,
}

/// Handle to the audio thread; one clip sounds at a time
pub struct AudioPlayer {
    tx: Mutex<Sender<PlayerCommand>>,
}

impl AudioPlayer {
    /// Open the default output device on a new audio thread
    pub fn open() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<PlayerCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<(), String>>();

        thread::Builder::new()
            .name("speech-audio".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("Failed to open audio output: {}", e)));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let mut sink: Option<Sink> = None;
                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        PlayerCommand::Play {
                            samples,
                            sample_rate,
                        } => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                            match Sink::try_new(&handle) {
                                Ok(new_sink) => {
                                    new_sink.append(SamplesBuffer::new(1, sample_rate, samples));
                                    sink = Some(new_sink);
                                }
                                Err(e) => error!("Failed to create audio sink: {}", e),
                            }
                        }
                        PlayerCommand::Stop => {
                            if let Some(old) = sink.take() {
                                old.stop();
                            }
                        }
                    }
                }
                debug!("Audio thread exiting");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { tx: Mutex::new(tx) }),
            Ok(Err(e)) => Err(NarratorError::Audio(e)),
            Err(_) => Err(NarratorError::Audio("Audio thread exited during start-up".into())),
        }
    }

    /// Start `samples` (mono) from the beginning, cutting off anything playing
    pub fn play(&self, samples: &[i16], sample_rate: u32) -> Result<()> {
        self.send(PlayerCommand::Play {
            samples: samples.to_vec(),
            sample_rate,
        })
    }

    pub fn stop(&self) {
        if let Err(e) = self.send(PlayerCommand::Stop) {
            error!("Failed to stop audio: {}", e);
        }
    }

    fn send(&self, cmd: PlayerCommand) -> Result<()> {
        self.tx
            .lock()
            .send(cmd)
            .map_err(|_| NarratorError::Audio("Audio thread is gone".into()))
    }
}
