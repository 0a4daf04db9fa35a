//! Fire-and-forget command dispatch
//!
//! Passes and repeats run as spawned tasks so interrupts can arrive while
//! they are suspended. Callers observe progress through the session.

use super::Command;
use crate::beacon::Beacon;
use crate::narration::Narrator;
use crate::{NarratorError, Result};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Capture subsystem: recognises text and places a beacon for it
pub trait TextCapture: Send + Sync {
    fn capture(&self, narrator: &Narrator, text: &str) -> Result<Arc<Beacon>>;
}

/// Routes commands to the narrator
pub struct Dispatcher {
    narrator: Narrator,
    capture: Option<Box<dyn TextCapture>>,
}

impl Dispatcher {
    pub fn new(narrator: Narrator) -> Self {
        Self {
            narrator,
            capture: None,
        }
    }

    pub fn with_capture(mut self, capture: Box<dyn TextCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    /// Execute `command`. Long-running work is spawned on the current
    /// runtime and its handle returned; the caller may ignore it.
    pub fn dispatch(&self, command: Command) -> Option<JoinHandle<()>> {
        debug!("Dispatching {:?}", command);

        match command {
            Command::ReadText => Some(self.spawn_pass(false, false)),
            Command::ReadAllText => Some(self.spawn_pass(true, false)),
            Command::ReadNewText => Some(self.spawn_pass(true, true)),
            Command::Stop => {
                self.narrator.stop();
                None
            }
            Command::Skip => {
                self.narrator.skip();
                None
            }
            Command::Repeat => {
                let narrator = self.narrator.clone();
                Some(tokio::spawn(async move {
                    if let Err(e) = narrator.repeat().await {
                        error!("Repeat failed: {}", e);
                    }
                }))
            }
            Command::IncreaseSpeed => {
                self.narrator.increase_speed();
                None
            }
            Command::DecreaseSpeed => {
                self.narrator.decrease_speed();
                None
            }
            Command::ClearBeacons => {
                self.narrator.clear_beacons();
                None
            }
            Command::CaptureText(text) => self.capture_text(&text),
        }
    }

    fn spawn_pass(&self, all: bool, first_time_only: bool) -> JoinHandle<()> {
        let narrator = self.narrator.clone();
        tokio::spawn(async move {
            let result = if all {
                narrator.read_all(first_time_only).await
            } else {
                narrator.read_spotlight().await
            };
            match result {
                Ok(_) => {}
                Err(NarratorError::PassActive) => {
                    warn!("Narration already running; request ignored")
                }
                // Already logged by the pass
                Err(_) => {}
            }
        })
    }

    fn capture_text(&self, text: &str) -> Option<JoinHandle<()>> {
        let Some(capture) = self.capture.as_ref() else {
            warn!("No capture subsystem attached; ignoring capture of {:?}", text);
            return None;
        };

        match capture.capture(&self.narrator, text) {
            Ok(beacon) => {
                info!("Captured text beacon {}", beacon.id());
                Some(self.spawn_pass(true, true))
            }
            Err(e) => {
                error!("Capture failed: {}", e);
                None
            }
        }
    }
}
