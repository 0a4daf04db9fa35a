//! Interrupt commands: stop, skip, repeat, speed and clear

use super::Narrator;
use crate::beacon::Beacon;
use crate::speech::OutputId;
use crate::Result;
use log::{debug, info, warn};
use std::sync::Arc;

impl Narrator {
    /// Silence the current clip and stop the running pass at its next
    /// checkpoint. The clip wait in progress is not shortened.
    pub fn stop(&self) {
        info!("Stop playback");
        let flagged = self.inner.session.lock().request_cancel();
        if let Some(token) = self.inner.pass_cancel.lock().as_ref() {
            token.cancel();
        }
        if !flagged {
            debug!("No pass running; stop only silences audio");
        }
        self.inner.gateway.stop();
    }

    /// Silence the current clip and move on to the next beacon now
    pub fn skip(&self) {
        info!("Skipping to next text");
        self.inner.gateway.stop();
        self.inner.skip.notify_waiters();
    }

    /// Replay the most recent narration.
    ///
    /// During a pass the in-flight clip restarts on its output and the pass
    /// waits for it; when idle, the last text is synthesized again on the
    /// last beacon's output (or the default output if that beacon is gone).
    /// Returns false when another repeat is already playing.
    pub async fn repeat(&self) -> Result<bool> {
        let (running, current, text, rate) = {
            let mut session = self.inner.session.lock();
            if !session.begin_repeat() {
                debug!("Repeat already in progress");
                return Ok(false);
            }
            (
                session.is_running(),
                session.current_beacon(),
                session.last_text().to_string(),
                session.speaking_rate(),
            )
        };
        info!("Repeating text");

        let previous = self.inner.gateway.output();
        let result = if running {
            self.replay_in_flight().await;
            Ok(())
        } else {
            self.replay_last(current, &text, rate).await
        };

        self.inner.gateway.set_output(previous);
        self.inner.session.lock().end_repeat();
        self.inner.repeat_done.notify_waiters();

        if let Err(ref e) = result {
            warn!("Repeat failed: {}", e);
        }
        result.map(|()| true)
    }

    async fn replay_in_flight(&self) {
        let skipped = self.inner.skip.notified();
        tokio::pin!(skipped);
        skipped.as_mut().enable();

        match self.inner.gateway.replay() {
            Some(duration) => self.wait_clip(duration, skipped).await,
            None => debug!("Nothing loaded to replay"),
        }
    }

    async fn replay_last(&self, current: Option<Arc<Beacon>>, text: &str, rate: f32) -> Result<()> {
        let output = current
            .as_ref()
            .map(|beacon| beacon.audio_output())
            .unwrap_or(OutputId::Default);
        drop(current);

        let gateway = &self.inner.gateway;
        gateway.set_output(output);
        let clip = gateway.synthesize(text, rate).await?;

        let skipped = self.inner.skip.notified();
        tokio::pin!(skipped);
        skipped.as_mut().enable();

        gateway.play(&clip)?;
        self.wait_clip(clip.duration(), skipped).await;
        Ok(())
    }

    /// Change the speaking rate by `delta`; returns the new, clamped rate
    pub fn adjust_rate(&self, delta: f32) -> f32 {
        self.inner.session.lock().adjust_rate(delta)
    }

    pub fn increase_speed(&self) -> f32 {
        let rate = self.adjust_rate(self.inner.settings.rate_step);
        info!("Text speed increased to: {}", rate);
        rate
    }

    pub fn decrease_speed(&self) -> f32 {
        let rate = self.adjust_rate(-self.inner.settings.rate_step);
        info!("Text speed decreased to: {}", rate);
        rate
    }

    /// Remove every beacon and forget the repeat buffer
    ///
    /// A pass in flight skips beacons it has not reached yet.
    pub fn clear_beacons(&self) {
        let removed = {
            let mut registry = self.inner.registry.lock();
            let removed = registry.all();
            registry.clear();
            removed
        };
        for beacon in &removed {
            self.inner.gateway.release(beacon.audio_output());
        }
        self.inner.session.lock().reset_repeat_buffer();
        info!("Text beacons cleared");
    }
}
