//! Narration passes
//!
//! A pass walks beacons (all of them, or the spotlight hits) and narrates
//! each one on the beacon's own output, waiting out the clip before moving
//! on. Stop is honoured at the checkpoint before each beacon and keeps a
//! clip that finished synthesizing after it from starting; skip ends the
//! current clip wait early.

use super::{Narrator, NO_BEACONS_PROMPT, NO_HITS_PROMPT};
use crate::beacon::{Beacon, BeaconId};
use crate::spatial::ConeQuery;
use crate::speech::OutputId;
use crate::state::Mode;
use crate::Result;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::futures::Notified;
use tokio_util::sync::CancellationToken;

/// How a pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassEnd {
    /// Every selected beacon was visited
    Completed,
    /// Stop was observed at a checkpoint
    Cancelled,
    /// The registry was empty; the capture prompt was spoken
    NoBeacons,
    /// The spotlight found nothing; the direction prompt was spoken
    NoHits,
}

/// Outcome of a finished pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub mode: Mode,
    pub end: PassEnd,
    /// Beacons narrated, in order
    pub narrated: Vec<BeaconId>,
}

impl Narrator {
    /// Read every beacon in insertion order.
    ///
    /// With `first_time_only`, waits out the capture grace period first and
    /// skips beacons that were already read.
    pub async fn read_all(&self, first_time_only: bool) -> Result<PassReport> {
        self.run_pass(Mode::ReadingAll, first_time_only).await
    }

    /// Read the beacons inside the viewer's spotlight cone, nearest first
    pub async fn read_spotlight(&self) -> Result<PassReport> {
        self.run_pass(Mode::ReadingSpotlight, false).await
    }

    async fn run_pass(&self, mode: Mode, first_time_only: bool) -> Result<PassReport> {
        let token = self.begin_pass(mode)?;
        info!("Read text started ({:?}, first time only: {})", mode, first_time_only);

        let registry_empty = self.inner.registry.lock().is_empty();
        let result = if registry_empty {
            info!("No text beacons found");
            self.announce(NO_BEACONS_PROMPT)
                .await
                .map(|()| PassReport {
                    mode,
                    end: PassEnd::NoBeacons,
                    narrated: Vec::new(),
                })
        } else if mode == Mode::ReadingSpotlight {
            self.spotlight_pass(&token).await
        } else {
            self.all_pass(first_time_only, &token).await
        };

        self.end_pass();

        match result {
            Ok(report) => {
                info!("Read text finished: {:?}, {} narrated", report.end, report.narrated.len());
                Ok(report)
            }
            Err(e) => {
                error!("Narration pass aborted: {}", e);
                Err(e)
            }
        }
    }

    fn begin_pass(&self, mode: Mode) -> Result<CancellationToken> {
        self.inner.session.lock().begin_pass(mode)?;
        let token = CancellationToken::new();
        *self.inner.pass_cancel.lock() = Some(token.clone());
        Ok(token)
    }

    /// Tear down after any pass: default output, idle session
    fn end_pass(&self) {
        self.inner.pass_cancel.lock().take();
        self.inner.gateway.set_output(OutputId::Default);
        self.inner.session.lock().end_pass();
    }

    async fn all_pass(&self, first_time_only: bool, token: &CancellationToken) -> Result<PassReport> {
        if first_time_only {
            debug!("Waiting {:?} for capture to settle", self.inner.settings.capture_grace);
            tokio::time::sleep(self.inner.settings.capture_grace).await;
        }

        let mut report = PassReport {
            mode: Mode::ReadingAll,
            end: PassEnd::Completed,
            narrated: Vec::new(),
        };

        let beacons = self.inner.registry.lock().all();
        for beacon in beacons {
            if self.checkpoint(token).await {
                report.end = PassEnd::Cancelled;
                break;
            }
            if !self.is_registered(&beacon) {
                debug!("Beacon {} removed during pass", beacon.id());
                continue;
            }

            if first_time_only && beacon.mark_first_time_read() {
                continue;
            }

            if self.narrate(&beacon, token).await? {
                report.narrated.push(beacon.id());
            }
        }

        if report.end == PassEnd::Completed && self.observe_cancel(token) {
            report.end = PassEnd::Cancelled;
        }

        Ok(report)
    }

    async fn spotlight_pass(&self, token: &CancellationToken) -> Result<PassReport> {
        let settings = &self.inner.settings;
        let pose = self.inner.pose.viewer_pose();
        self.inner.session.lock().set_narration_origin(pose.position);
        let query = ConeQuery::from_pose(
            pose,
            settings.spotlight_radius,
            settings.spotlight_depth,
            settings.spotlight_angle,
        );
        let hits = self.inner.spatial.cone_query(&query);
        debug!("Spotlight query returned {} hits", hits.len());

        let mut report = PassReport {
            mode: Mode::ReadingSpotlight,
            end: PassEnd::Completed,
            narrated: Vec::new(),
        };

        for handle in hits {
            // Only hits under the narration root count
            let resolved = self.inner.registry.lock().by_spatial_handle(handle);
            let Some(beacon) = resolved else {
                continue;
            };

            if self.checkpoint(token).await {
                report.end = PassEnd::Cancelled;
                break;
            }
            if !self.is_registered(&beacon) {
                continue;
            }

            debug!("Text beacon hit: {:?}", beacon.text());
            if self.narrate(&beacon, token).await? {
                report.narrated.push(beacon.id());
            }
        }

        if report.end == PassEnd::Completed && self.observe_cancel(token) {
            report.end = PassEnd::Cancelled;
        }

        if report.narrated.is_empty() && report.end == PassEnd::Completed {
            self.announce(NO_HITS_PROMPT).await?;
            report.end = PassEnd::NoHits;
        }

        Ok(report)
    }

    /// Checkpoint before each beacon.
    ///
    /// Returns true when the pass must stop. Otherwise suspends until any
    /// repeat in progress has finished.
    async fn checkpoint(&self, token: &CancellationToken) -> bool {
        if self.observe_cancel(token) {
            return true;
        }

        loop {
            let finished = self.inner.repeat_done.notified();
            tokio::pin!(finished);
            finished.as_mut().enable();

            let repeating = self.inner.session.lock().is_repeating();
            if !repeating {
                break;
            }
            debug!("Waiting for repeat to finish");
            finished.await;
        }

        self.observe_cancel(token)
    }

    fn observe_cancel(&self, token: &CancellationToken) -> bool {
        if token.is_cancelled() {
            self.inner.session.lock().take_cancel();
            info!("Narration stopped");
            return true;
        }
        false
    }

    fn is_registered(&self, beacon: &Beacon) -> bool {
        self.inner.registry.lock().contains(beacon.id())
    }

    /// Narrate one beacon on its own output and wait out the clip.
    ///
    /// Returns false when stop or clear arrived while the clip was being
    /// synthesized; nothing is played then.
    async fn narrate(&self, beacon: &Arc<Beacon>, token: &CancellationToken) -> Result<bool> {
        let rate = self.inner.session.lock().speaking_rate();
        let gateway = &self.inner.gateway;

        gateway.set_output(beacon.audio_output());
        let clip = gateway.synthesize(beacon.text(), rate).await?;

        if token.is_cancelled() {
            debug!("Stopped during synthesis of {:?}", beacon.text());
            return Ok(false);
        }
        if !self.is_registered(beacon) {
            debug!("Beacon {} removed during synthesis", beacon.id());
            return Ok(false);
        }

        let skipped = self.inner.skip.notified();
        tokio::pin!(skipped);
        skipped.as_mut().enable();

        gateway.play(&clip)?;
        self.inner.session.lock().record_narration(beacon);
        debug!("Text is: {:?} ({:.2}s)", beacon.text(), clip.duration().as_secs_f32());

        self.wait_clip(clip.duration(), skipped).await;
        Ok(true)
    }

    /// Speak a prompt on the default output without touching the repeat buffer
    pub async fn announce(&self, text: &str) -> Result<()> {
        let rate = self.inner.session.lock().speaking_rate();
        self.inner.gateway.set_output(OutputId::Default);
        let clip = self.inner.gateway.synthesize(text, rate).await?;
        self.inner.gateway.play(&clip)
    }

    /// Suspend for `duration`, or until skip fires
    pub(super) async fn wait_clip(&self, duration: Duration, skipped: std::pin::Pin<&mut Notified<'_>>) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = skipped => debug!("Clip skipped"),
        }
    }
}
