//! Explicitly constructed dependency bundle for the scene.
//!
//! Every component receives a [`StageResources`] at construction instead of
//! reaching for ambient globals; the handles inside are cheap clones over
//! shared single-threaded state.

use std::time::Duration;

use crate::foundation::device::{ClassifierConfig, DeviceProfile, Viewport};
use crate::foundation::error::StageResult;
use crate::notify::bus::NotificationBus;
use crate::timing::scheduler::Scheduler;

/// Cross-component timing constants. Component-local timings live in the
/// per-engine config structs; these are the ones more than one party cares
/// about.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay after mount before the scroll cue may first appear, in seconds.
    pub scroll_initial_delay_secs: f64,
    /// Read delay after the last typed segment before its fade begins.
    pub typed_read_delay_secs: f64,
    /// Delay after the last typed segment before the morph engines mount.
    pub morph_mount_delay_secs: f64,
    /// Mask fade-out duration once playback is confirmed.
    pub mask_fade_secs: f64,
    /// Hold before the mask fade on standard profiles.
    pub mask_hold_standard_secs: f64,
    /// Hold before the mask fade on constrained profiles (covers native
    /// player chrome such as a flash of play-button UI).
    pub mask_hold_constrained_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            scroll_initial_delay_secs: 5.0,
            typed_read_delay_secs: 3.5,
            morph_mount_delay_secs: 3.0,
            mask_fade_secs: 0.7,
            mask_hold_standard_secs: 1.0,
            mask_hold_constrained_secs: 2.0,
        }
    }
}

impl TimingConfig {
    pub fn from_json(json: &str) -> StageResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::foundation::error::StageError::validation(e.to_string()))
    }

    pub fn scroll_initial_delay(&self) -> Duration {
        Duration::from_secs_f64(self.scroll_initial_delay_secs.max(0.0))
    }

    pub fn typed_read_delay(&self) -> Duration {
        Duration::from_secs_f64(self.typed_read_delay_secs.max(0.0))
    }

    pub fn morph_mount_delay(&self) -> Duration {
        Duration::from_secs_f64(self.morph_mount_delay_secs.max(0.0))
    }

    pub fn mask_fade(&self) -> Duration {
        Duration::from_secs_f64(self.mask_fade_secs.max(0.0))
    }

    pub fn mask_hold(&self, device: DeviceProfile) -> Duration {
        let secs = if device.is_constrained() {
            self.mask_hold_constrained_secs
        } else {
            self.mask_hold_standard_secs
        };
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Shared scene infrastructure handed to every component at construction.
#[derive(Clone)]
pub struct StageResources {
    pub scheduler: Scheduler,
    pub bus: NotificationBus,
    pub device: DeviceProfile,
    pub viewport: Viewport,
    pub timing: TimingConfig,
}

impl StageResources {
    pub fn new(viewport: Viewport, classifier: ClassifierConfig, timing: TimingConfig) -> Self {
        let scheduler = Scheduler::new();
        let bus = NotificationBus::new(scheduler.clone());
        Self {
            scheduler,
            bus,
            device: DeviceProfile::classify(viewport, &classifier),
            viewport,
            timing,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/resources.rs"]
mod tests;
