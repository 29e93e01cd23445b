//! Controller power-off on a fully pressed right trigger.

use tracing::{debug, info};

use crate::config::CueConfig;
use crate::controller::{InputSnapshot, TRIGGER_MAX};
use crate::platform::{AudibleCue, ControllerPower};

/// Gate that powers the controller off when the right trigger bottoms out.
///
/// Inert when the power-off capability was not resolved at startup.
pub struct PowerOffGate {
    power: Option<Box<dyn ControllerPower>>,
    user_index: u32,
    cue_hz: u32,
    cue_ms: u32,
}

impl std::fmt::Debug for PowerOffGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerOffGate")
            .field("available", &self.power.is_some())
            .field("user_index", &self.user_index)
            .finish_non_exhaustive()
    }
}

impl PowerOffGate {
    #[must_use]
    pub fn new(power: Option<Box<dyn ControllerPower>>, user_index: u32, cues: &CueConfig) -> Self {
        Self {
            power,
            user_index,
            cue_hz: cues.power_off_hz,
            cue_ms: cues.duration_ms,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.power.is_some()
    }

    /// Returns `true` when the controller was switched off this tick.
    ///
    /// The cue sounds before the power-off request, whether or not it succeeds.
    pub fn check(&mut self, snapshot: &InputSnapshot, cue: &mut dyn AudibleCue) -> bool {
        let Some(power) = self.power.as_deref_mut() else {
            return false;
        };
        if snapshot.right_trigger != TRIGGER_MAX {
            return false;
        }

        cue.beep(self.cue_hz, self.cue_ms);
        let off = power.power_off(self.user_index);
        if off {
            info!("Controller {} powered off", self.user_index);
        } else {
            debug!("Power-off request for controller {} failed", self.user_index);
        }
        off
    }
}
