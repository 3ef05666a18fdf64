//! Wrong-way detection
//!
//! Compares the bearing of actual movement to the expected route bearing at
//! the nearest point. Direction is only judged while speed is above the
//! active mode's minimum - a near-stationary GPS fix has no meaningful
//! heading, so a 180 degree mismatch at 0.1 m/s must not trigger anything.
//!
//! Entering a wrong-way episode and each rate-limited re-announcement while
//! it persists increment an escalation counter that is exposed in the event
//! payload, so callers can sharpen wording without the engine knowing about
//! wording. The counter resets only when travel direction recovers.
//! Re-announcement cadence is a caller-tunable cooldown on the sample clock.

use crate::geometry::angle_difference;
use crate::modes::ModeThresholds;

/// What changed on this sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WrongWayChange {
    None,
    /// A new wrong-way episode began
    Entered { mismatch_deg: f64, escalations: u32 },
    /// The episode persists and the repeat cooldown has elapsed
    StillWrong { mismatch_deg: f64, escalations: u32 },
    /// Travel direction matches the route again
    Recovered { escalations: u32 },
}

/// Detects sustained travel against the expected route direction
#[derive(Debug, Default)]
pub struct WrongWayDetector {
    active: bool,
    /// Alerts raised for the current episode; resets only on recovery
    escalations: u32,
    last_announced_ms: Option<u64>,
}

impl WrongWayDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn escalations(&self) -> u32 {
        self.escalations
    }

    /// Feed one sample's movement bearing and expected route bearing
    ///
    /// No judgment is made (state is held as-is) when the movement bearing is
    /// unknown or speed is below the mode's minimum.
    pub fn update(
        &mut self,
        movement_bearing_deg: Option<f64>,
        expected_bearing_deg: f64,
        speed_mps: f64,
        thresholds: &ModeThresholds,
        now_ms: u64,
        repeat_cooldown_ms: u64,
    ) -> WrongWayChange {
        let Some(movement) = movement_bearing_deg else {
            return WrongWayChange::None;
        };
        if speed_mps < thresholds.min_speed_mps {
            return WrongWayChange::None;
        }

        let mismatch_deg = angle_difference(movement, expected_bearing_deg);
        let wrong = mismatch_deg > thresholds.wrong_way_threshold_deg;

        match (self.active, wrong) {
            (false, true) => {
                self.active = true;
                self.escalations = 1;
                self.last_announced_ms = Some(now_ms);
                WrongWayChange::Entered {
                    mismatch_deg,
                    escalations: self.escalations,
                }
            }
            (true, true) => {
                let due = self
                    .last_announced_ms
                    .is_none_or(|last| now_ms.saturating_sub(last) >= repeat_cooldown_ms);
                if due {
                    self.escalations += 1;
                    self.last_announced_ms = Some(now_ms);
                    WrongWayChange::StillWrong {
                        mismatch_deg,
                        escalations: self.escalations,
                    }
                } else {
                    WrongWayChange::None
                }
            }
            (true, false) => {
                let escalations = self.escalations;
                self.active = false;
                self.escalations = 0;
                self.last_announced_ms = None;
                WrongWayChange::Recovered { escalations }
            }
            (false, false) => WrongWayChange::None,
        }
    }

    /// Clear all episode state (session stop)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
