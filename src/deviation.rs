//! Off-route deviation tracking and escalation
//!
//! Two-state machine: `OnRoute` until the distance from the route exceeds the
//! active mode's tolerance, then `Deviating` until it drops back. While
//! deviating, the suggested recovery action escalates with elapsed time and
//! distance. All durations are measured on the sample clock (accepted sample
//! timestamps), so escalation is deterministic under test.

use crate::modes::ModeThresholds;

/// Seconds continuously off-route after which alternatives should be offered
const ALTERNATIVE_AFTER_S: f64 = 30.0;
/// Seconds continuously off-route after which a recalculation is warranted
const RECALCULATE_AFTER_S: f64 = 60.0;

/// Recovery action suggested for the current deviation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SuggestedAction {
    /// Head back to the planned route
    Return,
    /// Offer alternative routes
    Alternative,
    /// Request a fresh route from the current position
    Recalculate,
}

/// Snapshot of an ongoing deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviationReport {
    pub distance_m: f64,
    pub duration_seconds: f64,
    pub action: SuggestedAction,
}

/// What changed on this sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviationChange {
    /// Nothing to report (still on route, or deviating with no escalation)
    None,
    /// The traveler just left the route
    Started(DeviationReport),
    /// The suggested action changed during an ongoing deviation (usually an
    /// escalation; stepping back down is possible when the distance drops
    /// below the recalculation radius while still off-route)
    Escalated(DeviationReport),
    /// The traveler returned to the route
    Ended { duration_seconds: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    OnRoute,
    Deviating {
        since_ms: u64,
        last_action: SuggestedAction,
    },
}

/// Tracks how long the traveler has been off-route and escalates the
/// suggested recovery action
#[derive(Debug)]
pub struct DeviationTracker {
    phase: Phase,
}

impl Default for DeviationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviationTracker {
    pub fn new() -> Self {
        Self {
            phase: Phase::OnRoute,
        }
    }

    /// Whether the traveler is currently off-route
    pub fn is_deviating(&self) -> bool {
        matches!(self.phase, Phase::Deviating { .. })
    }

    /// Feed one sample's distance-from-route
    ///
    /// `now_ms` is the accepted sample's timestamp. Only newly entered
    /// deviations and action escalations are reported; a steady ongoing
    /// deviation yields `None` so callers are not re-alerted every sample.
    pub fn update(
        &mut self,
        distance_m: f64,
        thresholds: &ModeThresholds,
        now_ms: u64,
    ) -> DeviationChange {
        let off_route = distance_m > thresholds.deviation_distance_m;

        match self.phase {
            Phase::OnRoute if off_route => {
                let action = Self::action_for(distance_m, 0.0, thresholds);
                self.phase = Phase::Deviating {
                    since_ms: now_ms,
                    last_action: action,
                };
                DeviationChange::Started(DeviationReport {
                    distance_m,
                    duration_seconds: 0.0,
                    action,
                })
            }
            Phase::OnRoute => DeviationChange::None,
            Phase::Deviating { since_ms, .. } if !off_route => {
                let duration_seconds = (now_ms.saturating_sub(since_ms)) as f64 / 1000.0;
                self.phase = Phase::OnRoute;
                DeviationChange::Ended { duration_seconds }
            }
            Phase::Deviating {
                since_ms,
                last_action,
            } => {
                let duration_seconds = (now_ms.saturating_sub(since_ms)) as f64 / 1000.0;
                let action = Self::action_for(distance_m, duration_seconds, thresholds);
                if action != last_action {
                    self.phase = Phase::Deviating {
                        since_ms,
                        last_action: action,
                    };
                    DeviationChange::Escalated(DeviationReport {
                        distance_m,
                        duration_seconds,
                        action,
                    })
                } else {
                    DeviationChange::None
                }
            }
        }
    }

    /// Current report for an ongoing deviation, if any
    pub fn report(&self, distance_m: f64, now_ms: u64) -> Option<DeviationReport> {
        match self.phase {
            Phase::Deviating {
                since_ms,
                last_action,
            } => Some(DeviationReport {
                distance_m,
                duration_seconds: (now_ms.saturating_sub(since_ms)) as f64 / 1000.0,
                action: last_action,
            }),
            Phase::OnRoute => None,
        }
    }

    /// Back to `OnRoute` with no report (session stop)
    pub fn reset(&mut self) {
        self.phase = Phase::OnRoute;
    }

    /// Escalation ladder: the distance rule short-circuits the time rules
    fn action_for(
        distance_m: f64,
        duration_seconds: f64,
        thresholds: &ModeThresholds,
    ) -> SuggestedAction {
        if distance_m > thresholds.recalculate_distance_m
            || duration_seconds > RECALCULATE_AFTER_S
        {
            SuggestedAction::Recalculate
        } else if duration_seconds > ALTERNATIVE_AFTER_S {
            SuggestedAction::Alternative
        } else {
            SuggestedAction::Return
        }
    }
}
