//! Transport modes, per-mode tracking thresholds, and the speed-based
//! mode classifier
//!
//! The classifier smooths instantaneous GPS speed over a short rolling window
//! and reports which mode the smoothed speed is plausible for. It is an
//! advisory signal: the session decides whether to actually switch modes, and
//! a switch never resets deviation or wrong-way history.

use std::collections::VecDeque;

/// Coarse travel modality used to select tracking tolerances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransportMode {
    Walking,
    Cycling,
    Driving,
    Transit,
}

/// Fixed tracking tolerances owned by each transport mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeThresholds {
    /// Below this speed heading is meaningless; no direction judgment is made
    pub min_speed_mps: f64,
    /// Upper bound of plausible speeds for the mode
    pub max_speed_mps: f64,
    /// Distance from the route above which the traveler is deviating
    pub deviation_distance_m: f64,
    /// Bearing mismatch above which travel counts as wrong-way
    pub wrong_way_threshold_deg: f64,
    /// Deviation distance at which a recalculation is warranted immediately
    pub recalculate_distance_m: f64,
}

impl TransportMode {
    /// Threshold table for this mode
    pub const fn thresholds(self) -> ModeThresholds {
        match self {
            TransportMode::Walking => ModeThresholds {
                min_speed_mps: 0.5,
                max_speed_mps: 3.0,
                deviation_distance_m: 25.0,
                wrong_way_threshold_deg: 120.0,
                recalculate_distance_m: 100.0,
            },
            TransportMode::Cycling => ModeThresholds {
                min_speed_mps: 1.0,
                max_speed_mps: 12.0,
                deviation_distance_m: 35.0,
                wrong_way_threshold_deg: 100.0,
                recalculate_distance_m: 150.0,
            },
            TransportMode::Driving => ModeThresholds {
                min_speed_mps: 2.0,
                max_speed_mps: 70.0,
                deviation_distance_m: 50.0,
                wrong_way_threshold_deg: 90.0,
                recalculate_distance_m: 200.0,
            },
            // Transit is never auto-detected; generous tolerances since the
            // vehicle, not the traveler, picks the path
            TransportMode::Transit => ModeThresholds {
                min_speed_mps: 2.0,
                max_speed_mps: 45.0,
                deviation_distance_m: 100.0,
                wrong_way_threshold_deg: 90.0,
                recalculate_distance_m: 500.0,
            },
        }
    }
}

/// Number of samples the classifier smooths over before judging
pub const SPEED_WINDOW: usize = 5;

/// Mean speed below which the window reads as walking (m/s)
const WALKING_MAX_MPS: f64 = 2.0;
/// Mean speed below which the window reads as cycling (m/s)
const CYCLING_MAX_MPS: f64 = 8.0;
/// Mean speed above which the window reads as driving (m/s)
const DRIVING_MIN_MPS: f64 = 10.0;

/// Rolling-window speed classifier
///
/// The 8-10 m/s band between cycling and driving deliberately suggests
/// nothing, which keeps the advisory stable when speed oscillates around a
/// boundary. Transit is never suggested; only the caller sets it.
#[derive(Debug, Default)]
pub struct SpeedClassifier {
    window: VecDeque<f64>,
}

impl SpeedClassifier {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(SPEED_WINDOW),
        }
    }

    /// Push one instantaneous speed and report the mode the smoothed speed
    /// is plausible for, if any
    ///
    /// Returns `None` until the window is full, and `None` in the dead band
    /// between cycling and driving speeds.
    pub fn push(&mut self, speed_mps: f64) -> Option<TransportMode> {
        if self.window.len() == SPEED_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(speed_mps.max(0.0));

        if self.window.len() < SPEED_WINDOW {
            return None;
        }

        let mean = self.mean()?;
        if mean < WALKING_MAX_MPS {
            Some(TransportMode::Walking)
        } else if mean < CYCLING_MAX_MPS {
            Some(TransportMode::Cycling)
        } else if mean > DRIVING_MIN_MPS {
            Some(TransportMode::Driving)
        } else {
            None
        }
    }

    /// Mean of the current window, if any samples have been pushed
    pub fn mean(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.window.len() as f64)
    }

    /// Discard all accumulated samples
    pub fn reset(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_suggestion_before_window_fills() {
        let mut classifier = SpeedClassifier::new();
        for i in 0..SPEED_WINDOW - 1 {
            assert!(
                classifier.push(1.0).is_none(),
                "suggested a mode after only {} samples",
                i + 1
            );
        }
        assert!(classifier.push(1.0).is_some());
    }

    #[test]
    fn test_walking_speeds() {
        // Scenario C from the tracking requirements: mean ~1.12 m/s
        let mut classifier = SpeedClassifier::new();
        let mut suggestion = None;
        for speed in [1.0, 1.2, 0.8, 1.5, 1.1] {
            suggestion = classifier.push(speed);
        }
        assert_eq!(suggestion, Some(TransportMode::Walking));
    }

    #[test]
    fn test_cycling_speeds() {
        let mut classifier = SpeedClassifier::new();
        let mut suggestion = None;
        for speed in [4.0, 5.5, 6.0, 4.5, 5.0] {
            suggestion = classifier.push(speed);
        }
        assert_eq!(suggestion, Some(TransportMode::Cycling));
    }

    #[test]
    fn test_driving_speeds() {
        let mut classifier = SpeedClassifier::new();
        let mut suggestion = None;
        for speed in [14.0, 15.0, 13.5, 16.0, 15.5] {
            suggestion = classifier.push(speed);
        }
        assert_eq!(suggestion, Some(TransportMode::Driving));
    }

    #[test]
    fn test_dead_band_suggests_nothing() {
        let mut classifier = SpeedClassifier::new();
        let mut suggestion = None;
        for speed in [9.0, 9.0, 9.0, 9.0, 9.0] {
            suggestion = classifier.push(speed);
        }
        assert_eq!(suggestion, None);
    }

    #[test]
    fn test_boundary_noise_is_smoothed_in_mean() {
        // Raw speed swings 0.2 m/s around the walking boundary but the
        // smoothed mean moves only 0.04 m/s; the advisory may still toggle
        // between the two adjacent modes (the session debounces the switch)
        let mut classifier = SpeedClassifier::new();
        for speed in [1.9, 2.1, 1.9, 2.1, 1.9] {
            classifier.push(speed);
        }
        for speed in [2.1, 1.9, 2.1, 1.9] {
            let advisory = classifier.push(speed);
            assert!(matches!(
                advisory,
                Some(TransportMode::Walking) | Some(TransportMode::Cycling)
            ));
            assert!((classifier.mean().unwrap() - 2.0).abs() < 0.05);
        }
    }

    #[test]
    fn test_window_slides() {
        let mut classifier = SpeedClassifier::new();
        for _ in 0..SPEED_WINDOW {
            classifier.push(1.0);
        }
        // Five fast samples push out all slow ones
        let mut suggestion = None;
        for _ in 0..SPEED_WINDOW {
            suggestion = classifier.push(15.0);
        }
        assert_eq!(suggestion, Some(TransportMode::Driving));
        assert!((classifier.mean().unwrap() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_speed_clamped() {
        let mut classifier = SpeedClassifier::new();
        for _ in 0..SPEED_WINDOW {
            classifier.push(-3.0);
        }
        assert_eq!(classifier.mean(), Some(0.0));
    }

    #[test]
    fn test_reset() {
        let mut classifier = SpeedClassifier::new();
        for _ in 0..SPEED_WINDOW {
            classifier.push(15.0);
        }
        classifier.reset();
        assert!(classifier.mean().is_none());
        assert!(classifier.push(15.0).is_none());
    }

    #[test]
    fn test_driving_thresholds_table() {
        let t = TransportMode::Driving.thresholds();
        assert_eq!(t.deviation_distance_m, 50.0);
        assert_eq!(t.wrong_way_threshold_deg, 90.0);
        assert_eq!(t.recalculate_distance_m, 200.0);
    }
}
