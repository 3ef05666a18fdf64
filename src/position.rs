//! Raw position samples as delivered by an external position source

use geo::Point;

/// One raw position sample from the position source
///
/// Immutable once created; the engine only reads samples. Timestamps must be
/// strictly increasing within a session - older samples are dropped by the
/// session, not processed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// WGS84 coordinate (x = longitude, y = latitude)
    pub point: Point<f64>,
    /// Horizontal accuracy radius in meters
    pub accuracy_m: f64,
    /// Instantaneous ground speed in m/s, if the source supplies one
    pub speed_mps: Option<f64>,
    /// Device-supplied compass heading in degrees `[0, 360)`, if available
    pub heading_deg: Option<f64>,
    /// Sample time in milliseconds since an arbitrary session-consistent epoch
    pub timestamp_ms: u64,
}

impl Position {
    /// Create a sample with no speed/heading and a nominal 5m accuracy
    pub fn new(lat: f64, lon: f64, timestamp_ms: u64) -> Self {
        Self {
            point: Point::new(lon, lat),
            accuracy_m: 5.0,
            speed_mps: None,
            heading_deg: None,
            timestamp_ms,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = Some(heading_deg);
        self
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = accuracy_m;
        self
    }

    /// Latitude in degrees
    pub fn lat(&self) -> f64 {
        self.point.y()
    }

    /// Longitude in degrees
    pub fn lon(&self) -> f64 {
        self.point.x()
    }
}
