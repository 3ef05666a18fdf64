//! Nav Track - Real-Time Navigation Tracking Engine
//!
//! This library consumes a continuous stream of raw GPS position samples
//! during an active trip, together with an immutable planned route, and
//! derives on every sample whether the traveler is on-route, deviating,
//! heading the wrong way, or has changed transport mode. Recovery actions
//! (alerts, re-route requests) escalate with hysteresis so noisy fixes do
//! not cause alert flapping.
//!
//! # Architecture
//!
//! - **[`geometry`]**: Pure great-circle and bearing math
//! - **[`Route`]** / **[`RouteFix`]**: Planned route storage and
//!   nearest-point projection
//! - **[`SpeedClassifier`]**: Rolling-window transport-mode advisory
//! - **[`DeviationTracker`]** / **[`WrongWayDetector`]**: Debounced
//!   off-route and wrong-direction classification
//! - **[`NavigationSession`]**: Per-trip orchestrator publishing
//!   [`NavigationState`] snapshots and [`NavEvent`]s to subscribers
//! - **[`RoutingProvider`]**: Async boundary to an external routing service
//!   for alternative routes
//!
//! Route *planning* is out of scope: routes come from an external provider
//! and are only consumed here. Sensor acquisition is likewise abstracted
//! behind [`PositionSource`].
//!
//! # Usage Example
//!
//! ```rust
//! use geo::Point;
//! use nav_track::{
//!     NavigationSession, Position, Route, SessionConfig, TransportMode,
//! };
//!
//! # fn main() -> nav_track::Result<()> {
//! let route = Route::from_points(vec![
//!     Point::new(-0.1278, 51.5074),
//!     Point::new(-0.1270, 51.5120),
//! ])?;
//!
//! let mut session = NavigationSession::start(
//!     route,
//!     TransportMode::Walking,
//!     None, // no routing provider: recalculation escalations are advisory
//!     SessionConfig::default(),
//! )?;
//! let mut updates = session.subscribe();
//!
//! session.process_position(Position::new(51.5080, -0.1276, 1_000).with_speed(1.3));
//!
//! let update = updates.try_recv().expect("one update per sample");
//! assert!(update.state.is_on_route);
//! # Ok(())
//! # }
//! ```

mod deviation;
pub mod geometry;
mod modes;
mod position;
mod rerouting;
mod route;
mod session;
mod source;
mod state;
mod wrong_way;

// Public API exports
pub use deviation::{DeviationChange, DeviationReport, DeviationTracker, SuggestedAction};
pub use modes::{ModeThresholds, SpeedClassifier, TransportMode, SPEED_WINDOW};
pub use position::Position;
pub use rerouting::{RoutingError, RoutingProvider};
pub use route::{Route, RouteFix, RouteIndex};
pub use session::{NavigationSession, SessionConfig};
pub use source::{drive, PositionSource, PositionUpdate, SourceError};
pub use state::{NavEvent, NavUpdate, NavigationState, RouteDeviation};
pub use wrong_way::{WrongWayChange, WrongWayDetector};

/// Error types for the navigation engine
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("route needs at least two path points")]
    EmptyRoute,

    #[error("position source error: {0}")]
    Source(#[from] SourceError),
}

pub type Result<T> = std::result::Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that the main entry points are accessible
        let _: fn() -> SessionConfig = SessionConfig::default;
        let _: fn() -> SpeedClassifier = SpeedClassifier::new;
        let _: fn() -> DeviationTracker = DeviationTracker::new;
    }
}
