//! Navigation session: the top-level state machine orchestrating all
//! trackers per incoming position sample
//!
//! One session object per active trip, constructed by
//! [`NavigationSession::start`] and owned by the caller; there is no
//! process-wide state, so
//! independent sessions can coexist (and be tested) in one process. The
//! session is a single-threaded reactive processor: all trackers run
//! sequentially within one sample's handling because they all read or mutate
//! the one [`NavigationState`]. Only the routing-provider call is
//! asynchronous, and it never blocks sample processing.

use crate::deviation::{DeviationChange, DeviationTracker, SuggestedAction};
use crate::geometry::{angle_difference, forward_bearing, haversine_distance};
use crate::modes::{SpeedClassifier, TransportMode};
use crate::position::Position;
use crate::rerouting::{RerouteRequester, RoutingProvider};
use crate::route::Route;
use crate::state::{NavEvent, NavUpdate, NavigationState, RouteDeviation};
use crate::wrong_way::{WrongWayChange, WrongWayDetector};
use crate::{NavError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Displacement below which a GPS-derived bearing is considered noise
const MIN_BEARING_DISPLACEMENT_M: f64 = 1.0;

/// Consecutive agreeing advisories required before the mode switches.
/// A smoothed mean oscillating around a class boundary still alternates its
/// advisory; requiring sustained agreement keeps the mode from flapping.
const MODE_CONFIRM_SAMPLES: u8 = 3;

/// Caller-tunable session parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Minimum gap between repeated wrong-way announcements for one episode,
    /// measured on the sample clock
    pub wrong_way_repeat_cooldown: Duration,
    /// Whether the speed classifier's advisory is applied automatically
    /// (after a short confirmation streak). Either way the advisory never
    /// overrides Transit and never resets deviation or wrong-way history.
    pub auto_apply_mode_advisory: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wrong_way_repeat_cooldown: Duration::from_secs(10),
            auto_apply_mode_advisory: true,
        }
    }
}

/// One active navigation session
pub struct NavigationSession {
    route: Route,
    state: NavigationState,
    config: SessionConfig,
    classifier: SpeedClassifier,
    deviation: DeviationTracker,
    wrong_way: WrongWayDetector,
    reroute: Option<RerouteRequester>,
    alternatives: Option<Vec<Route>>,
    pending_advisory: Option<(TransportMode, u8)>,
    subscribers: Vec<mpsc::UnboundedSender<NavUpdate>>,
    last_timestamp_ms: Option<u64>,
    previous_position: Option<Position>,
    stopped: bool,
}

impl NavigationSession {
    /// Start a navigation session over an immutable planned route
    ///
    /// The route must have at least two path points; `Route` construction
    /// already guarantees this, and it is re-checked here because an invalid
    /// route is a caller error that must surface at start, not per-sample.
    /// Pass a provider to enable alternative-route requests on recalculation
    /// escalations (requires a tokio runtime context when they fire).
    pub fn start(
        route: Route,
        initial_mode: TransportMode,
        provider: Option<Arc<dyn RoutingProvider>>,
        config: SessionConfig,
    ) -> Result<Self> {
        if route.points().len() < 2 {
            return Err(NavError::EmptyRoute);
        }
        Ok(Self {
            route,
            state: NavigationState::initial(initial_mode),
            config,
            classifier: SpeedClassifier::new(),
            deviation: DeviationTracker::new(),
            wrong_way: WrongWayDetector::new(),
            reroute: provider.map(RerouteRequester::new),
            alternatives: None,
            pending_advisory: None,
            subscribers: Vec::new(),
            last_timestamp_ms: None,
            previous_position: None,
            stopped: false,
        })
    }

    /// Current snapshot
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// The route this session navigates
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Whether the session is still running
    pub fn is_active(&self) -> bool {
        !self.stopped
    }

    /// Subscribe to per-sample snapshots and events
    ///
    /// Sends are non-blocking; a subscriber that falls behind buffers, and
    /// one that drops its receiver is pruned on the next publication.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<NavUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Process one raw position sample
    ///
    /// Runs the full per-sample pipeline: ordering check, state update,
    /// movement heading, mode advisory, route projection, deviation
    /// tracking, wrong-way detection, publication.
    pub fn process_position(&mut self, position: Position) {
        if self.stopped {
            tracing::debug!("sample ignored: session stopped");
            return;
        }
        // Out-of-order samples are dropped, never processed
        if let Some(last) = self.last_timestamp_ms
            && position.timestamp_ms <= last
        {
            tracing::debug!(
                timestamp = position.timestamp_ms,
                last,
                "dropping out-of-order sample"
            );
            return;
        }

        let mut events = Vec::new();
        let now_ms = position.timestamp_ms;

        // Completions from an earlier recalculation, if any
        if let Some(requester) = &mut self.reroute
            && let Some(routes) = requester.poll()
        {
            self.state.has_alternatives = true;
            self.alternatives = Some(routes.clone());
            events.push(NavEvent::AlternativesFound { routes });
        }

        let speed = self.effective_speed(&position);
        let movement_heading = self.movement_heading(&position);

        self.state.speed_mps = speed;
        self.state.accuracy_m = position.accuracy_m;
        self.state.current_heading_deg = position.heading_deg;
        self.state.movement_heading_deg = movement_heading;

        // Mode advisory from smoothed speed; applied without touching
        // deviation or wrong-way history, and never over Transit
        let mode_event = self.apply_mode_advisory(speed);

        // Project onto the route with the (possibly just updated) mode's
        // thresholds
        let mode = self.state.transport_mode;
        let thresholds = mode.thresholds();
        let fix = self.route.index().project(position.point);

        self.state.distance_from_route_m = fix.distance_m;
        self.state.route_direction_deg = Some(fix.expected_bearing_deg);
        self.state.is_on_route = fix.distance_m <= thresholds.deviation_distance_m;
        self.state.route_mismatch_deg =
            movement_heading.map(|h| angle_difference(h, fix.expected_bearing_deg));

        // Deviation tracking and escalation
        match self.deviation.update(fix.distance_m, &thresholds, now_ms) {
            DeviationChange::Started(report) | DeviationChange::Escalated(report) => {
                if report.action == SuggestedAction::Recalculate {
                    self.request_alternatives(&position);
                }
                events.push(NavEvent::Deviation(RouteDeviation {
                    distance_meters: report.distance_m,
                    duration_seconds: report.duration_seconds,
                    suggested_action: report.action,
                    alternative_routes: self.alternatives.clone(),
                }));
            }
            DeviationChange::Ended { duration_seconds } => {
                self.alternatives = None;
                self.state.has_alternatives = false;
                events.push(NavEvent::BackOnRoute { duration_seconds });
            }
            DeviationChange::None => {
                // An unresolved recalculation keeps retrying (the requester
                // de-duplicates in-flight work)
                if !self.state.has_alternatives
                    && let Some(report) = self.deviation.report(fix.distance_m, now_ms)
                    && report.action == SuggestedAction::Recalculate
                {
                    self.request_alternatives(&position);
                }
            }
        }

        // Wrong-way detection
        let change = self.wrong_way.update(
            movement_heading,
            fix.expected_bearing_deg,
            speed,
            &thresholds,
            now_ms,
            self.config.wrong_way_repeat_cooldown.as_millis() as u64,
        );
        match change {
            WrongWayChange::Entered {
                mismatch_deg,
                escalations,
            }
            | WrongWayChange::StillWrong {
                mismatch_deg,
                escalations,
            } => {
                events.push(NavEvent::WrongWay {
                    mismatch_deg,
                    escalations,
                    timestamp_ms: now_ms,
                });
            }
            WrongWayChange::Recovered { escalations } => {
                events.push(NavEvent::BackOnDirection { escalations });
            }
            WrongWayChange::None => {}
        }
        self.state.wrong_way_active = self.wrong_way.is_active();
        self.state.wrong_way_escalations = self.wrong_way.escalations();

        // Mode change is announced after the tracking events of this sample
        if let Some(event) = mode_event {
            events.push(event);
        }

        self.state.last_position = Some(position);
        self.last_timestamp_ms = Some(now_ms);
        self.previous_position = Some(position);

        self.publish(events);
    }

    /// Surface a transient position-source problem to subscribers
    ///
    /// The session stays alive and keeps its last known state; processing
    /// resumes with the next valid sample.
    pub fn report_source_warning(&mut self, reason: impl Into<String>) {
        if self.stopped {
            return;
        }
        let reason = reason.into();
        tracing::warn!(reason = %reason, "position source warning");
        self.publish(vec![NavEvent::SourceWarning { reason }]);
    }

    /// Stop the session
    ///
    /// Idempotent. Invalidates any in-flight alternative-route request so a
    /// late completion cannot resurrect this session's state, and closes all
    /// subscriber channels.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.state.is_navigating = false;
        if let Some(requester) = &mut self.reroute {
            requester.invalidate();
        }
        self.alternatives = None;
        self.subscribers.clear();
        self.deviation.reset();
        self.wrong_way.reset();
        self.classifier.reset();
        self.pending_advisory = None;
    }

    /// Instantaneous speed: source-supplied when present, otherwise derived
    /// from displacement over the previous accepted sample
    fn effective_speed(&self, position: &Position) -> f64 {
        if let Some(speed) = position.speed_mps {
            return speed.max(0.0);
        }
        if let Some(prev) = &self.previous_position {
            let dt_s = (position.timestamp_ms.saturating_sub(prev.timestamp_ms)) as f64 / 1000.0;
            if dt_s > 0.0 {
                return haversine_distance(prev.point, position.point) / dt_s;
            }
        }
        0.0
    }

    /// Heading used for direction judgments: device compass when supplied,
    /// otherwise GPS movement bearing over a meaningful displacement,
    /// otherwise the last known heading
    fn movement_heading(&self, position: &Position) -> Option<f64> {
        if let Some(heading) = position.heading_deg {
            return Some(heading);
        }
        if let Some(prev) = &self.previous_position
            && haversine_distance(prev.point, position.point) >= MIN_BEARING_DISPLACEMENT_M
        {
            return Some(forward_bearing(prev.point, position.point));
        }
        self.state.movement_heading_deg
    }

    fn apply_mode_advisory(&mut self, speed: f64) -> Option<NavEvent> {
        let advisory = self.classifier.push(speed)?;
        let current = self.state.transport_mode;
        if !self.config.auto_apply_mode_advisory
            || current == TransportMode::Transit
            || advisory == current
        {
            self.pending_advisory = None;
            return None;
        }
        let streak = match self.pending_advisory {
            Some((mode, streak)) if mode == advisory => streak + 1,
            _ => 1,
        };
        if streak < MODE_CONFIRM_SAMPLES {
            self.pending_advisory = Some((advisory, streak));
            return None;
        }
        self.pending_advisory = None;
        self.state.transport_mode = advisory;
        Some(NavEvent::ModeChanged {
            from: current,
            to: advisory,
        })
    }

    fn request_alternatives(&mut self, position: &Position) {
        let destination = self.route.destination();
        let mode = self.state.transport_mode;
        if let Some(requester) = &mut self.reroute {
            requester.request(position.point, destination, mode);
        }
    }

    fn publish(&mut self, events: Vec<NavEvent>) {
        let update = NavUpdate {
            state: self.state.clone(),
            events,
        };
        self.subscribers
            .retain(|tx| tx.send(update.clone()).is_ok());
    }
}

impl Drop for NavigationSession {
    fn drop(&mut self) {
        self.stop();
    }
}
