//! Canonical navigation state snapshot and the events emitted alongside it

use crate::deviation::SuggestedAction;
use crate::modes::TransportMode;
use crate::position::Position;
use crate::route::Route;

/// The aggregate navigation snapshot, replaced atomically on each processed
/// sample
///
/// Exactly one writer exists (the session); subscribers receive clones, never
/// a live reference, so no synchronization is needed on their side. Both the
/// raw measurements (`distance_from_route_m`, `route_mismatch_deg`) and the
/// mode-relative classifications (`is_on_route`, `wrong_way_active`) are
/// exposed; callers that want to re-judge an in-flight episode after a mode
/// change can do so from the raw values.
#[derive(Debug, Clone)]
pub struct NavigationState {
    pub is_navigating: bool,
    /// Last accepted sample, if any has been processed
    pub last_position: Option<Position>,
    /// Device-supplied compass heading, when the source provides one
    pub current_heading_deg: Option<f64>,
    /// Heading actually used for direction judgments: device heading when
    /// present, otherwise GPS-derived movement bearing
    pub movement_heading_deg: Option<f64>,
    /// Smoothed-enough instantaneous speed in m/s (0 until known)
    pub speed_mps: f64,
    pub transport_mode: TransportMode,
    /// Expected forward bearing at the nearest route point
    pub route_direction_deg: Option<f64>,
    pub is_on_route: bool,
    /// Raw distance to the route geometry in meters (always >= 0)
    pub distance_from_route_m: f64,
    /// Raw bearing mismatch against the route direction, when judgable
    pub route_mismatch_deg: Option<f64>,
    pub wrong_way_active: bool,
    /// Escalation counter of the current wrong-way episode (0 when none)
    pub wrong_way_escalations: u32,
    /// Whether alternative routes have been found for the current deviation
    pub has_alternatives: bool,
    /// Horizontal accuracy of the last accepted sample in meters
    pub accuracy_m: f64,
}

impl NavigationState {
    /// Fresh state for a newly started session
    pub(crate) fn initial(transport_mode: TransportMode) -> Self {
        Self {
            is_navigating: true,
            last_position: None,
            current_heading_deg: None,
            movement_heading_deg: None,
            speed_mps: 0.0,
            transport_mode,
            route_direction_deg: None,
            is_on_route: true,
            distance_from_route_m: 0.0,
            route_mismatch_deg: None,
            wrong_way_active: false,
            wrong_way_escalations: 0,
            has_alternatives: false,
            accuracy_m: 0.0,
        }
    }
}

/// Payload of a deviation alert
#[derive(Debug, Clone)]
pub struct RouteDeviation {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub suggested_action: SuggestedAction,
    /// Alternatives already known for this deviation, if any were found
    pub alternative_routes: Option<Vec<Route>>,
}

/// Discrete events emitted to subscribers, in generation order within one
/// sample's processing
#[derive(Debug, Clone)]
pub enum NavEvent {
    /// Alternative routes arrived from the routing provider
    AlternativesFound { routes: Vec<Route> },
    /// The traveler left the route, or the suggested action escalated
    Deviation(RouteDeviation),
    /// The traveler returned to the route
    BackOnRoute { duration_seconds: f64 },
    /// A wrong-way episode began or was re-announced past its cooldown
    WrongWay {
        mismatch_deg: f64,
        escalations: u32,
        timestamp_ms: u64,
    },
    /// Travel direction matches the route again
    BackOnDirection { escalations: u32 },
    /// The transport mode changed following the classifier's advisory
    ModeChanged {
        from: TransportMode,
        to: TransportMode,
    },
    /// The position source reported a transient, non-fatal problem
    SourceWarning { reason: String },
}

/// One publication to subscribers: the full snapshot plus the events this
/// sample generated
#[derive(Debug, Clone)]
pub struct NavUpdate {
    pub state: NavigationState,
    pub events: Vec<NavEvent>,
}
