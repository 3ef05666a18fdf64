//! Route storage and nearest-point projection

use crate::geometry::{forward_bearing, haversine_distance, segment_projection};
use crate::{NavError, Result};
use geo::Point;

/// An immutable planned route: an ordered sequence of path points plus the
/// overall destination
///
/// Owned by the caller and read-only to the engine for the lifetime of a
/// navigation session.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    points: Vec<Point<f64>>,
    destination: Point<f64>,
}

impl Route {
    /// Create a route from path points and a destination
    ///
    /// Routes with fewer than two path points are rejected: a single point
    /// has no geometry to project against.
    pub fn new(points: Vec<Point<f64>>, destination: Point<f64>) -> Result<Self> {
        if points.len() < 2 {
            return Err(NavError::EmptyRoute);
        }
        Ok(Self { points, destination })
    }

    /// Create a route whose destination is its final path point
    pub fn from_points(points: Vec<Point<f64>>) -> Result<Self> {
        let destination = *points.last().ok_or(NavError::EmptyRoute)?;
        Self::new(points, destination)
    }

    /// Build a route from parsed GPX data by flattening all track segments
    /// in document order
    pub fn from_gpx(gpx: &gpx::Gpx) -> Result<Self> {
        let points: Vec<Point<f64>> = gpx
            .tracks
            .iter()
            .flat_map(|track| &track.segments)
            .flat_map(|segment| &segment.points)
            .map(|waypoint| waypoint.point())
            .collect();

        Self::from_points(points)
    }

    /// Read and parse a GPX document into a route
    pub fn from_gpx_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let gpx = gpx::read(reader)?;
        Self::from_gpx(&gpx)
    }

    /// Path points in route order
    pub fn points(&self) -> &[Point<f64>] {
        &self.points
    }

    /// The overall destination
    pub fn destination(&self) -> Point<f64> {
        self.destination
    }

    /// Total path length in meters
    pub fn total_distance(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| haversine_distance(pair[0], pair[1]))
            .sum()
    }

    /// Projection index over this route's geometry
    pub fn index(&self) -> RouteIndex<'_> {
        RouteIndex { route: self }
    }
}

/// Result of projecting a position onto the route geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteFix {
    /// Minimum distance from the position to the route in meters
    pub distance_m: f64,
    /// Expected forward bearing at the nearest point, degrees `[0, 360)`
    pub expected_bearing_deg: f64,
    /// Index of the closest segment (between points `i` and `i + 1`)
    pub segment_index: usize,
}

/// Answers "how far is P from the route, and which way should travel be
/// heading there"
///
/// The scan is O(n) in the number of path points per query. Routes are
/// bounded (hundreds of points) and samples arrive at <=1 Hz, so this is
/// cheap; a spatial bucket index would only pay off for far longer routes.
pub struct RouteIndex<'a> {
    route: &'a Route,
}

impl RouteIndex<'_> {
    /// Project a position onto the route
    pub fn project(&self, p: Point<f64>) -> RouteFix {
        let points = self.route.points();

        let mut best_distance = f64::INFINITY;
        let mut best_index = 0;
        let mut best_t = 0.0;

        for (i, pair) in points.windows(2).enumerate() {
            let (distance, t) = segment_projection(p, pair[0], pair[1]);
            if distance < best_distance {
                best_distance = distance;
                best_index = i;
                best_t = t;
            }
        }

        // Past the end of the final segment the route direction is no longer
        // meaningful; expect travel toward the destination instead.
        let last_segment = points.len() - 2;
        let expected_bearing_deg = if best_index == last_segment && best_t >= 1.0 {
            forward_bearing(p, self.route.destination())
        } else {
            forward_bearing(points[best_index], points[best_index + 1])
        };

        RouteFix {
            distance_m: best_distance,
            expected_bearing_deg,
            segment_index: best_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point_to_segment_distance;

    fn pt(lat: f64, lon: f64) -> Point<f64> {
        Point::new(lon, lat)
    }

    /// Straight line heading north from the origin, ~1.1 km long
    fn straight_north_route() -> Route {
        Route::from_points(vec![pt(0.0, 0.0), pt(0.01, 0.0)]).unwrap()
    }

    #[test]
    fn test_route_rejects_too_few_points() {
        assert!(matches!(
            Route::from_points(vec![]),
            Err(NavError::EmptyRoute)
        ));
        assert!(matches!(
            Route::from_points(vec![pt(0.0, 0.0)]),
            Err(NavError::EmptyRoute)
        ));
    }

    #[test]
    fn test_from_points_uses_last_as_destination() {
        let route = straight_north_route();
        assert_eq!(route.destination(), pt(0.01, 0.0));
    }

    #[test]
    fn test_total_distance() {
        let route = straight_north_route();
        let d = route.total_distance();
        assert!((d - 1112.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_from_gpx() {
        let mut gpx = gpx::Gpx::default();
        let mut track = gpx::Track::default();
        let mut segment = gpx::TrackSegment::default();
        for i in 0..10 {
            segment
                .points
                .push(gpx::Waypoint::new(pt(51.5 + i as f64 * 0.001, -0.12)));
        }
        track.segments.push(segment);
        gpx.tracks.push(track);

        let route = Route::from_gpx(&gpx).unwrap();
        assert_eq!(route.points().len(), 10);
        assert_eq!(route.destination(), pt(51.509, -0.12));
    }

    #[test]
    fn test_from_gpx_empty_fails() {
        let gpx = gpx::Gpx::default();
        assert!(matches!(Route::from_gpx(&gpx), Err(NavError::EmptyRoute)));
    }

    #[test]
    fn test_project_point_on_route() {
        let route = straight_north_route();
        let fix = route.index().project(pt(0.005, 0.0));
        assert!(fix.distance_m < 0.5, "got {}", fix.distance_m);
        assert!(fix.expected_bearing_deg.abs() < 0.5); // north
        assert_eq!(fix.segment_index, 0);
    }

    #[test]
    fn test_project_point_east_of_route() {
        // ~111m east of the line
        let route = straight_north_route();
        let fix = route.index().project(pt(0.005, 0.001));
        assert!((fix.distance_m - 111.2).abs() < 1.0, "got {}", fix.distance_m);
        assert!(fix.expected_bearing_deg.abs() < 0.5);
    }

    #[test]
    fn test_project_picks_nearest_segment() {
        // L-shaped route: north, then east
        let route =
            Route::from_points(vec![pt(0.0, 0.0), pt(0.01, 0.0), pt(0.01, 0.01)]).unwrap();

        let near_first = route.index().project(pt(0.005, 0.0001));
        assert_eq!(near_first.segment_index, 0);
        assert!(near_first.expected_bearing_deg.abs() < 0.5); // north

        let near_second = route.index().project(pt(0.0101, 0.005));
        assert_eq!(near_second.segment_index, 1);
        assert!((near_second.expected_bearing_deg - 90.0).abs() < 0.5); // east
    }

    #[test]
    fn test_project_past_final_point_heads_to_destination() {
        // Overshot the end of the route; expected direction turns back
        // toward the destination
        let route = straight_north_route();
        let fix = route.index().project(pt(0.011, 0.0));
        assert_eq!(fix.segment_index, 0);
        assert!(
            (fix.expected_bearing_deg - 180.0).abs() < 0.5,
            "expected ~180 (south, back to destination), got {}",
            fix.expected_bearing_deg
        );
    }

    #[test]
    fn test_project_matches_brute_force_minimum() {
        // The projected distance must equal the minimum over all segments
        let route = Route::from_points(vec![
            pt(51.500, -0.130),
            pt(51.505, -0.125),
            pt(51.510, -0.128),
            pt(51.515, -0.120),
            pt(51.520, -0.121),
        ])
        .unwrap();

        let probes = [
            pt(51.502, -0.131),
            pt(51.508, -0.120),
            pt(51.513, -0.125),
            pt(51.521, -0.119),
            pt(51.499, -0.140),
        ];

        for p in probes {
            let fix = route.index().project(p);
            let reference = route
                .points()
                .windows(2)
                .map(|pair| point_to_segment_distance(p, pair[0], pair[1]))
                .fold(f64::INFINITY, f64::min);
            assert!(
                (fix.distance_m - reference).abs() < 1e-9,
                "projection {} vs brute force {reference}",
                fix.distance_m
            );
        }
    }
}
