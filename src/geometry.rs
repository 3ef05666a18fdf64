//! Geometry kernel for navigation calculations
//!
//! Pure functions over WGS84 coordinates (`geo::Point<f64>`, x = longitude,
//! y = latitude). Distances use a spherical Earth approximation, which is
//! accurate to well under 0.5% at navigation scale - far below typical GPS
//! accuracy.

use geo::Point;

/// Mean Earth radius in meters (spherical approximation)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters (haversine formula)
#[inline]
pub fn haversine_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let delta_lat = (b.y() - a.y()).to_radians();
    let delta_lon = (b.x() - a.x()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Initial compass bearing from `a` to `b` in degrees `[0, 360)`
///
/// 0 = north, clockwise. Returns 0 for identical points.
#[inline]
pub fn forward_bearing(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let delta_lon = (b.x() - a.x()).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    let bearing = y.atan2(x).to_degrees();
    (bearing + 360.0) % 360.0
}

/// Unsigned smallest separation between two bearings in degrees `[0, 180]`
#[inline]
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    if d > 180.0 { 360.0 - d } else { d }
}

/// Signed turn amount from bearing `from` to bearing `to` in degrees
/// `(-180, 180]`, positive = clockwise (right turn)
#[inline]
pub fn signed_angle_difference(from: f64, to: f64) -> f64 {
    let mut d = (to - from) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// Nearest distance in meters from point `p` to the segment `s1`-`s2`, plus
/// the clamped projection parameter `t` in `[0, 1]` along the segment
///
/// Uses an equirectangular local projection centered on the segment, which is
/// sufficient at city/route scale and avoids full great-circle segment math.
#[inline]
pub fn segment_projection(p: Point<f64>, s1: Point<f64>, s2: Point<f64>) -> (f64, f64) {
    // Local tangent plane: meters east/north relative to the segment midpoint
    let lat0 = ((s1.y() + s2.y()) / 2.0).to_radians();
    let scale = lat0.cos();

    let to_local = |q: Point<f64>| -> (f64, f64) {
        (
            q.x().to_radians() * scale * EARTH_RADIUS_M,
            q.y().to_radians() * EARTH_RADIUS_M,
        )
    };

    let (ax, ay) = to_local(s1);
    let (bx, by) = to_local(s2);
    let (px, py) = to_local(p);

    let dx = bx - ax;
    let dy = by - ay;
    let len2 = dx * dx + dy * dy;

    if len2 == 0.0 {
        // Degenerate segment: distance to the (single) endpoint
        return (haversine_distance(p, s1), 0.0);
    }

    let t = (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0);
    let cx = ax + t * dx;
    let cy = ay + t * dy;

    (((px - cx).powi(2) + (py - cy).powi(2)).sqrt(), t)
}

/// Nearest distance in meters from point `p` to the segment `s1`-`s2`
#[inline]
pub fn point_to_segment_distance(p: Point<f64>, s1: Point<f64>, s2: Point<f64>) -> f64 {
    segment_projection(p, s1, s2).0
}
