//! Geospatial primitives for detection and detour synthesis.
//!
//! Angles are radians unless a parameter name ends in `_deg`. Coordinates are
//! always decimal degrees.

use crate::models::{BoundingBox, Coordinate, RoutePolyline};

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate meters per degree of latitude.
pub const METERS_PER_DEG_LAT: f64 = 111_139.0;

/// Great-circle distance between two coordinates in kilometers.
///
/// Symmetric in its arguments and zero for identical points.
pub fn haversine_distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance in meters.
pub fn haversine_distance_m(a: &Coordinate, b: &Coordinate) -> f64 {
    haversine_distance_km(a, b) * 1000.0
}

/// Convert a north/south distance in meters to degrees of latitude.
pub fn meters_to_degrees_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}

/// Convert an east/west distance in meters to degrees of longitude at `at_lat_deg`.
///
/// Degenerates near the poles where the cosine goes to zero.
pub fn meters_to_degrees_lng(meters: f64, at_lat_deg: f64) -> f64 {
    meters_to_degrees_lat(meters) / at_lat_deg.to_radians().cos()
}

/// Axis-aligned rectangle containing the circle of `radius_m` around `center`.
///
/// Over-approximates: the corners exclude area outside the circle.
pub fn bounding_box_from_circle(center: &Coordinate, radius_m: f64) -> BoundingBox {
    let dlat = meters_to_degrees_lat(radius_m);
    let dlng = meters_to_degrees_lng(radius_m, center.lat);
    BoundingBox {
        north_east: Coordinate::new(center.lat + dlat, center.lng + dlng),
        south_west: Coordinate::new(center.lat - dlat, center.lng - dlng),
    }
}

/// Planar angle from `from` to `to` in radians, `atan2(dlat, dlng)` on raw degrees.
///
/// 0 points east, pi/2 points north.
pub fn planar_angle(from: &Coordinate, to: &Coordinate) -> f64 {
    (to.lat - from.lat).atan2(to.lng - from.lng)
}

/// Point at `angle_rad` (planar, see [`planar_angle`]) on the ellipse of
/// `radius_m` meters around `center`.
pub fn point_on_circle(center: &Coordinate, radius_m: f64, angle_rad: f64) -> Coordinate {
    let r_lat = meters_to_degrees_lat(radius_m);
    let r_lng = meters_to_degrees_lng(radius_m, center.lat);
    Coordinate::new(
        center.lat + angle_rad.sin() * r_lat,
        center.lng + angle_rad.cos() * r_lng,
    )
}

/// Index and distance (meters) of the route point nearest to `target`.
///
/// Ties keep the earliest point along the route.
pub fn closest_point_on_route(route: &RoutePolyline, target: &Coordinate) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (idx, point) in route.points().iter().enumerate() {
        let d = haversine_distance_m(point, target);
        if d < best.1 {
            best = (idx, d);
        }
    }
    best
}

/// Sum of haversine distances between consecutive points, in kilometers.
pub fn path_length_km(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_distance_km(&pair[0], &pair[1]))
        .sum()
}
