//! Perimeter detour synthesis.
//!
//! For every intersected hazard, three waypoints are placed on a buffered
//! circle around its center, fanned around the direction from which the route
//! approaches it. Submitting `[source, arcs..., destination]` to a waypoint
//! router pulls the path around the zone instead of through it.

use crate::models::{Coordinate, HazardZone, RoutePolyline};
use crate::rules::PlannerRules;
use crate::spatial::{closest_point_on_route, planar_angle, point_on_circle};
use serde::{Deserialize, Serialize};

/// The detour waypoints generated for one hazard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetourArc {
    pub hazard_id: String,
    /// Planar angle (radians) from the hazard center to the nearest route point
    pub entry_angle_rad: f64,
    pub buffer_radius_m: f64,
    /// Arc angles in ascending order: entry - spread, entry, entry + spread
    pub angles_rad: [f64; 3],
    pub points: [Coordinate; 3],
}

/// Build the arc for one hazard against the current route.
pub fn detour_arc(hazard: &HazardZone, route: &RoutePolyline, rules: &PlannerRules) -> DetourArc {
    let (closest_index, _) = closest_point_on_route(route, &hazard.center);
    let closest = &route.points()[closest_index];
    let entry_angle_rad = planar_angle(&hazard.center, closest);
    let buffer_radius_m = hazard.radius_m * rules.detour_buffer_ratio;

    let angles_rad = [
        entry_angle_rad - rules.arc_spread_rad,
        entry_angle_rad,
        entry_angle_rad + rules.arc_spread_rad,
    ];
    let points = angles_rad.map(|angle| point_on_circle(&hazard.center, buffer_radius_m, angle));

    DetourArc {
        hazard_id: hazard.id.clone(),
        entry_angle_rad,
        buffer_radius_m,
        angles_rad,
        points,
    }
}

/// Arcs for each hit hazard, in the order given.
pub fn detour_arcs(
    hit_hazards: &[HazardZone],
    route: &RoutePolyline,
    rules: &PlannerRules,
) -> Vec<DetourArc> {
    hit_hazards
        .iter()
        .map(|hazard| detour_arc(hazard, route, rules))
        .collect()
}

/// Waypoint list `[source, arc points per hazard..., destination]`.
///
/// `hit_hazards` should already be in encounter order
/// (see [`crate::detector::find_intersected_hazards`]). With no hazards the
/// result is just `[source, destination]`.
pub fn compute_detour_waypoints(
    source: &Coordinate,
    destination: &Coordinate,
    hit_hazards: &[HazardZone],
    route: &RoutePolyline,
    rules: &PlannerRules,
) -> Vec<Coordinate> {
    let mut waypoints = Vec::with_capacity(hit_hazards.len() * 3 + 2);
    waypoints.push(source.unlabeled());
    for arc in detour_arcs(hit_hazards, route, rules) {
        waypoints.extend(arc.points);
    }
    waypoints.push(destination.unlabeled());
    waypoints
}
