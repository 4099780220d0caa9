//! Hazard-intersection detection.
//!
//! A hazard is hit when at least one route point lies strictly inside
//! `radius * hit_radius_ratio` of its center. Grazing the outer edge of the
//! zone does not count.

use crate::models::{Coordinate, HazardZone, RoutePolyline};
use crate::rules::PlannerRules;
use crate::spatial::{closest_point_on_route, haversine_distance_m};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Details of one intersected hazard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardHit {
    pub hazard: HazardZone,
    /// Index of the route point nearest to the hazard center
    pub closest_index: usize,
    /// Distance from that point to the hazard center (meters)
    pub closest_distance_m: f64,
    /// Distance from the trip origin to the hazard center (meters)
    pub distance_from_origin_m: f64,
}

/// Hazards the route passes through, nearest to the route's first point first.
pub fn find_intersected_hazards(
    route: &RoutePolyline,
    hazards: &[HazardZone],
    rules: &PlannerRules,
) -> Vec<HazardZone> {
    detect_hazard_hits(route, route.start(), hazards, rules)
        .into_iter()
        .map(|hit| hit.hazard)
        .collect()
}

/// Same as [`find_intersected_hazards`] but keeps the measurement for each hit.
///
/// Ordering is by distance of the hazard center from `origin`, normally the
/// requested source rather than the provider's snapped first point.
/// Hazards at equal distance keep their input order.
pub fn detect_hazard_hits(
    route: &RoutePolyline,
    origin: &Coordinate,
    hazards: &[HazardZone],
    rules: &PlannerRules,
) -> Vec<HazardHit> {
    let mut hits: Vec<HazardHit> = hazards
        .iter()
        .filter_map(|hazard| {
            let threshold_m = hazard.radius_m * rules.hit_radius_ratio;
            let (closest_index, closest_distance_m) =
                closest_point_on_route(route, &hazard.center);
            if closest_distance_m < threshold_m {
                Some(HazardHit {
                    hazard: hazard.clone(),
                    closest_index,
                    closest_distance_m,
                    distance_from_origin_m: haversine_distance_m(origin, &hazard.center),
                })
            } else {
                None
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        a.distance_from_origin_m
            .partial_cmp(&b.distance_from_origin_m)
            .unwrap_or(Ordering::Equal)
    });
    hits
}
