//! Trip distance and duration for display.

use crate::models::{ProviderRoute, RoutePolyline, RouteSummary};
use crate::rules::PlannerRules;
use crate::spatial::path_length_km;

/// Heuristic summary from the polyline alone.
///
/// Distance is the sum of consecutive haversine distances; duration assumes
/// the average speed for the routing mode.
pub fn summarize(route: &RoutePolyline, avoid_hazards: bool, rules: &PlannerRules) -> RouteSummary {
    let distance_km = path_length_km(route.points());
    let speed_kmh = rules.average_speed_kmh(avoid_hazards);
    let duration_seconds = if speed_kmh > 0.0 {
        distance_km / speed_kmh * 3600.0
    } else {
        0.0
    };
    RouteSummary {
        distance_km,
        duration_seconds,
        duration_label: format_duration(duration_seconds),
        estimated: true,
    }
}

/// Summary for a provider response, preferring authoritative provider timing.
pub fn summarize_route(
    route: &ProviderRoute,
    avoid_hazards: bool,
    rules: &PlannerRules,
) -> RouteSummary {
    if route.authoritative {
        let distance_km = route.distance_km.max(0.0);
        let duration_seconds = route.duration_seconds.max(0.0);
        return RouteSummary {
            distance_km,
            duration_seconds,
            duration_label: format_duration(duration_seconds),
            estimated: false,
        };
    }
    summarize(&route.polyline, avoid_hazards, rules)
}

/// `"1h 5m"` from one hour up, otherwise `"13m"`.
///
/// The total is rounded to whole minutes before it is split, so 59m 40s
/// reads `"1h 0m"`.
pub fn format_duration(seconds: f64) -> String {
    let total_minutes = if seconds.is_finite() && seconds > 0.0 {
        (seconds / 60.0).round() as u64
    } else {
        0
    };
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
