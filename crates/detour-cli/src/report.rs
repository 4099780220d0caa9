//! Human-readable trip report.

use detour_core::{PlanOutcome, ProviderStrategy};
use std::fmt::Write;

pub fn render_report(outcome: &PlanOutcome) -> String {
    let mut out = String::new();
    let summary = &outcome.summary;
    let _ = writeln!(out, "Distance: {:.1} km", summary.distance_km);
    let _ = writeln!(
        out,
        "Duration: {}{}",
        summary.duration_label,
        if summary.estimated { " (estimated)" } else { "" }
    );
    let _ = writeln!(out, "Route points: {}", outcome.polyline.len());

    if !outcome.avoid_hazards {
        let _ = writeln!(out, "Hazard avoidance: off");
        return out;
    }

    if outcome.hit_hazards.is_empty() {
        let _ = writeln!(out, "Hazards on route: none");
    } else {
        let _ = writeln!(out, "Hazards on route: {}", outcome.hit_hazards.len());
        for hazard in &outcome.hit_hazards {
            let _ = writeln!(
                out,
                "  - {} ({:.0} m): {}",
                hazard.id, hazard.radius_m, hazard.description
            );
        }
    }

    match outcome.strategy {
        ProviderStrategy::WaypointDetour => {
            let detour = if outcome.rerouted {
                format!("yes, via {} waypoints", outcome.detour_waypoints.len())
            } else {
                "no".to_string()
            };
            let _ = writeln!(out, "Detour applied: {}", detour);
        }
        ProviderStrategy::RegionAvoidance => {
            let _ = writeln!(
                out,
                "Avoidance regions sent: {}",
                outcome.avoidance_regions.len()
            );
        }
    }
    out
}
