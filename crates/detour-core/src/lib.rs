pub mod detector;
pub mod detour;
pub mod error;
pub mod input;
pub mod models;
pub mod planner;
pub mod presets;
pub mod provider;
pub mod rules;
pub mod spatial;
pub mod summary;

pub use detector::{detect_hazard_hits, find_intersected_hazards, HazardHit};
pub use detour::{compute_detour_waypoints, detour_arc, DetourArc};
pub use error::{RouteError, RouteErrorBody, RouteErrorKind};
pub use input::{parse_coordinate, resolve_location};
pub use models::{
    validate_hazards, BoundingBox, Coordinate, HazardSeverity, HazardZone, ProviderRoute,
    RoutePlanRequest, RoutePolyline, RouteSummary,
};
pub use planner::{
    CyclePhase, CycleStep, PlanOutcome, PlanningCycle, ProviderRequest, RoutePlanner,
};
pub use provider::{ProviderStrategy, RouteProvider};
pub use rules::PlannerRules;
pub use spatial::{bounding_box_from_circle, haversine_distance_km};
pub use summary::{format_duration, summarize, summarize_route};
