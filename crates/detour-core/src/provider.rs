//! Boundary to external routing engines.

use crate::error::RouteError;
use crate::models::{BoundingBox, Coordinate, ProviderRoute};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// How a provider honors hazard avoidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStrategy {
    /// Routes through explicit waypoints; avoidance comes from synthesized detour arcs.
    WaypointDetour,
    /// Routes source to destination and natively avoids the given rectangles.
    RegionAvoidance,
}

/// A routing engine that turns waypoints and/or avoidance regions into a route.
///
/// Implementations ignore whichever input their strategy does not use:
/// waypoint-detour providers ignore `avoidance_regions`, region-avoidance
/// providers only use the first and last waypoint.
pub trait RouteProvider {
    fn strategy(&self) -> ProviderStrategy;

    fn name(&self) -> &'static str;

    fn plan_route(
        &self,
        waypoints: &[Coordinate],
        avoidance_regions: &[BoundingBox],
    ) -> impl Future<Output = Result<ProviderRoute, RouteError>> + Send;
}

impl<P: RouteProvider + Sync> RouteProvider for &P {
    fn strategy(&self) -> ProviderStrategy {
        (**self).strategy()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn plan_route(
        &self,
        waypoints: &[Coordinate],
        avoidance_regions: &[BoundingBox],
    ) -> impl Future<Output = Result<ProviderRoute, RouteError>> + Send {
        (**self).plan_route(waypoints, avoidance_regions)
    }
}

/// Shared precondition for every provider call.
pub fn ensure_routable(waypoints: &[Coordinate]) -> Result<(), RouteError> {
    if waypoints.len() < 2 {
        return Err(RouteError::invalid_input(format!(
            "need at least 2 waypoints, got {}",
            waypoints.len()
        )));
    }
    if let Some(bad) = waypoints.iter().find(|point| !point.is_finite()) {
        return Err(RouteError::invalid_input(format!(
            "waypoint ({}, {}) is not finite",
            bad.lat, bad.lng
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_routable_checks_count_and_values() {
        assert!(ensure_routable(&[Coordinate::new(1.0, 2.0)]).is_err());
        assert!(ensure_routable(&[Coordinate::new(1.0, 2.0), Coordinate::new(f64::NAN, 2.0)]).is_err());
        assert!(ensure_routable(&[Coordinate::new(1.0, 2.0), Coordinate::new(1.5, 2.5)]).is_ok());
    }
}
