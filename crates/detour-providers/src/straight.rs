//! Offline provider: joins waypoints with densely sampled straight legs.
//!
//! Useful for demos and tests where no routing engine is reachable.

use detour_core::provider::ensure_routable;
use detour_core::spatial::{haversine_distance_m, path_length_km};
use detour_core::{
    BoundingBox, Coordinate, ProviderRoute, ProviderStrategy, RouteError, RoutePolyline,
    RouteProvider,
};

pub const DEFAULT_STEP_M: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct StraightLineProvider {
    step_m: f64,
}

impl Default for StraightLineProvider {
    fn default() -> Self {
        Self {
            step_m: DEFAULT_STEP_M,
        }
    }
}

impl StraightLineProvider {
    pub fn with_step(step_m: f64) -> Result<Self, RouteError> {
        if !step_m.is_finite() || step_m <= 0.0 {
            return Err(RouteError::invalid_input(format!(
                "sample step must be positive, got {}",
                step_m
            )));
        }
        Ok(Self { step_m })
    }

    pub fn densify(&self, waypoints: &[Coordinate]) -> Vec<Coordinate> {
        let mut points = Vec::new();
        let Some(first) = waypoints.first() else {
            return points;
        };
        points.push(first.unlabeled());
        for leg in waypoints.windows(2) {
            let (from, to) = (&leg[0], &leg[1]);
            let samples = (haversine_distance_m(from, to) / self.step_m).ceil().max(1.0) as usize;
            for i in 1..=samples {
                let t = i as f64 / samples as f64;
                points.push(Coordinate::new(
                    from.lat + (to.lat - from.lat) * t,
                    from.lng + (to.lng - from.lng) * t,
                ));
            }
        }
        points
    }
}

impl RouteProvider for StraightLineProvider {
    fn strategy(&self) -> ProviderStrategy {
        ProviderStrategy::WaypointDetour
    }

    fn name(&self) -> &'static str {
        "straight"
    }

    async fn plan_route(
        &self,
        waypoints: &[Coordinate],
        _avoidance_regions: &[BoundingBox],
    ) -> Result<ProviderRoute, RouteError> {
        ensure_routable(waypoints)?;
        let points = self.densify(waypoints);
        let distance_km = path_length_km(&points);
        Ok(ProviderRoute {
            polyline: RoutePolyline::new(points)?,
            distance_km,
            duration_seconds: 0.0,
            authoritative: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_every_waypoint() {
        let provider = StraightLineProvider::default();
        let waypoints = vec![
            Coordinate::new(19.0950, 72.8400),
            Coordinate::new(19.1020, 72.8530),
            Coordinate::new(19.0950, 72.8660),
        ];
        let route = provider.plan_route(&waypoints, &[]).await.unwrap();
        assert!(route.polyline.start().approx_eq(&waypoints[0], 1e-12));
        assert!(route.polyline.end().approx_eq(&waypoints[2], 1e-12));
        assert!(route
            .polyline
            .points()
            .iter()
            .any(|point| point.approx_eq(&waypoints[1], 1e-12)));

        for pair in route.polyline.points().windows(2) {
            assert!(haversine_distance_m(&pair[0], &pair[1]) <= DEFAULT_STEP_M + 0.5);
        }
        assert!(route.distance_km > 2.0);
    }

    #[test]
    fn rejects_bad_step() {
        assert!(StraightLineProvider::with_step(0.0).is_err());
        assert!(StraightLineProvider::with_step(f64::NAN).is_err());
        assert!(StraightLineProvider::with_step(25.0).is_ok());
    }
}
