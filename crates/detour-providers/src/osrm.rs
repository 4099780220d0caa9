//! OSRM HTTP client (waypoint-detour strategy).
//!
//! Routes through every waypoint in order. Hazard avoidance comes from the
//! detour arcs the planner inserts, so avoidance regions are ignored.

use detour_core::provider::ensure_routable;
use detour_core::{
    BoundingBox, Coordinate, ProviderRoute, ProviderStrategy, RouteError, RoutePolyline,
    RouteProvider,
};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// HTTP client for an OSRM `route` service.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: String,
    profile: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: [lng, lat]
    coordinates: Vec<[f64; 2]>,
}

impl OsrmClient {
    pub fn new(
        base_url: impl Into<String>,
        profile: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RouteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RouteError::unavailable(format!("HTTP client: {}", err)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: profile.into(),
        })
    }

    fn route_url(&self, waypoints: &[Coordinate]) -> String {
        let coords: Vec<String> = waypoints
            .iter()
            .map(|point| format!("{},{}", point.lng, point.lat))
            .collect();
        format!(
            "{}/route/v1/{}/{}",
            self.base_url,
            self.profile,
            coords.join(";")
        )
    }
}

impl RouteProvider for OsrmClient {
    fn strategy(&self) -> ProviderStrategy {
        ProviderStrategy::WaypointDetour
    }

    fn name(&self) -> &'static str {
        "osrm"
    }

    async fn plan_route(
        &self,
        waypoints: &[Coordinate],
        _avoidance_regions: &[BoundingBox],
    ) -> Result<ProviderRoute, RouteError> {
        ensure_routable(waypoints)?;
        let url = self.route_url(waypoints);
        tracing::debug!("OSRM request with {} waypoint(s)", waypoints.len());

        let response = self
            .client
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("steps", "false"),
            ])
            .send()
            .await
            .map_err(|err| {
                tracing::warn!("OSRM request failed: {}", err);
                RouteError::unavailable(err.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| RouteError::unavailable(err.to_string()))?;
        parse_osrm_response(status.as_u16(), &body)
    }
}

/// Interpret an OSRM response body.
///
/// OSRM reports "no route" with a 400 status and `code: "NoRoute"`, so the
/// body is inspected before the status.
pub(crate) fn parse_osrm_response(status: u16, body: &str) -> Result<ProviderRoute, RouteError> {
    let parsed: OsrmResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(err) => {
            return Err(RouteError::unavailable(format!(
                "OSRM HTTP {}: unreadable response ({})",
                status, err
            )))
        }
    };

    if parsed.code == "NoRoute" || (parsed.code == "Ok" && parsed.routes.is_empty()) {
        return Err(RouteError::no_route(
            parsed.message.unwrap_or_else(|| "no route found".to_string()),
        ));
    }
    if !(200..300).contains(&status) || parsed.code != "Ok" {
        return Err(RouteError::unavailable(format!(
            "OSRM HTTP {} ({}): {}",
            status,
            parsed.code,
            parsed.message.unwrap_or_default()
        )));
    }

    let Some(route) = parsed.routes.into_iter().next() else {
        return Err(RouteError::no_route("no route found"));
    };
    let points = route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lng, lat]| Coordinate::new(lat, lng))
        .collect();

    Ok(ProviderRoute {
        polyline: RoutePolyline::new(points)?,
        distance_km: route.distance / 1000.0,
        duration_seconds: route.duration,
        authoritative: false,
    })
}
