//! TomTom Routing API client (region-avoidance strategy).
//!
//! Only the first and last waypoint are routed; hazards are passed as
//! `avoidAreas` rectangles and avoided by TomTom itself.

use detour_core::provider::ensure_routable;
use detour_core::{
    BoundingBox, Coordinate, ProviderRoute, ProviderStrategy, RouteError, RoutePolyline,
    RouteProvider,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TOMTOM_URL: &str = "https://api.tomtom.com";

/// TomTom rejects requests with more rectangles than this.
pub const MAX_AVOID_AREAS: usize = 10;

#[derive(Debug, Clone)]
pub struct TomTomClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateRouteBody {
    avoid_areas: AvoidAreas,
}

#[derive(Debug, Serialize)]
struct AvoidAreas {
    rectangles: Vec<Rectangle>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Rectangle {
    north_east_corner: LatLon,
    south_west_corner: LatLon,
}

#[derive(Debug, Serialize, Deserialize)]
struct LatLon {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct CalculateRouteResponse {
    #[serde(default)]
    routes: Vec<TomTomRoute>,
    #[serde(default)]
    error: Option<TomTomError>,
}

#[derive(Debug, Deserialize)]
struct TomTomRoute {
    summary: TomTomSummary,
    #[serde(default)]
    legs: Vec<TomTomLeg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TomTomSummary {
    length_in_meters: f64,
    travel_time_in_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct TomTomLeg {
    #[serde(default)]
    points: Vec<LatLon>,
}

#[derive(Debug, Deserialize)]
struct TomTomError {
    #[serde(default)]
    description: Option<String>,
}

impl From<&BoundingBox> for Rectangle {
    fn from(bbox: &BoundingBox) -> Self {
        Self {
            north_east_corner: LatLon {
                latitude: bbox.north_east.lat,
                longitude: bbox.north_east.lng,
            },
            south_west_corner: LatLon {
                latitude: bbox.south_west.lat,
                longitude: bbox.south_west.lng,
            },
        }
    }
}

impl TomTomClient {
    /// A client with no key can be built but every request fails.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RouteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RouteError::unavailable(format!("HTTP client: {}", err)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl RouteProvider for TomTomClient {
    fn strategy(&self) -> ProviderStrategy {
        ProviderStrategy::RegionAvoidance
    }

    fn name(&self) -> &'static str {
        "tomtom"
    }

    async fn plan_route(
        &self,
        waypoints: &[Coordinate],
        avoidance_regions: &[BoundingBox],
    ) -> Result<ProviderRoute, RouteError> {
        ensure_routable(waypoints)?;
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(RouteError::unavailable("missing TomTom API key"));
        };

        let (Some(start), Some(end)) = (waypoints.first(), waypoints.last()) else {
            return Err(RouteError::invalid_input("need at least 2 waypoints"));
        };
        let url = format!(
            "{}/routing/1/calculateRoute/{},{}:{},{}/json",
            self.base_url, start.lat, start.lng, end.lat, end.lng
        );

        if avoidance_regions.len() > MAX_AVOID_AREAS {
            tracing::warn!(
                "{} avoidance regions exceed TomTom's limit of {}",
                avoidance_regions.len(),
                MAX_AVOID_AREAS
            );
        }
        let body = CalculateRouteBody {
            avoid_areas: AvoidAreas {
                rectangles: avoidance_regions.iter().map(Rectangle::from).collect(),
            },
        };
        tracing::debug!(
            "TomTom request avoiding {} region(s)",
            body.avoid_areas.rectangles.len()
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key), ("traffic", "true")])
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                // reqwest errors carry the URL, which includes the key.
                let err = err.without_url();
                tracing::warn!("TomTom request failed: {}", err);
                RouteError::unavailable(err.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| RouteError::unavailable(err.without_url().to_string()))?;
        parse_tomtom_response(status.as_u16(), &text)
    }
}

pub(crate) fn parse_tomtom_response(
    status: u16,
    body: &str,
) -> Result<ProviderRoute, RouteError> {
    let parsed = serde_json::from_str::<CalculateRouteResponse>(body);

    if !(200..300).contains(&status) {
        let description = parsed
            .ok()
            .and_then(|response| response.error)
            .and_then(|error| error.description)
            .unwrap_or_else(|| format!("TomTom HTTP {}", status));
        if description.contains("NO_ROUTE_FOUND") {
            return Err(RouteError::no_route(description));
        }
        return Err(RouteError::unavailable(description));
    }

    let parsed = parsed.map_err(|err| {
        RouteError::unavailable(format!("unreadable TomTom response: {}", err))
    })?;
    if let Some(description) = parsed.error.and_then(|error| error.description) {
        return Err(RouteError::unavailable(description));
    }
    let Some(route) = parsed.routes.into_iter().next() else {
        return Err(RouteError::no_route("no route found"));
    };

    let points: Vec<Coordinate> = route
        .legs
        .into_iter()
        .flat_map(|leg| leg.points)
        .map(|point| Coordinate::new(point.latitude, point.longitude))
        .collect();

    Ok(ProviderRoute {
        polyline: RoutePolyline::new(points)?,
        distance_km: route.summary.length_in_meters / 1000.0,
        duration_seconds: route.summary.travel_time_in_seconds,
        authoritative: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::post,
        Json, Router,
    };
    use detour_core::{bounding_box_from_circle, RouteErrorKind};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn_mock(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn route_json() -> Value {
        json!({
            "routes": [{
                "summary": { "lengthInMeters": 12400, "travelTimeInSeconds": 1860 },
                "legs": [{
                    "points": [
                        { "latitude": 19.0896, "longitude": 72.8656 },
                        { "latitude": 19.0820, "longitude": 72.8700 },
                        { "latitude": 19.0760, "longitude": 72.8777 }
                    ]
                }]
            }]
        })
    }

    #[test]
    fn parses_authoritative_route() {
        let route = parse_tomtom_response(200, &route_json().to_string()).unwrap();
        assert_eq!(route.polyline.len(), 3);
        assert_eq!(route.distance_km, 12.4);
        assert_eq!(route.duration_seconds, 1860.0);
        assert!(route.authoritative);
    }

    #[test]
    fn empty_routes_is_no_route() {
        let err = parse_tomtom_response(200, r#"{"routes": []}"#).unwrap_err();
        assert_eq!(err.kind(), RouteErrorKind::NoRoute);
    }

    #[test]
    fn error_description_becomes_message() {
        let body = json!({ "error": { "description": "Invalid request: key not authorized" } });
        let err = parse_tomtom_response(403, &body.to_string()).unwrap_err();
        assert_eq!(err.kind(), RouteErrorKind::ProviderUnavailable);
        assert_eq!(err.message(), "Invalid request: key not authorized");

        let body = json!({ "error": { "description": "Engine error while executing route request: NO_ROUTE_FOUND" } });
        let err = parse_tomtom_response(400, &body.to_string()).unwrap_err();
        assert_eq!(err.kind(), RouteErrorKind::NoRoute);

        let err = parse_tomtom_response(500, "oops").unwrap_err();
        assert_eq!(err.message(), "TomTom HTTP 500");
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        // Port 9 is never contacted; a network attempt would surface a different message.
        let client = TomTomClient::new("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap();
        assert!(!client.has_api_key());
        let err = client
            .plan_route(&[Coordinate::new(1.0, 1.0), Coordinate::new(1.1, 1.1)], &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), RouteErrorKind::ProviderUnavailable);
        assert_eq!(err.message(), "missing TomTom API key");
    }

    #[tokio::test]
    async fn sends_endpoints_and_rectangles() {
        let app = Router::new().route(
            "/routing/1/calculateRoute/:locations/json",
            post(
                |Path(locations): Path<String>,
                 Query(query): Query<HashMap<String, String>>,
                 Json(body): Json<Value>| async move {
                    assert_eq!(locations, "19.0896,72.8656:19.076,72.8777");
                    assert_eq!(query.get("key").map(String::as_str), Some("test-key"));
                    let rectangles = body["avoidAreas"]["rectangles"].as_array().unwrap();
                    assert_eq!(rectangles.len(), 1);
                    let ne = &rectangles[0]["northEastCorner"];
                    let sw = &rectangles[0]["southWestCorner"];
                    assert!(ne["latitude"].as_f64().unwrap() > sw["latitude"].as_f64().unwrap());
                    assert!(ne["longitude"].as_f64().unwrap() > sw["longitude"].as_f64().unwrap());
                    (StatusCode::OK, Json(route_json()))
                },
            ),
        );
        let base = spawn_mock(app).await;
        let client =
            TomTomClient::new(base, Some("test-key".into()), Duration::from_secs(5)).unwrap();

        let boxes = vec![bounding_box_from_circle(
            &Coordinate::new(19.0950, 72.8530),
            700.0,
        )];
        // Intermediate waypoints are dropped.
        let waypoints = vec![
            Coordinate::new(19.0896, 72.8656),
            Coordinate::new(19.1000, 72.8600),
            Coordinate::new(19.0760, 72.8777),
        ];
        let route = client.plan_route(&waypoints, &boxes).await.unwrap();
        assert!(route.authoritative);
        assert_eq!(route.polyline.len(), 3);
    }

    #[tokio::test]
    async fn mock_empty_routes_is_no_route() {
        let app = Router::new().route(
            "/routing/1/calculateRoute/:locations/json",
            post(|| async { Json(json!({ "routes": [] })) }),
        );
        let base = spawn_mock(app).await;
        let client = TomTomClient::new(base, Some("k".into()), Duration::from_secs(5)).unwrap();
        let err = client
            .plan_route(&[Coordinate::new(19.0, 72.8), Coordinate::new(19.1, 72.9)], &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), RouteErrorKind::NoRoute);
    }
}
