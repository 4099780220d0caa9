//! Core data models for hazard-aware route planning.

use crate::error::RouteError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A point on the map in decimal degrees.
///
/// No `PartialEq`: float coordinates are compared with [`Coordinate::approx_eq`]
/// or by label, never bit-for-bit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "name")]
    pub label: Option<String>,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            label: None,
        }
    }

    pub fn labeled(lat: f64, lng: f64, label: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            label: Some(label.into()),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// True when both components differ by at most `epsilon_deg` degrees.
    pub fn approx_eq(&self, other: &Coordinate, epsilon_deg: f64) -> bool {
        (self.lat - other.lat).abs() <= epsilon_deg && (self.lng - other.lng).abs() <= epsilon_deg
    }

    /// Copy without the label, as sent to providers.
    pub fn unlabeled(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardSeverity {
    High,
    Medium,
}

/// Circular exclusion/caution zone reported by the hazard feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardZone {
    pub id: String,
    #[serde(alias = "coords")]
    pub center: Coordinate,
    #[serde(alias = "radius")]
    pub radius_m: f64,
    #[serde(default)]
    pub description: String,
    pub severity: HazardSeverity,
}

impl HazardZone {
    pub fn new(
        id: impl Into<String>,
        center: Coordinate,
        radius_m: f64,
        description: impl Into<String>,
        severity: HazardSeverity,
    ) -> Result<Self, RouteError> {
        let hazard = Self {
            id: id.into(),
            center,
            radius_m,
            description: description.into(),
            severity,
        };
        hazard.validate()?;
        Ok(hazard)
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        if self.id.trim().is_empty() {
            return Err(RouteError::invalid_input("hazard id must not be empty"));
        }
        if !self.center.is_finite() {
            return Err(RouteError::invalid_input(format!(
                "hazard {} has a non-finite center",
                self.id
            )));
        }
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(RouteError::invalid_input(format!(
                "hazard {} radius must be > 0 (got {})",
                self.id, self.radius_m
            )));
        }
        Ok(())
    }
}

/// Validate a whole hazard feed: every zone valid, ids unique.
pub fn validate_hazards(hazards: &[HazardZone]) -> Result<(), RouteError> {
    let mut seen = HashSet::new();
    for hazard in hazards {
        hazard.validate()?;
        if !seen.insert(hazard.id.as_str()) {
            return Err(RouteError::invalid_input(format!(
                "duplicate hazard id {}",
                hazard.id
            )));
        }
    }
    Ok(())
}

/// Axis-aligned avoidance rectangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north_east: Coordinate,
    pub south_west: Coordinate,
}

impl BoundingBox {
    pub fn contains(&self, point: &Coordinate) -> bool {
        point.lat <= self.north_east.lat
            && point.lat >= self.south_west.lat
            && point.lng <= self.north_east.lng
            && point.lng >= self.south_west.lng
    }

    /// The four corners, clockwise from north-east.
    pub fn corners(&self) -> [Coordinate; 4] {
        [
            Coordinate::new(self.north_east.lat, self.north_east.lng),
            Coordinate::new(self.south_west.lat, self.north_east.lng),
            Coordinate::new(self.south_west.lat, self.south_west.lng),
            Coordinate::new(self.north_east.lat, self.south_west.lng),
        ]
    }
}

/// Ordered route geometry, start to end, exactly as the provider returned it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct RoutePolyline {
    points: Vec<Coordinate>,
}

impl RoutePolyline {
    /// Wrap provider points. Fewer than two points is not a drivable route.
    pub fn new(points: Vec<Coordinate>) -> Result<Self, RouteError> {
        if points.len() < 2 {
            return Err(RouteError::no_route(format!(
                "route geometry has {} point(s), need at least 2",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> &Coordinate {
        &self.points[0]
    }

    pub fn end(&self) -> &Coordinate {
        &self.points[self.points.len() - 1]
    }

    pub fn approx_eq(&self, other: &RoutePolyline, epsilon_deg: f64) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| a.approx_eq(b, epsilon_deg))
    }
}

impl TryFrom<Vec<Coordinate>> for RoutePolyline {
    type Error = RouteError;

    fn try_from(points: Vec<Coordinate>) -> Result<Self, Self::Error> {
        RoutePolyline::new(points)
    }
}

impl From<RoutePolyline> for Vec<Coordinate> {
    fn from(polyline: RoutePolyline) -> Self {
        polyline.into_points()
    }
}

/// What a route provider hands back for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRoute {
    pub polyline: RoutePolyline,
    pub distance_km: f64,
    pub duration_seconds: f64,
    /// True when `distance_km`/`duration_seconds` come from the provider's own
    /// summary and should be preferred over the polyline heuristic.
    #[serde(default)]
    pub authoritative: bool,
}

/// Displayable trip statistics derived from a final route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_seconds: f64,
    pub duration_label: String,
    /// True when duration is the average-speed heuristic rather than provider timing.
    pub estimated: bool,
}

/// One planning intent. Rebuilt from scratch whenever any field changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlanRequest {
    pub source: Coordinate,
    pub destination: Coordinate,
    #[serde(default)]
    pub hazards: Vec<HazardZone>,
    #[serde(default, alias = "avoid_issues")]
    pub avoid_hazards: bool,
}

impl RoutePlanRequest {
    pub fn validate(&self) -> Result<(), RouteError> {
        if !self.source.is_finite() {
            return Err(RouteError::invalid_input("source coordinate is not finite"));
        }
        if !self.destination.is_finite() {
            return Err(RouteError::invalid_input(
                "destination coordinate is not finite",
            ));
        }
        validate_hazards(&self.hazards)
    }
}
