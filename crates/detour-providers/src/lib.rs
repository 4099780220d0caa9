//! Route provider adapters.
//!
//! [`AnyProvider`] picks an adapter at runtime from [`ProviderSettings`], so
//! binaries can stay generic over a single concrete type.

pub mod osrm;
pub mod straight;
pub mod tomtom;

pub use osrm::{OsrmClient, DEFAULT_OSRM_URL};
pub use straight::StraightLineProvider;
pub use tomtom::{TomTomClient, DEFAULT_TOMTOM_URL};

use detour_core::{BoundingBox, Coordinate, ProviderRoute, ProviderStrategy, RouteError, RouteProvider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Osrm,
    TomTom,
    Straight,
}

impl FromStr for ProviderKind {
    type Err = RouteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "osrm" => Ok(ProviderKind::Osrm),
            "tomtom" => Ok(ProviderKind::TomTom),
            "straight" | "offline" => Ok(ProviderKind::Straight),
            other => Err(RouteError::invalid_input(format!(
                "unknown route provider {:?} (expected osrm, tomtom or straight)",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Osrm => "osrm",
            ProviderKind::TomTom => "tomtom",
            ProviderKind::Straight => "straight",
        };
        f.write_str(name)
    }
}

/// Everything needed to build any provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub osrm_url: String,
    pub osrm_profile: String,
    pub tomtom_url: String,
    pub tomtom_api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Osrm,
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            osrm_profile: "driving".to_string(),
            tomtom_url: DEFAULT_TOMTOM_URL.to_string(),
            tomtom_api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AnyProvider {
    Osrm(OsrmClient),
    TomTom(TomTomClient),
    Straight(StraightLineProvider),
}

impl AnyProvider {
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, RouteError> {
        let provider = match settings.kind {
            ProviderKind::Osrm => AnyProvider::Osrm(OsrmClient::new(
                settings.osrm_url.clone(),
                settings.osrm_profile.clone(),
                settings.timeout,
            )?),
            ProviderKind::TomTom => {
                let client = TomTomClient::new(
                    settings.tomtom_url.clone(),
                    settings.tomtom_api_key.clone(),
                    settings.timeout,
                )?;
                if !client.has_api_key() {
                    tracing::warn!("TomTom provider selected without an API key; requests will fail");
                }
                AnyProvider::TomTom(client)
            }
            ProviderKind::Straight => AnyProvider::Straight(StraightLineProvider::default()),
        };
        tracing::info!("Route provider: {}", provider.name());
        Ok(provider)
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            AnyProvider::Osrm(_) => ProviderKind::Osrm,
            AnyProvider::TomTom(_) => ProviderKind::TomTom,
            AnyProvider::Straight(_) => ProviderKind::Straight,
        }
    }
}

impl RouteProvider for AnyProvider {
    fn strategy(&self) -> ProviderStrategy {
        match self {
            AnyProvider::Osrm(p) => p.strategy(),
            AnyProvider::TomTom(p) => p.strategy(),
            AnyProvider::Straight(p) => p.strategy(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AnyProvider::Osrm(p) => p.name(),
            AnyProvider::TomTom(p) => p.name(),
            AnyProvider::Straight(p) => p.name(),
        }
    }

    async fn plan_route(
        &self,
        waypoints: &[Coordinate],
        avoidance_regions: &[BoundingBox],
    ) -> Result<ProviderRoute, RouteError> {
        match self {
            AnyProvider::Osrm(p) => p.plan_route(waypoints, avoidance_regions).await,
            AnyProvider::TomTom(p) => p.plan_route(waypoints, avoidance_regions).await,
            AnyProvider::Straight(p) => p.plan_route(waypoints, avoidance_regions).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detour_core::{presets, PlannerRules, RoutePlanRequest, RoutePlanner};

    #[test]
    fn provider_kind_parses_names() {
        assert_eq!("OSRM".parse::<ProviderKind>().unwrap(), ProviderKind::Osrm);
        assert_eq!(" tomtom ".parse::<ProviderKind>().unwrap(), ProviderKind::TomTom);
        assert_eq!("offline".parse::<ProviderKind>().unwrap(), ProviderKind::Straight);
        assert!("google".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::TomTom.to_string(), "tomtom");
    }

    #[test]
    fn settings_select_strategy() {
        let mut settings = ProviderSettings::default();
        let osrm = AnyProvider::from_settings(&settings).unwrap();
        assert_eq!(osrm.strategy(), ProviderStrategy::WaypointDetour);

        settings.kind = ProviderKind::TomTom;
        let tomtom = AnyProvider::from_settings(&settings).unwrap();
        assert_eq!(tomtom.strategy(), ProviderStrategy::RegionAvoidance);
        assert_eq!(tomtom.kind(), ProviderKind::TomTom);
    }

    #[tokio::test]
    async fn offline_planner_detours_around_preset_hazard() {
        let settings = ProviderSettings {
            kind: ProviderKind::Straight,
            ..ProviderSettings::default()
        };
        let planner = RoutePlanner::new(
            AnyProvider::from_settings(&settings).unwrap(),
            PlannerRules::default(),
        );
        let request = RoutePlanRequest {
            source: Coordinate::new(19.0950, 72.8400),
            destination: Coordinate::new(19.0950, 72.8660),
            hazards: presets::mock_hazards(),
            avoid_hazards: true,
        };
        let outcome = planner.plan(request).await.unwrap();
        assert!(outcome.rerouted);
        assert_eq!(outcome.hit_hazards[0].id, "weh-block");
        assert_eq!(outcome.detour_waypoints.len(), 5);
    }
}
