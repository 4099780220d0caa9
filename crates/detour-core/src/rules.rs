//! Tunable thresholds for detection, detour synthesis and trip estimates.

use crate::error::RouteError;
use serde::{Deserialize, Serialize};

/// Configuration for the hazard planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerRules {
    /// A route point closer than `radius * hit_radius_ratio` counts as a hit
    pub hit_radius_ratio: f64,
    /// Detour arc radius as a multiple of the hazard radius
    pub detour_buffer_ratio: f64,
    /// Angular offset of the outer arc points from the entry angle (radians)
    pub arc_spread_rad: f64,
    /// Average speed assumed when avoiding hazards (km/h)
    pub avoid_speed_kmh: f64,
    /// Average speed assumed for standard routing (km/h)
    pub standard_speed_kmh: f64,
}

impl Default for PlannerRules {
    fn default() -> Self {
        Self {
            hit_radius_ratio: 0.95,
            detour_buffer_ratio: 1.2,
            arc_spread_rad: 1.0,
            avoid_speed_kmh: 25.0,
            standard_speed_kmh: 35.0,
        }
    }
}

impl PlannerRules {
    pub fn validate(&self) -> Result<(), RouteError> {
        let fields = [
            ("hit_radius_ratio", self.hit_radius_ratio),
            ("detour_buffer_ratio", self.detour_buffer_ratio),
            ("arc_spread_rad", self.arc_spread_rad),
            ("avoid_speed_kmh", self.avoid_speed_kmh),
            ("standard_speed_kmh", self.standard_speed_kmh),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(RouteError::invalid_input(format!(
                    "{name} must be a positive number (got {value})"
                )));
            }
        }
        Ok(())
    }

    /// Heuristic average speed for the given routing mode.
    pub fn average_speed_kmh(&self, avoid_hazards: bool) -> f64 {
        if avoid_hazards {
            self.avoid_speed_kmh
        } else {
            self.standard_speed_kmh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let rules = PlannerRules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.average_speed_kmh(true), 25.0);
        assert_eq!(rules.average_speed_kmh(false), 35.0);
    }

    #[test]
    fn rejects_non_positive_values() {
        let mut rules = PlannerRules::default();
        rules.detour_buffer_ratio = 0.0;
        assert!(rules.validate().is_err());

        let mut rules = PlannerRules::default();
        rules.avoid_speed_kmh = f64::NAN;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let rules: PlannerRules = serde_json::from_str(r#"{"hit_radius_ratio": 0.8}"#).unwrap();
        assert_eq!(rules.hit_radius_ratio, 0.8);
        assert_eq!(rules.detour_buffer_ratio, 1.2);
    }
}
