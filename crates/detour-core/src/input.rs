//! Parsing of user-entered coordinates.

use crate::error::RouteError;
use crate::models::Coordinate;
use crate::presets;

/// Parse `"lat, lng"` text into a coordinate.
///
/// Exactly two comma-separated finite numbers are required, latitude within
/// [-90, 90] and longitude within [-180, 180].
pub fn parse_coordinate(text: &str) -> Result<Coordinate, RouteError> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(RouteError::invalid_input(format!(
            "expected \"lat, lng\", got {:?}",
            text
        )));
    }

    let lat = parse_component(parts[0], "latitude")?;
    let lng = parse_component(parts[1], "longitude")?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(RouteError::invalid_input(format!(
            "latitude {} out of range",
            lat
        )));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(RouteError::invalid_input(format!(
            "longitude {} out of range",
            lng
        )));
    }

    Ok(Coordinate::new(lat, lng))
}

fn parse_component(value: &str, name: &str) -> Result<f64, RouteError> {
    let parsed: f64 = value
        .parse()
        .map_err(|_| RouteError::invalid_input(format!("{} {:?} is not a number", name, value)))?;
    if !parsed.is_finite() {
        return Err(RouteError::invalid_input(format!(
            "{} {:?} is not finite",
            name, value
        )));
    }
    Ok(parsed)
}

/// Resolve a preset location name, falling back to `"lat, lng"` text.
pub fn resolve_location(text: &str) -> Result<Coordinate, RouteError> {
    if let Some(location) = presets::find_location(text) {
        return Ok(location);
    }
    parse_coordinate(text)
}
