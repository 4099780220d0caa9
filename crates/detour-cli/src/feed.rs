//! Hazard feed files.

use anyhow::{Context, Result};
use detour_core::{validate_hazards, HazardZone};
use std::path::Path;

/// Load and validate a JSON array of hazard zones.
pub fn load_hazards(path: impl AsRef<Path>) -> Result<Vec<HazardZone>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read hazard file {}", path.display()))?;
    let hazards: Vec<HazardZone> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse hazard file {}", path.display()))?;
    validate_hazards(&hazards)
        .with_context(|| format!("invalid hazard file {}", path.display()))?;
    Ok(hazards)
}
