//! Demo locations and hazard records for the Mumbai deployment.
//!
//! The hazard list stands in for a live feed; callers can replace it wholesale.

use crate::models::{Coordinate, HazardSeverity, HazardZone};
use serde::{Deserialize, Serialize};

const SOURCES: &[(f64, f64, &str)] = &[
    (19.0896, 72.8656, "Mumbai Airport (T2)"),
    (18.9220, 72.8347, "Gateway of India"),
    (19.0330, 73.0297, "Navi Mumbai (Vashi)"),
    (19.0178, 72.8478, "Dadar Station (Central)"),
    (19.2183, 72.9781, "Thane West"),
    (19.1031, 72.8267, "Juhu Beach"),
    (19.2310, 72.8560, "Borivali West"),
];

const DESTINATIONS: &[(f64, f64, &str)] = &[
    (19.0760, 72.8777, "BKC (Business District)"),
    (19.1136, 72.8697, "Andheri Station"),
    (18.9750, 72.8258, "Haji Ali Dargah"),
    (19.1180, 72.9100, "Powai (Hiranandani)"),
    (18.9100, 72.8090, "Colaba Causeway"),
    (19.1860, 72.8360, "Mindspace (Malad)"),
    (19.0726, 72.9002, "Vidyavihar (Phoenix)"),
    (19.2183, 72.8615, "Borivali National Park"),
];

struct HazardSeed {
    id: &'static str,
    lat: f64,
    lng: f64,
    radius_m: f64,
    description: &'static str,
    severity: HazardSeverity,
}

const HAZARDS: &[HazardSeed] = &[
    HazardSeed {
        id: "weh-block",
        lat: 19.0950,
        lng: 72.8530,
        radius_m: 700.0,
        description: "WEH: Flyover Maintenance",
        severity: HazardSeverity::High,
    },
    HazardSeed {
        id: "sea-link-closed",
        lat: 19.0350,
        lng: 72.8150,
        radius_m: 1000.0,
        description: "Sea Link: Strong Winds",
        severity: HazardSeverity::High,
    },
    HazardSeed {
        id: "jvlr-traffic",
        lat: 19.1250,
        lng: 72.8750,
        radius_m: 500.0,
        description: "JVLR: Pipeline Work",
        severity: HazardSeverity::Medium,
    },
    HazardSeed {
        id: "sakinaka-jam",
        lat: 19.1030,
        lng: 72.8850,
        radius_m: 400.0,
        description: "Saki Naka: Heavy Congestion",
        severity: HazardSeverity::High,
    },
    HazardSeed {
        id: "sion-circle",
        lat: 19.0430,
        lng: 72.8630,
        radius_m: 400.0,
        description: "Sion Circle: Water Logging",
        severity: HazardSeverity::Medium,
    },
    HazardSeed {
        id: "eeh-metro",
        lat: 19.1300,
        lng: 72.9350,
        radius_m: 600.0,
        description: "EEH: Metro Girder Launch",
        severity: HazardSeverity::High,
    },
    HazardSeed {
        id: "sv-road",
        lat: 19.1700,
        lng: 72.8400,
        radius_m: 300.0,
        description: "SV Road: Market Traffic",
        severity: HazardSeverity::Medium,
    },
];

/// Named start and end points offered to users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetLocations {
    pub sources: Vec<Coordinate>,
    pub destinations: Vec<Coordinate>,
}

pub fn preset_locations() -> PresetLocations {
    PresetLocations {
        sources: SOURCES.iter().map(to_coordinate).collect(),
        destinations: DESTINATIONS.iter().map(to_coordinate).collect(),
    }
}

pub fn default_source() -> Coordinate {
    to_coordinate(&SOURCES[0])
}

pub fn default_destination() -> Coordinate {
    to_coordinate(&DESTINATIONS[0])
}

/// Case-insensitive lookup across sources and destinations.
pub fn find_location(name: &str) -> Option<Coordinate> {
    let wanted = name.trim();
    SOURCES
        .iter()
        .chain(DESTINATIONS.iter())
        .find(|(_, _, label)| label.eq_ignore_ascii_case(wanted))
        .map(to_coordinate)
}

pub fn mock_hazards() -> Vec<HazardZone> {
    HAZARDS
        .iter()
        .map(|seed| HazardZone {
            id: seed.id.to_string(),
            center: Coordinate::new(seed.lat, seed.lng),
            radius_m: seed.radius_m,
            description: seed.description.to_string(),
            severity: seed.severity,
        })
        .collect()
}

fn to_coordinate(entry: &(f64, f64, &str)) -> Coordinate {
    Coordinate::labeled(entry.0, entry.1, entry.2)
}
