//! Server configuration from environment.

use detour_core::PlannerRules;
use detour_providers::{ProviderKind, ProviderSettings, DEFAULT_OSRM_URL, DEFAULT_TOMTOM_URL};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub provider: ProviderSettings,
    pub rules: PlannerRules,
    /// Delay between an input change and the first provider call.
    pub planning_debounce: Duration,
    pub hazard_feed_path: Option<String>,
    pub max_sessions: usize,
    /// Sessions idle this long are dropped. Zero disables expiry.
    pub session_idle_ttl: Duration,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            provider: ProviderSettings::default(),
            rules: PlannerRules::default(),
            planning_debounce: Duration::from_millis(500),
            hazard_feed_path: None,
            max_sessions: 1024,
            session_idle_ttl: Duration::from_secs(1800),
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        let default_rules = PlannerRules::default();

        let provider_kind = match env::var("ROUTE_PROVIDER") {
            Ok(value) => ProviderKind::from_str(&value).unwrap_or_else(|err| {
                tracing::warn!("{}; falling back to osrm", err);
                ProviderKind::Osrm
            }),
            Err(_) => ProviderKind::Osrm,
        };

        Self {
            server_port: env_parse("DETOUR_PORT", defaults.server_port),
            provider: ProviderSettings {
                kind: provider_kind,
                osrm_url: env::var("OSRM_URL").unwrap_or_else(|_| DEFAULT_OSRM_URL.to_string()),
                osrm_profile: env::var("OSRM_PROFILE").unwrap_or_else(|_| "driving".to_string()),
                tomtom_url: env::var("TOMTOM_URL")
                    .unwrap_or_else(|_| DEFAULT_TOMTOM_URL.to_string()),
                tomtom_api_key: env::var("TOMTOM_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                timeout: Duration::from_secs(env_parse("PROVIDER_TIMEOUT_S", 10)),
            },
            rules: PlannerRules {
                hit_radius_ratio: env_parse("HAZARD_HIT_RATIO", default_rules.hit_radius_ratio),
                detour_buffer_ratio: env_parse(
                    "DETOUR_BUFFER_RATIO",
                    default_rules.detour_buffer_ratio,
                ),
                arc_spread_rad: env_parse("DETOUR_ARC_SPREAD_RAD", default_rules.arc_spread_rad),
                avoid_speed_kmh: env_parse("AVOID_SPEED_KMH", default_rules.avoid_speed_kmh),
                standard_speed_kmh: env_parse(
                    "STANDARD_SPEED_KMH",
                    default_rules.standard_speed_kmh,
                ),
            },
            planning_debounce: Duration::from_millis(env_parse("PLANNING_DEBOUNCE_MS", 500)),
            hazard_feed_path: env::var("HAZARD_FEED_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty()),
            max_sessions: env_parse("MAX_SESSIONS", defaults.max_sessions),
            session_idle_ttl: Duration::from_secs(env_parse(
                "SESSION_IDLE_TTL_S",
                defaults.session_idle_ttl.as_secs(),
            )),
            log_json: env::var("LOG_FORMAT")
                .map(|value| value.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Upper bound on how long one planning cycle can take.
    pub fn cycle_deadline(&self) -> Duration {
        self.planning_debounce + self.provider.timeout * 3
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.planning_debounce, Duration::from_millis(500));
        assert_eq!(config.provider.kind, ProviderKind::Osrm);
        assert_eq!(config.provider.timeout, Duration::from_secs(10));
        assert_eq!(config.rules.hit_radius_ratio, 0.95);
        assert_eq!(config.cycle_deadline(), Duration::from_millis(30_500));
        assert_eq!(config.session_idle_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        assert_eq!(env_parse("DETOUR_TEST_UNSET_VARIABLE", 42u16), 42);
    }
}
