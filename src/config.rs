//! Planner configuration from environment.

use std::env;
use std::time::Duration;

use crate::coordinator::CoordinatorConfig;
use crate::routes::RoutesConfig;

#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    pub routes: RoutesConfig,
    pub coordinator: CoordinatorConfig,
}

impl PlannerConfig {
    /// Reads `ROUTES_API_KEY`, `ROUTES_BASE_URL`, `ROUTES_TIMEOUT_SECS` and
    /// `TRIP_DEBOUNCE_MS`. Missing or unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            routes: RoutesConfig {
                base_url: lookup("ROUTES_BASE_URL").unwrap_or(defaults.routes.base_url),
                api_key: lookup("ROUTES_API_KEY").unwrap_or(defaults.routes.api_key),
                timeout_secs: lookup("ROUTES_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.routes.timeout_secs),
            },
            coordinator: CoordinatorConfig {
                debounce: lookup("TRIP_DEBOUNCE_MS")
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.coordinator.debounce),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::routes::DEFAULT_BASE_URL;

    #[test]
    fn test_defaults_when_unset() {
        let config = PlannerConfig::from_lookup(|_| None);
        assert_eq!(config.routes.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.routes.timeout_secs, 10);
        assert!(config.routes.api_key.is_empty());
        assert_eq!(config.coordinator.debounce, Duration::from_millis(120));
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ROUTES_API_KEY", "secret"),
            ("ROUTES_BASE_URL", "http://127.0.0.1:9000/route"),
            ("ROUTES_TIMEOUT_SECS", "not-a-number"),
            ("TRIP_DEBOUNCE_MS", "250"),
        ]);
        let config = PlannerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.routes.api_key, "secret");
        assert_eq!(config.routes.base_url, "http://127.0.0.1:9000/route");
        assert_eq!(config.routes.timeout_secs, 10);
        assert_eq!(config.coordinator.debounce, Duration::from_millis(250));
    }
}
