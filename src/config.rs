//! Scan configuration

use crate::aggregator::ScanError;
use serde::{Deserialize, Serialize};

/// Environment variable prefix used by [`ScanConfig::from_env`]
pub const ENV_PREFIX: &str = "TICKERSTATS";

/// How ordering problems in the record stream are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPolicy {
    /// Record the violation in the report, log it, and keep scanning
    #[default]
    Warn,
    /// Abort the scan on the first violation
    Strict,
}

/// Aggregator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Ordering violation handling
    pub policy: OrderPolicy,

    /// Only aggregate records dated within this calendar year
    pub year: Option<i32>,

    /// Flag dates that do not strictly increase within a run
    pub check_dates: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            policy: OrderPolicy::Warn,
            year: None,
            check_dates: true,
        }
    }
}

impl ScanConfig {
    /// Default configuration: warn on violations, no year filter, date checks on
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort on the first ordering violation
    pub fn strict() -> Self {
        Self::default().with_policy(OrderPolicy::Strict)
    }

    /// Set how ordering violations are handled
    pub fn with_policy(mut self, policy: OrderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Restrict the scan to records dated within `year`
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Enable or disable the within-run date order check
    pub fn with_date_checks(mut self, enabled: bool) -> Self {
        self.check_dates = enabled;
        self
    }

    /// Load from `TICKERSTATS_*` variables (`TICKERSTATS_POLICY=strict`, `TICKERSTATS_YEAR=2018`)
    pub fn from_env() -> Result<Self, ScanError> {
        Self::from_environment(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit environment source; unset keys keep their defaults
    pub fn from_environment(environment: config::Environment) -> Result<Self, ScanError> {
        config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()
            .and_then(|settings| settings.try_deserialize::<ScanConfig>())
            .map_err(|e| ScanError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> config::Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.policy, OrderPolicy::Warn);
        assert_eq!(config.year, None);
        assert!(config.check_dates);
    }

    #[test]
    fn test_builder() {
        let config = ScanConfig::strict().with_year(2017).with_date_checks(false);
        assert_eq!(config.policy, OrderPolicy::Strict);
        assert_eq!(config.year, Some(2017));
        assert!(!config.check_dates);
    }

    #[test]
    fn test_empty_environment_keeps_defaults() {
        let config = ScanConfig::from_environment(environment(&[])).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let config = ScanConfig::from_environment(environment(&[
            ("TICKERSTATS_POLICY", "strict"),
            ("TICKERSTATS_YEAR", "2018"),
            ("TICKERSTATS_CHECK_DATES", "false"),
        ]))
        .unwrap();

        assert_eq!(config.policy, OrderPolicy::Strict);
        assert_eq!(config.year, Some(2018));
        assert!(!config.check_dates);
    }

    #[test]
    fn test_bad_environment_value() {
        let result = ScanConfig::from_environment(environment(&[("TICKERSTATS_POLICY", "loose")]));
        assert!(matches!(result, Err(ScanError::Config(_))));
    }
}
