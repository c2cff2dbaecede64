use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default = "default_variables")]
    pub variables: BTreeMap<String, VariableProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_slope_threshold")]
    pub slope_threshold: f64,
    #[serde(default = "default_sigma_multiplier")]
    pub sigma_multiplier: f64,
    #[serde(default = "default_forecast_min_samples")]
    pub forecast_min_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_variable_high_threshold")]
    pub variable_high_threshold: usize,
    #[serde(default = "default_preventive_review_at")]
    pub preventive_review_at: usize,
    #[serde(default = "default_critical_at")]
    pub critical_at: usize,
}

/// How a variable's anomalies are read and what to do about them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableProfile {
    #[serde(default = "default_above")]
    pub above: String,
    #[serde(default = "default_below")]
    pub below: String,
    #[serde(default = "default_recommendation")]
    pub recommendation: String,
    /// Expected operating range for the series mean, `[low, high]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_range: Option<[f64; 2]>,
}

fn default_slope_threshold() -> f64 { 0.1 }
fn default_sigma_multiplier() -> f64 { 2.0 }
fn default_forecast_min_samples() -> usize { 5 }
fn default_variable_high_threshold() -> usize { 2 }
fn default_preventive_review_at() -> usize { 2 }
fn default_critical_at() -> usize { 3 }
fn default_above() -> String { "possible overload or thermal excess".to_string() }
fn default_below() -> String { "possible sensor fault or low efficiency".to_string() }
fn default_recommendation() -> String { "Inspect the equipment behind this variable".to_string() }

fn profile(above: &str, below: &str, recommendation: &str, normal_range: Option<[f64; 2]>) -> VariableProfile {
    VariableProfile {
        above: above.to_string(),
        below: below.to_string(),
        recommendation: recommendation.to_string(),
        normal_range,
    }
}

fn default_variables() -> BTreeMap<String, VariableProfile> {
    let mut variables = BTreeMap::new();
    variables.insert(
        "temperature".to_string(),
        profile(
            "possible overheating or thermal excess",
            "possible sensor fault or cooling anomaly",
            "Check the cooling system and ventilation",
            Some([20.0, 30.0]),
        ),
    );
    variables.insert(
        "humidity".to_string(),
        profile(
            "possible condensation risk",
            "possible sensor fault or excessively dry air",
            "Inspect humidity control and enclosure seals",
            None,
        ),
    );
    variables.insert(
        "vibration".to_string(),
        profile(
            "possible mechanical misalignment or bearing wear",
            "possible sensor fault or stalled equipment",
            "Schedule a mechanical inspection of bearings and alignment",
            None,
        ),
    );
    variables.insert(
        "current".to_string(),
        profile(
            "possible electrical overload",
            "possible sensor fault or low efficiency",
            "Inspect motor load and electrical protection",
            None,
        ),
    );
    variables.insert(
        "voltage".to_string(),
        profile(
            "possible supply overvoltage",
            "possible supply sag or sensor fault",
            "Verify power supply stability and regulation",
            None,
        ),
    );
    variables.insert(
        "production".to_string(),
        profile(
            "output above the expected rate",
            "possible bottleneck or low efficiency",
            "Review line throughput and upstream supply",
            None,
        ),
    );
    variables
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            slope_threshold: default_slope_threshold(),
            sigma_multiplier: default_sigma_multiplier(),
            forecast_min_samples: default_forecast_min_samples(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            variable_high_threshold: default_variable_high_threshold(),
            preventive_review_at: default_preventive_review_at(),
            critical_at: default_critical_at(),
        }
    }
}

impl Default for VariableProfile {
    fn default() -> Self {
        Self {
            above: default_above(),
            below: default_below(),
            recommendation: default_recommendation(),
            normal_range: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            risk: RiskConfig::default(),
            variables: default_variables(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path()?)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;
        if !analysis.slope_threshold.is_finite() || analysis.slope_threshold < 0.0 {
            return Err(Error::invalid("slope_threshold", "must be a finite, non-negative number"));
        }
        if !analysis.sigma_multiplier.is_finite() || analysis.sigma_multiplier <= 0.0 {
            return Err(Error::invalid("sigma_multiplier", "must be a finite, positive number"));
        }
        if analysis.forecast_min_samples < 2 {
            return Err(Error::invalid("forecast_min_samples", "a line needs at least 2 samples"));
        }

        let risk = &self.risk;
        if risk.preventive_review_at == 0 {
            return Err(Error::invalid("preventive_review_at", "must be at least 1"));
        }
        if risk.preventive_review_at > risk.critical_at {
            return Err(Error::invalid(
                "preventive_review_at",
                format!("must not exceed critical_at ({})", risk.critical_at),
            ));
        }

        for (name, profile) in &self.variables {
            if let Some([low, high]) = profile.normal_range {
                if low.is_nan() || high.is_nan() || low > high {
                    return Err(Error::invalid(
                        &format!("variables.{}.normal_range", name),
                        "low bound must not exceed high bound",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Finds the profile for a variable. An exact (case-insensitive) key wins;
    /// otherwise the longest key contained in the variable name, so that
    /// `"Temperature (°C)"` picks up `temperature`.
    pub fn profile_for(&self, variable: &str) -> Option<&VariableProfile> {
        let wanted = variable.to_lowercase();

        if let Some((_, profile)) = self
            .variables
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
        {
            return Some(profile);
        }

        self.variables
            .iter()
            .filter(|(key, _)| !key.is_empty() && wanted.contains(&key.to_lowercase()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, profile)| profile)
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| Error::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config/sensor-observer/config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [analysis]
            slope_threshold = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.slope_threshold, 0.5);
        assert_eq!(config.analysis.forecast_min_samples, 5);
        assert_eq!(config.risk.variable_high_threshold, 2);
        assert_eq!(config.risk.critical_at, 3);
        assert!(config.variables.contains_key("vibration"));
    }

    #[test]
    fn test_custom_variable_table_replaces_defaults() {
        let config = Config::from_toml(
            r#"
            [variables.pressure]
            above = "possible blockage"
            recommendation = "Check the relief valve"
            "#,
        )
        .unwrap();

        assert_eq!(config.variables.len(), 1);
        let pressure = config.profile_for("Pressure").unwrap();
        assert_eq!(pressure.above, "possible blockage");
        assert_eq!(pressure.below, "possible sensor fault or low efficiency");
        assert!(config.profile_for("temperature").is_none());
    }

    #[test]
    fn test_profile_lookup_matches_column_names() {
        let config = Config::default();
        let temp = config.profile_for("Temperature (°C)").unwrap();
        assert_eq!(temp.normal_range, Some([20.0, 30.0]));
        assert!(config.profile_for("Production rate (u/h)").is_some());
        assert!(config.profile_for("Pressure").is_none());
    }

    #[test]
    fn test_rejects_negative_slope_threshold() {
        let result = Config::from_toml("[analysis]\nslope_threshold = -1.0\n");
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_rejects_forecast_minimum_below_two() {
        let result = Config::from_toml("[analysis]\nforecast_min_samples = 1\n");
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_rejects_inverted_global_cut_points() {
        let result = Config::from_toml("[risk]\npreventive_review_at = 4\ncritical_at = 3\n");
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_rejects_inverted_normal_range() {
        let result = Config::from_toml("[variables.temperature]\nnormal_range = [30.0, 20.0]\n");
        match result {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, "variables.temperature.normal_range"),
            other => panic!("expected InvalidParameter, got {:?}", other.map(|_| ())),
        }

        // a degenerate range is still a range
        assert!(Config::from_toml("[variables.temperature]\nnormal_range = [25.0, 25.0]\n").is_ok());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = Config::from_toml("[analysis\nslope_threshold = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.analysis.slope_threshold = 0.25;
        config.risk.critical_at = 4;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.analysis.slope_threshold, 0.25);
        assert_eq!(loaded.risk.critical_at, 4);
        assert_eq!(loaded.variables, config.variables);
    }
}
