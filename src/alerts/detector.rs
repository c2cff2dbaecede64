use std::collections::BTreeMap;
use std::fmt;
use crate::config::{Config, VariableProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VariableSeverity {
    Nominal,
    MinorVariation,
    High,
}

impl fmt::Display for VariableSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableSeverity::Nominal => write!(f, "nominal"),
            VariableSeverity::MinorVariation => write!(f, "minor variation"),
            VariableSeverity::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GlobalStatus {
    Stable,
    PreventiveReview,
    Critical,
}

impl GlobalStatus {
    pub fn message(&self) -> &'static str {
        match self {
            GlobalStatus::Critical => "Critical: several variables out of range, inspect the equipment immediately",
            GlobalStatus::PreventiveReview => "Preventive review recommended: multiple variables show repeated anomalies",
            GlobalStatus::Stable => "System stable: no action required",
        }
    }
}

impl fmt::Display for GlobalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalStatus::Stable => write!(f, "stable"),
            GlobalStatus::PreventiveReview => write!(f, "preventive-review"),
            GlobalStatus::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableRisk {
    pub variable: String,
    pub anomaly_count: usize,
    pub severity: VariableSeverity,
    pub message: String,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Number of variables above the per-variable threshold.
    pub level: usize,
    pub status: GlobalStatus,
    pub variables: Vec<VariableRisk>,
}

impl RiskAssessment {
    pub fn high_risk(&self) -> impl Iterator<Item = &VariableRisk> {
        self.variables
            .iter()
            .filter(|v| v.severity == VariableSeverity::High)
    }

    pub fn recommendations(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter_map(|v| v.recommendation.as_deref())
            .collect()
    }
}

/// Rolls per-variable anomaly counts up into a global status.
///
/// Counts above `risk.variable_high_threshold` add one unit of risk and pull
/// the variable's recommendation from the profile table.
pub fn aggregate_risk(counts: &BTreeMap<String, usize>, config: &Config) -> RiskAssessment {
    let risk = &config.risk;
    let fallback = VariableProfile::default();

    let variables: Vec<VariableRisk> = counts
        .iter()
        .map(|(variable, &anomaly_count)| {
            if anomaly_count > risk.variable_high_threshold {
                let profile = config.profile_for(variable).unwrap_or(&fallback);
                VariableRisk {
                    variable: variable.clone(),
                    anomaly_count,
                    severity: VariableSeverity::High,
                    message: format!(
                        "{} anomalies exceed the tolerance of {}",
                        anomaly_count, risk.variable_high_threshold
                    ),
                    recommendation: Some(profile.recommendation.clone()),
                }
            } else if anomaly_count > 0 {
                VariableRisk {
                    variable: variable.clone(),
                    anomaly_count,
                    severity: VariableSeverity::MinorVariation,
                    message: "minor variation, no action required".to_string(),
                    recommendation: None,
                }
            } else {
                VariableRisk {
                    variable: variable.clone(),
                    anomaly_count,
                    severity: VariableSeverity::Nominal,
                    message: "nominal".to_string(),
                    recommendation: None,
                }
            }
        })
        .collect();

    let level = variables
        .iter()
        .filter(|v| v.severity == VariableSeverity::High)
        .count();

    let status = if level >= risk.critical_at {
        GlobalStatus::Critical
    } else if level >= risk.preventive_review_at {
        GlobalStatus::PreventiveReview
    } else {
        GlobalStatus::Stable
    };

    RiskAssessment { level, status, variables }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    High,
    Low,
    Normal,
}

impl LevelStatus {
    pub fn message(&self) -> &'static str {
        match self {
            LevelStatus::High => "average is above the normal operating range",
            LevelStatus::Low => "average is below the normal operating range",
            LevelStatus::Normal => "average within the normal operating range",
        }
    }
}

/// Compares a series mean against the profile's `normal_range`, if it has one.
pub fn check_level(mean: f64, profile: &VariableProfile) -> Option<LevelStatus> {
    let [low, high] = profile.normal_range?;
    Some(if mean > high {
        LevelStatus::High
    } else if mean < low {
        LevelStatus::Low
    } else {
        LevelStatus::Normal
    })
}
