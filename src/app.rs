use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use crate::alerts::{aggregate_risk, check_level, LevelStatus, Notifier, RiskAssessment};
use crate::anomaly::{compute_bounds_with, describe_with, flag_anomalies, summarize, Bounds, Direction, Summary};
use crate::config::{Config, VariableProfile};
use crate::error::Result;
use crate::history::{Series, SeriesSet};
use crate::trends::{TrendAnalyzer, TrendClassification};

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyRecord {
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub direction: Direction,
    pub description: String,
}

/// Everything computed for one variable. Each statistic keeps its own
/// `Result` so a short series fails only the statistics it cannot support.
#[derive(Debug)]
pub struct VariableReport {
    pub variable: String,
    pub summary: Result<Summary>,
    pub bounds: Result<Bounds>,
    pub anomalies: Vec<AnomalyRecord>,
    pub trend: Result<TrendClassification>,
    pub forecast: Result<f64>,
    pub level: Option<LevelStatus>,
}

impl VariableReport {
    /// `None` when the bounds could not be computed.
    pub fn anomaly_count(&self) -> Option<usize> {
        self.bounds.as_ref().ok().map(|_| self.anomalies.len())
    }
}

#[derive(Debug)]
pub struct AnalysisReport {
    pub variables: Vec<VariableReport>,
    pub risk: RiskAssessment,
}

impl AnalysisReport {
    pub fn variable(&self, name: &str) -> Option<&VariableReport> {
        self.variables.iter().find(|v| v.variable == name)
    }
}

pub struct Analyzer {
    pub config: Config,
    pub trend_analyzer: TrendAnalyzer,
    pub notifier: Notifier,
}

impl Analyzer {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let trend_analyzer = TrendAnalyzer::new(&config.analysis);

        Ok(Self {
            config,
            trend_analyzer,
            notifier: Notifier::new(true),
        })
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn analyze(&self, set: &SeriesSet) -> AnalysisReport {
        let variables: Vec<VariableReport> = set.iter().map(|s| self.analyze_series(s)).collect();

        let counts: BTreeMap<String, usize> = variables
            .iter()
            .filter_map(|v| v.anomaly_count().map(|count| (v.variable.clone(), count)))
            .collect();

        let risk = aggregate_risk(&counts, &self.config);
        self.notifier.send_assessment(&risk);

        AnalysisReport { variables, risk }
    }

    pub fn analyze_series(&self, series: &Series) -> VariableReport {
        let variable = series.variable().to_string();
        let fallback = VariableProfile::default();
        let profile = self.config.profile_for(&variable).unwrap_or(&fallback);

        log::debug!("Analyzing {} ({} readings)", variable, series.len());

        let summary = summarize(series);
        let bounds = compute_bounds_with(series, self.config.analysis.sigma_multiplier);

        let anomalies = match &bounds {
            Ok(bounds) => flag_anomalies(series, *bounds)
                .anomalies()
                .map(|flag| AnomalyRecord {
                    timestamp: flag.reading.timestamp(),
                    value: flag.reading.value(),
                    direction: flag.direction,
                    description: describe_with(flag.reading, bounds, profile),
                })
                .collect(),
            Err(e) => {
                log::warn!("{}: bounds unavailable: {}", variable, e);
                Vec::new()
            }
        };

        let trend = self.trend_analyzer.classify(series);
        if let Err(e) = &trend {
            log::warn!("{}: trend unavailable: {}", variable, e);
        }

        let forecast = self.trend_analyzer.forecast(series);
        if let Err(e) = &forecast {
            log::warn!("{}: forecast unavailable: {}", variable, e);
        }

        let level = summary
            .as_ref()
            .ok()
            .and_then(|s| check_level(s.mean, profile));

        VariableReport {
            variable,
            summary,
            bounds,
            anomalies,
            trend,
            forecast,
            level,
        }
    }
}
