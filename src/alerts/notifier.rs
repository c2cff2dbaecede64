use log::Level;
use super::{GlobalStatus, RiskAssessment};

pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Messages for an assessment, each with the log level it is sent at.
    /// High-risk variables first, then the global status.
    pub fn messages(&self, assessment: &RiskAssessment) -> Vec<(Level, String)> {
        if !self.enabled {
            return Vec::new();
        }

        let mut messages: Vec<(Level, String)> = assessment
            .high_risk()
            .map(|variable| {
                (
                    Level::Warn,
                    format!(
                        "{}: {} - {}",
                        variable.variable,
                        variable.message,
                        variable.recommendation.as_deref().unwrap_or("")
                    ),
                )
            })
            .collect();

        let level = match assessment.status {
            GlobalStatus::Critical => Level::Error,
            GlobalStatus::PreventiveReview => Level::Warn,
            GlobalStatus::Stable => Level::Info,
        };
        messages.push((
            level,
            format!("Risk level {}: {}", assessment.level, assessment.status.message()),
        ));

        messages
    }

    /// Emits the assessment through `log`.
    pub fn send_assessment(&self, assessment: &RiskAssessment) {
        for (level, message) in self.messages(assessment) {
            log::log!(level, "{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::aggregate_risk;
    use crate::config::Config;
    use std::collections::BTreeMap;

    fn assessment(pairs: &[(&str, usize)]) -> RiskAssessment {
        let counts: BTreeMap<String, usize> = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        aggregate_risk(&counts, &Config::default())
    }

    #[test]
    fn test_critical_status_logs_as_error() {
        let assessment = assessment(&[("Temperature", 3), ("Vibration", 4), ("Current", 5)]);
        let messages = Notifier::new(true).messages(&assessment);

        assert_eq!(messages.len(), 4);
        assert!(messages[..3].iter().all(|(level, _)| *level == Level::Warn));
        assert_eq!(messages[0].1, "Current: 5 anomalies exceed the tolerance of 2 - Inspect motor load and electrical protection");

        let (level, status) = &messages[3];
        assert_eq!(*level, Level::Error);
        assert!(status.starts_with("Risk level 3: Critical"));
    }

    #[test]
    fn test_stable_status_logs_as_info() {
        let messages = Notifier::new(true).messages(&assessment(&[("Voltage", 1)]));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, Level::Info);
        assert_eq!(messages[0].1, "Risk level 0: System stable: no action required");
    }

    #[test]
    fn test_disabled_notifier_is_silent() {
        let assessment = assessment(&[("Temperature", 9), ("Humidity", 9)]);
        assert!(Notifier::new(false).messages(&assessment).is_empty());
        Notifier::new(false).send_assessment(&assessment);
    }
}
