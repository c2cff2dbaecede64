pub mod detector;
pub mod notifier;

pub use detector::{
    aggregate_risk, check_level, GlobalStatus, LevelStatus, RiskAssessment, VariableRisk,
    VariableSeverity,
};
pub use notifier::Notifier;
