pub mod alerts;
pub mod anomaly;
pub mod app;
pub mod config;
pub mod error;
pub mod history;
pub mod trends;

pub use app::{AnalysisReport, Analyzer, VariableReport};
pub use config::Config;
pub use error::{Error, Result};
