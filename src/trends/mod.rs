pub mod analyzer;
pub mod types;

pub use analyzer::{classify_trend, fit_line, forecast_next, forecast_next_with, TrendAnalyzer};
pub use types::{LinearFit, TrendClassification, TrendDirection};
