pub mod bounds;
pub mod flags;

pub use bounds::{compute_bounds, compute_bounds_with, summarize, Bounds, Summary};
pub use flags::{describe_anomaly, describe_with, flag_anomalies, AnomalyFlag, Direction, FlagIter, Flags};
