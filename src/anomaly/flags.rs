use std::fmt;
use std::slice;
use super::bounds::Bounds;
use crate::config::{Config, VariableProfile};
use crate::history::{Reading, Series};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Above,
    Below,
    None,
}

impl Direction {
    pub fn of(value: f64, bounds: &Bounds) -> Self {
        if value > bounds.upper {
            Direction::Above
        } else if value < bounds.lower {
            Direction::Below
        } else {
            Direction::None
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Above => write!(f, "above"),
            Direction::Below => write!(f, "below"),
            Direction::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyFlag<'a> {
    pub reading: &'a Reading,
    pub is_anomalous: bool,
    pub direction: Direction,
}

/// Lazy view flagging each reading of a series against fixed bounds.
///
/// Iterating it again re-evaluates every reading from the start.
#[derive(Debug, Clone, Copy)]
pub struct Flags<'a> {
    readings: &'a [Reading],
    bounds: Bounds,
}

impl<'a> Flags<'a> {
    pub fn iter(&self) -> FlagIter<'a> {
        FlagIter {
            inner: self.readings.iter(),
            bounds: self.bounds,
        }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn anomalies(&self) -> impl Iterator<Item = AnomalyFlag<'a>> {
        self.iter().filter(|flag| flag.is_anomalous)
    }

    pub fn count(&self) -> usize {
        self.anomalies().count()
    }
}

impl<'a> IntoIterator for Flags<'a> {
    type Item = AnomalyFlag<'a>;
    type IntoIter = FlagIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &Flags<'a> {
    type Item = AnomalyFlag<'a>;
    type IntoIter = FlagIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct FlagIter<'a> {
    inner: slice::Iter<'a, Reading>,
    bounds: Bounds,
}

impl<'a> Iterator for FlagIter<'a> {
    type Item = AnomalyFlag<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let reading = self.inner.next()?;
        let direction = Direction::of(reading.value(), &self.bounds);
        Some(AnomalyFlag {
            reading,
            is_anomalous: direction != Direction::None,
            direction,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for FlagIter<'_> {}

pub fn flag_anomalies(series: &Series, bounds: Bounds) -> Flags<'_> {
    Flags {
        readings: series.readings(),
        bounds,
    }
}

/// Human-readable reading of an out-of-range value, using the variable's
/// profile from `config` or the generic interpretation when none matches.
pub fn describe_anomaly(reading: &Reading, bounds: &Bounds, config: &Config) -> String {
    let fallback = VariableProfile::default();
    let profile = config.profile_for(reading.variable()).unwrap_or(&fallback);
    describe_with(reading, bounds, profile)
}

pub fn describe_with(reading: &Reading, bounds: &Bounds, profile: &VariableProfile) -> String {
    match Direction::of(reading.value(), bounds) {
        Direction::Above => format!(
            "{} at {} is {:.2}, above the upper bound {:.2}: {}",
            reading.variable(),
            reading.timestamp(),
            reading.value(),
            bounds.upper,
            profile.above
        ),
        Direction::Below => format!(
            "{} at {} is {:.2}, below the lower bound {:.2}: {}",
            reading.variable(),
            reading.timestamp(),
            reading.value(),
            bounds.lower,
            profile.below
        ),
        Direction::None => format!(
            "{} at {} is {:.2}, within normal range",
            reading.variable(),
            reading.timestamp(),
            reading.value()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::bounds::compute_bounds;
    use crate::history::buffer::{daily, day};
    use proptest::prelude::*;

    fn spike_series() -> Series {
        // one spike in an otherwise flat series sits well outside 2σ
        daily("Temperature", &[25.0, 25.0, 25.0, 25.0, 25.0, 25.0, 25.0, 25.0, 25.0, 40.0])
    }

    #[test]
    fn test_flags_spike_above() {
        let series = spike_series();
        let bounds = compute_bounds(&series).unwrap();
        let flags = flag_anomalies(&series, bounds);

        let anomalies: Vec<_> = flags.anomalies().collect();
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].direction, Direction::Above);
        assert_eq!(anomalies[0].reading.value(), 40.0);
    }

    #[test]
    fn test_flags_dip_below() {
        let series = daily("Voltage", &[220.0, 221.0, 219.0, 220.0, 220.0, 221.0, 219.0, 220.0, 150.0, 220.0]);
        let bounds = compute_bounds(&series).unwrap();
        let flags = flag_anomalies(&series, bounds);
        let directions: Vec<_> = flags.anomalies().map(|f| f.direction).collect();
        assert_eq!(directions, vec![Direction::Below]);
    }

    #[test]
    fn test_constant_series_has_no_anomalies() {
        let series = daily("Humidity", &[55.0; 8]);
        let flags = flag_anomalies(&series, compute_bounds(&series).unwrap());
        assert_eq!(flags.count(), 0);
        assert_eq!(flags.iter().len(), 8);
    }

    #[test]
    fn test_restartable() {
        let series = spike_series();
        let flags = flag_anomalies(&series, compute_bounds(&series).unwrap());

        let first: Vec<_> = flags.iter().collect();
        let second: Vec<_> = (&flags).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(flags.count(), flags.count());
    }

    #[test]
    fn test_value_on_bound_is_normal() {
        let bounds = Bounds { mean: 10.0, std_dev: 1.0, lower: 8.0, upper: 12.0 };
        assert_eq!(Direction::of(12.0, &bounds), Direction::None);
        assert_eq!(Direction::of(8.0, &bounds), Direction::None);
        assert_eq!(Direction::of(12.0001, &bounds), Direction::Above);
    }

    #[test]
    fn test_near_max_values_never_yield_nan_bounds() {
        let series = daily("Current", &[1.0e307, -1.0e307, 1.0e307, -1.0e307]);
        let bounds = compute_bounds(&series).unwrap();
        assert!(!bounds.lower.is_nan() && !bounds.upper.is_nan());
        for flag in flag_anomalies(&series, bounds) {
            assert_eq!(flag.is_anomalous, !bounds.contains(flag.reading.value()));
            assert!(!flag.is_anomalous);
        }

        let overflowing = daily("Current", &[1.0e308, -1.0e308]);
        assert!(compute_bounds(&overflowing).is_err());
    }

    #[test]
    fn test_describe_uses_default_interpretation() {
        let config = Config::default();
        let bounds = Bounds { mean: 10.0, std_dev: 1.0, lower: 8.0, upper: 12.0 };
        let high = Reading::new("Pressure", day(0), 15.0).unwrap();
        let low = Reading::new("Pressure", day(1), 5.0).unwrap();

        assert!(describe_anomaly(&high, &bounds, &config).ends_with("possible overload or thermal excess"));
        assert!(describe_anomaly(&low, &bounds, &config).ends_with("possible sensor fault or low efficiency"));
    }

    #[test]
    fn test_describe_uses_profile_table() {
        let config = Config::default();
        let bounds = Bounds { mean: 0.5, std_dev: 0.1, lower: 0.3, upper: 0.7 };
        let reading = Reading::new("Vibration (mm/s)", day(0), 1.2).unwrap();

        let text = describe_anomaly(&reading, &bounds, &config);
        assert!(text.contains("above the upper bound 0.70"));
        assert!(text.ends_with("possible mechanical misalignment or bearing wear"));
    }

    #[test]
    fn test_describe_normal_reading() {
        let bounds = Bounds { mean: 10.0, std_dev: 1.0, lower: 8.0, upper: 12.0 };
        let reading = Reading::new("Current", day(0), 10.5).unwrap();
        assert!(describe_anomaly(&reading, &bounds, &Config::default()).ends_with("within normal range"));
    }

    proptest! {
        #[test]
        fn prop_flags_agree_with_bounds(values in prop::collection::vec(-1.0e6f64..1.0e6, 1..64)) {
            let series = daily("Current", &values);
            let bounds = compute_bounds(&series).unwrap();
            for flag in flag_anomalies(&series, bounds) {
                prop_assert_eq!(flag.is_anomalous, !bounds.contains(flag.reading.value()));
            }
        }

        #[test]
        fn prop_extreme_values_flag_consistently(
            values in prop::collection::vec(
                prop_oneof![
                    -1.0e6f64..1.0e6,
                    prop::num::f64::POSITIVE | prop::num::f64::NEGATIVE | prop::num::f64::NORMAL,
                ],
                1..32,
            )
        ) {
            let series = daily("Current", &values);
            match compute_bounds(&series) {
                Ok(bounds) => {
                    prop_assert!(bounds.lower.is_finite() && bounds.upper.is_finite());
                    for flag in flag_anomalies(&series, bounds) {
                        prop_assert_eq!(flag.is_anomalous, !bounds.contains(flag.reading.value()));
                    }
                }
                Err(e) => {
                    let is_invalid_parameter = matches!(e, crate::error::Error::InvalidParameter { .. });
                    prop_assert!(is_invalid_parameter);
                }
            }
        }

        #[test]
        fn prop_constant_series_never_flags(value in -1.0e6f64..1.0e6, len in 2usize..64) {
            let series = daily("Voltage", &vec![value; len]);
            let bounds = compute_bounds(&series).unwrap();
            prop_assert_eq!(flag_anomalies(&series, bounds).count(), 0);
        }
    }
}
