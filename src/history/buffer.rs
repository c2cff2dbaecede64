use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use crate::error::{Error, Result};

/// One measurement of one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    variable: String,
    timestamp: NaiveDateTime,
    value: f64,
}

impl Reading {
    pub fn new(variable: impl Into<String>, timestamp: NaiveDateTime, value: f64) -> Result<Self> {
        let variable = variable.into();
        if !value.is_finite() {
            return Err(Error::invalid(
                "value",
                format!("reading for '{}' at {} is not a finite number", variable, timestamp),
            ));
        }
        Ok(Self { variable, timestamp, value })
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Readings of a single variable in chronological order.
#[derive(Debug, Clone)]
pub struct Series {
    variable: String,
    readings: Vec<Reading>,
}

impl Series {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            readings: Vec::new(),
        }
    }

    /// Builds a series from `(timestamp, value)` pairs, in the order given.
    pub fn from_points<I>(variable: impl Into<String>, points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDateTime, f64)>,
    {
        let mut series = Self::new(variable);
        for (timestamp, value) in points {
            series.record(timestamp, value)?;
        }
        Ok(series)
    }

    pub fn push(&mut self, reading: Reading) -> Result<()> {
        if reading.variable != self.variable {
            return Err(Error::invalid(
                "variable",
                format!("reading for '{}' pushed into series '{}'", reading.variable, self.variable),
            ));
        }
        if let Some(last) = self.readings.last() {
            if reading.timestamp < last.timestamp {
                return Err(Error::OutOfOrder { variable: self.variable.clone() });
            }
        }
        self.readings.push(reading);
        Ok(())
    }

    pub fn record(&mut self, timestamp: NaiveDateTime, value: f64) -> Result<()> {
        let reading = Reading::new(self.variable.clone(), timestamp, value)?;
        self.push(reading)
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().map(|r| r.value)
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// All series of a run, keyed by variable name.
#[derive(Debug, Clone, Default)]
pub struct SeriesSet {
    series: BTreeMap<String, Series>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: Series) -> Option<Series> {
        self.series.insert(series.variable.clone(), series)
    }

    /// Appends a reading to its variable's series, creating the series on first use.
    pub fn record(&mut self, reading: Reading) -> Result<()> {
        self.series
            .entry(reading.variable.clone())
            .or_insert_with(|| Series::new(reading.variable.clone()))
            .push(reading)
    }

    pub fn get(&self, variable: &str) -> Option<&Series> {
        self.series.get(variable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn day(n: u32) -> NaiveDateTime {
    use chrono::NaiveDate;
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.checked_add_days(chrono::Days::new(n as u64)))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// Daily series starting 2025-01-01, for tests.
#[cfg(test)]
pub(crate) fn daily(variable: &str, values: &[f64]) -> Series {
    Series::from_points(
        variable,
        values.iter().enumerate().map(|(i, &v)| (day(i as u32), v)),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order() {
        let series = daily("Temperature", &[21.0, 22.5, 23.0]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.values().collect::<Vec<_>>(), vec![21.0, 22.5, 23.0]);
        assert_eq!(series.latest().map(Reading::value), Some(23.0));
    }

    #[test]
    fn test_equal_timestamps_allowed() {
        let mut series = Series::new("Current");
        series.record(day(1), 10.0).unwrap();
        series.record(day(1), 11.0).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut series = Series::new("Voltage");
        series.record(day(3), 220.0).unwrap();
        let result = series.record(day(2), 221.0);
        assert!(matches!(result, Err(Error::OutOfOrder { .. })));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut series = Series::new("Humidity");
        assert!(matches!(series.record(day(0), f64::NAN), Err(Error::InvalidParameter { .. })));
        assert!(matches!(series.record(day(0), f64::INFINITY), Err(Error::InvalidParameter { .. })));
        assert!(series.is_empty());
    }

    #[test]
    fn test_foreign_variable_rejected() {
        let mut series = Series::new("Humidity");
        let reading = Reading::new("Voltage", day(0), 1.0).unwrap();
        assert!(series.push(reading).is_err());
    }

    #[test]
    fn test_series_set_groups_by_variable() {
        let mut set = SeriesSet::new();
        set.record(Reading::new("Vibration", day(0), 0.2).unwrap()).unwrap();
        set.record(Reading::new("Current", day(0), 12.0).unwrap()).unwrap();
        set.record(Reading::new("Vibration", day(1), 0.3).unwrap()).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.variables().collect::<Vec<_>>(), vec!["Current", "Vibration"]);
        assert_eq!(set.get("Vibration").map(Series::len), Some(2));
    }
}
