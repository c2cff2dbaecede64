use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use super::buffer::{Series, SeriesSet};
use crate::error::{Error, Result};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Reads a wide CSV: a `timestamp` column followed by one column per variable.
/// Empty cells are skipped.
pub fn read_csv<R: Read>(reader: R) -> Result<SeriesSet> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err(Error::Parse(
            "expected a timestamp column followed by at least one variable column".to_string(),
        ));
    }

    let mut series: Vec<Series> = Vec::with_capacity(headers.len() - 1);
    for name in headers.iter().skip(1) {
        if series.iter().any(|s| s.variable() == name) {
            return Err(Error::Parse(format!("duplicate column '{}'", name)));
        }
        series.push(Series::new(name));
    }

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let line = row + 2;

        let raw_ts = record.get(0).unwrap_or("");
        let timestamp = parse_timestamp(raw_ts)
            .ok_or_else(|| Error::Parse(format!("line {}: invalid timestamp '{}'", line, raw_ts)))?;

        for (column, target) in series.iter_mut().enumerate() {
            let cell = record.get(column + 1).unwrap_or("");
            if cell.is_empty() {
                continue;
            }
            let value: f64 = cell.parse().map_err(|_| {
                Error::Parse(format!(
                    "line {}: invalid value '{}' for '{}'",
                    line,
                    cell,
                    target.variable()
                ))
            })?;
            target.record(timestamp, value)?;
        }
    }

    let mut set = SeriesSet::new();
    for s in series {
        log::debug!("Loaded {} readings for {}", s.len(), s.variable());
        set.insert(s);
    }
    Ok(set)
}

pub fn read_csv_file(path: impl AsRef<Path>) -> Result<SeriesSet> {
    let file = File::open(path)?;
    read_csv(file)
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
