use std::fs::File;
use std::io::Write;
use std::path::Path;
use serde_json::{json, Value};
use crate::app::{AnalysisReport, VariableReport};
use crate::error::{Error, Result};

pub fn export_to_csv(report: &AnalysisReport, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path)?;
    write_csv(report, &mut file)
}

pub fn write_csv<W: Write>(report: &AnalysisReport, out: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    wtr.write_record([
        "variable", "count", "mean", "min", "max", "lower", "upper", "anomalies", "trend", "slope",
        "forecast",
    ])?;

    for v in &report.variables {
        let (count, mean, min, max) = match &v.summary {
            Ok(s) => (
                s.count.to_string(),
                format!("{:.4}", s.mean),
                format!("{:.4}", s.min),
                format!("{:.4}", s.max),
            ),
            Err(_) => ("0".to_string(), String::new(), String::new(), String::new()),
        };
        let (lower, upper) = match &v.bounds {
            Ok(b) => (format!("{:.4}", b.lower), format!("{:.4}", b.upper)),
            Err(_) => (String::new(), String::new()),
        };
        let anomalies = v.anomaly_count().map(|c| c.to_string()).unwrap_or_default();
        let (trend, slope) = match &v.trend {
            Ok(t) => (t.direction.to_string(), format!("{:.4}", t.slope())),
            Err(_) => (String::new(), String::new()),
        };
        let forecast = v.forecast.as_ref().map(|f| format!("{:.4}", f)).unwrap_or_default();

        wtr.write_record([
            v.variable.as_str(),
            count.as_str(),
            mean.as_str(),
            min.as_str(),
            max.as_str(),
            lower.as_str(),
            upper.as_str(),
            anomalies.as_str(),
            trend.as_str(),
            slope.as_str(),
            forecast.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_to_json(report: &AnalysisReport, path: impl AsRef<Path>) -> Result<()> {
    let json_str = serde_json::to_string_pretty(&report_to_json(report))
        .map_err(|e| Error::Parse(format!("Failed to serialize JSON: {}", e)))?;

    let mut file = File::create(path)?;
    file.write_all(json_str.as_bytes())?;

    Ok(())
}

pub fn report_to_json(report: &AnalysisReport) -> Value {
    let variables: Vec<Value> = report.variables.iter().map(variable_to_json).collect();

    let risk: Vec<Value> = report
        .risk
        .variables
        .iter()
        .map(|v| {
            json!({
                "variable": v.variable,
                "anomaly_count": v.anomaly_count,
                "severity": v.severity.to_string(),
                "message": v.message,
                "recommendation": v.recommendation,
            })
        })
        .collect();

    json!({
        "variables": variables,
        "risk": {
            "level": report.risk.level,
            "status": report.risk.status.to_string(),
            "message": report.risk.status.message(),
            "variables": risk,
        },
    })
}

fn variable_to_json(v: &VariableReport) -> Value {
    let summary = match &v.summary {
        Ok(s) => json!({
            "count": s.count,
            "mean": s.mean,
            "min": s.min,
            "max": s.max,
            "latest": s.latest,
        }),
        Err(e) => json!({ "error": e.to_string() }),
    };

    let bounds = match &v.bounds {
        Ok(b) => json!({
            "mean": b.mean,
            "std_dev": b.std_dev,
            "lower": b.lower,
            "upper": b.upper,
        }),
        Err(e) => json!({ "error": e.to_string() }),
    };

    let trend = match &v.trend {
        Ok(t) => json!({
            "direction": t.direction.to_string(),
            "slope": t.fit.slope,
            "intercept": t.fit.intercept,
            "r_squared": t.fit.r_squared,
            "samples": t.fit.samples,
        }),
        Err(e) => json!({ "error": e.to_string() }),
    };

    let forecast = match &v.forecast {
        Ok(f) => json!({ "next": f }),
        Err(e) => json!({ "error": e.to_string() }),
    };

    let anomalies: Vec<Value> = v
        .anomalies
        .iter()
        .map(|a| {
            json!({
                "timestamp": a.timestamp.to_string(),
                "value": a.value,
                "direction": a.direction.to_string(),
                "description": a.description,
            })
        })
        .collect();

    json!({
        "variable": v.variable,
        "summary": summary,
        "bounds": bounds,
        "anomalies": anomalies,
        "trend": trend,
        "forecast": forecast,
        "level": v.level.map(|l| l.message()),
    })
}
