use clap::Parser;
use sensor_observer::history::{export_to_csv, export_to_json, read_csv_file, report_to_json, write_csv};
use sensor_observer::{AnalysisReport, Analyzer, Config, Error, Result};

#[derive(Parser, Debug)]
#[command(name = "sensor-observer")]
#[command(author, version, about = "Anomaly and trend analysis for sensor readings", long_about = None)]
struct Args {
    #[arg(help = "CSV file with a timestamp column and one column per variable")]
    input: String,

    #[arg(short, long, help = "Path to custom config file")]
    config: Option<String>,

    #[arg(short, long, help = "Output format (text, json, csv)", default_value = "text")]
    format: String,

    #[arg(long, help = "Slope magnitude separating stable from rising/falling")]
    slope_threshold: Option<f64>,

    #[arg(long, help = "Export the report to a file (.csv or .json)", value_name = "FILE")]
    export: Option<String>,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    log::info!("Starting sensor-observer v{}", env!("CARGO_PKG_VERSION"));

    let mut config = if let Some(config_path) = &args.config {
        log::info!("Loading config from: {}", config_path);
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_else(|e| {
            log::warn!("Falling back to default config: {}", e);
            Config::default()
        })
    };

    if let Some(threshold) = args.slope_threshold {
        config.analysis.slope_threshold = threshold;
    }

    let set = read_csv_file(&args.input)?;
    log::info!("Loaded {} variable(s) from {}", set.len(), args.input);

    let analyzer = Analyzer::new(config)?;
    let report = analyzer.analyze(&set);

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report_to_json(&report))
                .map_err(|e| Error::Parse(format!("Failed to serialize JSON: {}", e)))?;
            println!("{}", json);
        }
        "csv" => {
            let stdout = std::io::stdout();
            write_csv(&report, &mut stdout.lock())?;
        }
        "text" => print_text(&report),
        other => {
            return Err(Error::Config(format!("Unknown output format: {}", other)));
        }
    }

    if let Some(path) = &args.export {
        if path.ends_with(".json") {
            export_to_json(&report, path)?;
        } else {
            export_to_csv(&report, path)?;
        }
        log::info!("Report exported to {}", path);
    }

    Ok(())
}

fn print_text(report: &AnalysisReport) {
    for v in &report.variables {
        println!("== {}", v.variable);

        match &v.summary {
            Ok(s) => println!(
                "  readings: {} | mean: {:.2} | min: {:.2} | max: {:.2}",
                s.count, s.mean, s.min, s.max
            ),
            Err(e) => println!("  summary unavailable: {}", e),
        }

        if let Some(level) = v.level {
            println!("  {}", level.message());
        }

        match &v.bounds {
            Ok(b) => println!("  normal range: [{:.2}, {:.2}]", b.lower, b.upper),
            Err(e) => println!("  bounds unavailable: {}", e),
        }

        for anomaly in &v.anomalies {
            println!("  ! {}", anomaly.description);
        }

        match &v.trend {
            Ok(t) => println!(
                "  trend: {} (slope {:.3}, r² {:.2}, n={})",
                t.direction,
                t.slope(),
                t.fit.r_squared,
                t.fit.samples
            ),
            Err(e) => println!("  trend unavailable: {}", e),
        }

        match &v.forecast {
            Ok(f) => println!("  next value: {:.2}", f),
            Err(e) => println!("  forecast unavailable: {}", e),
        }
    }

    println!();
    for risk in &report.risk.variables {
        match &risk.recommendation {
            Some(rec) => println!("{}: {} - {}", risk.variable, risk.message, rec),
            None => println!("{}: {}", risk.variable, risk.message),
        }
    }
    println!(
        "Status: {} (risk level {}) - {}",
        report.risk.status,
        report.risk.level,
        report.risk.status.message()
    );
}
