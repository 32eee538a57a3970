//! Hospital Resource Forecast Runner
//!
//! Wires configuration, logging, CSV sources and model artifacts into the
//! forecast pipeline for the `hospital-forecast` binary.

mod settings;

pub use settings::{AppConfig, LogFormat, ResourceConfig, TrendConfig, ENV_PREFIX};

use anyhow::{Context, Result};
use clap::ValueEnum;
use forecaster::{
    daily_totals, monthly_totals, resource_status, write_csv, EvaluationReport, ForecastPipeline,
    ForecastReport, ResourceStatus, TrendPoint,
};
use inference_engine::{ArtifactRegistry, ModelArtifact};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use time_series::{read_csv, CsvOptions, CsvSource};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let level: Level = level
        .parse()
        .with_context(|| format!("unknown log level {:?}", level))?;

    match format {
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_target(true)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .json()
                .with_max_level(level)
                .with_target(true)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    }
    .context("failed to set tracing subscriber")
}

fn csv_options(config: &AppConfig) -> CsvOptions {
    CsvOptions {
        date_column: config.date_column.clone(),
    }
}

/// Register every resource's model artifact.
///
/// A resource whose artifact path is unusable is left out, so it fails alone
/// as an unavailable model.
pub fn build_registry(config: &AppConfig) -> ArtifactRegistry {
    let mut registry = ArtifactRegistry::new();
    for resource in &config.resources {
        match ModelArtifact::from_path(&resource.model_path) {
            Ok(artifact) => registry.register(resource.name.clone(), artifact),
            Err(e) => warn!("Skipping model for {}: {}", resource.name, e),
        }
    }
    registry
}

/// Forecast every configured resource
pub fn run_forecast(config: &AppConfig) -> Result<ForecastReport> {
    let pipeline = ForecastPipeline::new(config.pipeline_config())?;
    let source = CsvSource::new(csv_options(config));
    let registry = build_registry(config);

    info!(
        "Forecasting {} resources {} days ahead",
        config.resources.len(),
        config.horizon_days
    );
    Ok(pipeline.forecast_all(&config.specs(), &source, &registry))
}

/// Forecast table encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

fn output_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(std::io::stdout().lock())),
    }
}

/// Write the forecast table to `path`, or stdout without one
pub fn export_forecast(
    report: &ForecastReport,
    path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer = output_writer(path)?;
    match format {
        OutputFormat::Csv => write_csv(&report.table, &mut writer)?,
        OutputFormat::Json => export_forecast_json(report, &mut writer)?,
    }
    writer.flush().context("flushing forecast output")?;

    if let Some(path) = path {
        info!("Wrote forecast to {}", path.display());
    }
    Ok(())
}

/// Write the forecast table as JSON
pub fn export_forecast_json<W: Write>(report: &ForecastReport, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, &report.table).context("serializing forecast")?;
    Ok(())
}

/// Score every configured resource's model on its history
pub fn run_evaluate(config: &AppConfig) -> Result<EvaluationReport> {
    let pipeline = ForecastPipeline::new(config.pipeline_config())?;
    let source = CsvSource::new(csv_options(config));
    let registry = build_registry(config);
    Ok(pipeline.evaluate_all(&config.specs(), &source, &registry))
}

/// Latest capacity of one resource
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub label: String,
    pub status: ResourceStatus,
}

/// Visit totals per day and per month
#[derive(Debug, Clone, Default)]
pub struct TrendSummary {
    pub column: String,
    pub daily: Vec<TrendPoint>,
    pub monthly: Vec<TrendPoint>,
}

/// Latest status of every resource with a capacity column, plus visit trends
pub fn run_status(config: &AppConfig) -> Result<(Vec<StatusLine>, Option<TrendSummary>)> {
    let options = csv_options(config);
    let mut lines = Vec::new();

    for resource in &config.resources {
        let Some(total_column) = &resource.total_column else {
            continue;
        };
        let status = read_csv(&resource.data_path, &options).and_then(|series| {
            resource_status(
                &series,
                total_column,
                &resource.target_column,
                resource.capacity_rule,
            )
        });
        match status {
            Ok(status) => lines.push(StatusLine {
                label: resource.label.clone(),
                status,
            }),
            Err(e) => warn!("Status for {} unavailable: {}", resource.name, e),
        }
    }

    let trends = match &config.trend {
        Some(trend) => {
            let series = read_csv(&trend.data_path, &options)
                .with_context(|| format!("loading {}", trend.data_path.display()))?;
            Some(TrendSummary {
                column: trend.column.clone(),
                daily: daily_totals(&series, &trend.column)?,
                monthly: monthly_totals(&series, &trend.column)?,
            })
        }
        None => None,
    };

    Ok((lines, trends))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const WINDOW: usize = 30;
    // available_ventilators, day_of_week, 4 lags, 2 rolling mean/std pairs
    const FEATURES: usize = 10;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hospital-forecast-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// 59 days (January and February 2025) of ventilator history
    fn write_history(dir: &Path) -> PathBuf {
        let mut text = String::from("date,available_ventilators,total_ventilators,day_of_week\n");
        let days = (1..=31).map(|d| (1, d)).chain((1..=28).map(|d| (2, d)));
        for (i, (month, day)) in days.enumerate() {
            text.push_str(&format!(
                "2025-{:02}-{:02},{},20,{}\n",
                month,
                day,
                10 + i % 5,
                i % 7
            ));
        }
        let path = dir.join("ventilators.csv");
        std::fs::write(&path, text).unwrap();
        path
    }

    /// Linear artifact repeating the newest target value
    fn write_persistence_model(dir: &Path) -> PathBuf {
        let mut weights = vec![0.0; WINDOW * FEATURES];
        weights[(WINDOW - 1) * FEATURES] = 1.0;
        let json = serde_json::json!({
            "window_length": WINDOW,
            "feature_count": FEATURES,
            "weights": weights,
            "bias": 0.0,
        });
        let path = dir.join("ventilator_model.json");
        std::fs::write(&path, json.to_string()).unwrap();
        path
    }

    fn config(data: &Path, models: &[(&str, &Path)]) -> AppConfig {
        let mut text = format!(
            "[trend]\ndata_path = {:?}\ncolumn = \"total_ventilators\"\n",
            data.display().to_string()
        );
        for (name, model) in models {
            text.push_str(&format!(
                r#"
[[resources]]
name = "{name}"
label = "{name} units"
data_path = {data:?}
model_path = {model:?}
target_column = "available_ventilators"
feature_columns = ["available_ventilators", "day_of_week"]
total_column = "total_ventilators"
"#,
                name = name,
                data = data.display().to_string(),
                model = model.display().to_string(),
            ));
        }
        AppConfig::from_toml(&text).unwrap()
    }

    #[test]
    fn test_build_registry_skips_unknown_format() {
        let config = config(
            Path::new("data/ventilators.csv"),
            &[
                ("ventilator", Path::new("model/ventilator_model.json")),
                ("icu", Path::new("model/icu_model.keras")),
            ],
        );
        let registry = build_registry(&config);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_forecast_isolates_unusable_artifact() {
        let dir = scratch_dir("isolation");
        let data = write_history(&dir);
        let model = write_persistence_model(&dir);
        let config = config(
            &data,
            &[("ventilator", model.as_path()), ("icu", Path::new("model/icu_model.keras"))],
        );

        let report = run_forecast(&config).unwrap();
        assert_eq!(report.forecasts.len(), 1);
        assert!(report.forecast("ventilator").is_some());
        assert!(report.failure("icu").is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_export_forecast_to_path() {
        let dir = scratch_dir("export");
        let data = write_history(&dir);
        let model = write_persistence_model(&dir);
        let report = run_forecast(&config(&data, &[("ventilator", model.as_path())])).unwrap();
        assert!(report.is_complete());

        let csv_path = dir.join("out").join("forecast.csv");
        export_forecast(&report, Some(&csv_path), OutputFormat::Csv).unwrap();
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "date,ventilator units");
        // Last observed day is row 58: 10 + 58 % 5
        assert_eq!(lines[1], "2025-03-01,13.0000");
        assert_eq!(lines[7], "2025-03-07,13.0000");

        let json_path = dir.join("out").join("forecast.json");
        export_forecast(&report, Some(&json_path), OutputFormat::Json).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["labels"][0], "ventilator units");
        assert_eq!(json["dates"].as_array().unwrap().len(), 7);
        assert_eq!(json["dates"][0], "2025-03-01");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_run_status() {
        let dir = scratch_dir("status");
        let data = write_history(&dir);
        let mut config = config(&data, &[("ventilator", Path::new("unused.json"))]);
        let (lines, trends) = run_status(&config).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].status, ResourceStatus { total: 20.0, available: 13.0 });

        let trends = trends.unwrap();
        assert_eq!(trends.daily.len(), 59);
        assert_eq!(trends.monthly.len(), 2);
        assert_eq!(trends.monthly[0].total, 620.0);
        assert_eq!(trends.monthly[1].total, 560.0);

        // A missing source drops that resource's line but keeps the run going
        config.resources[0].data_path = dir.join("missing.csv");
        config.trend = None;
        let (lines, trends) = run_status(&config).unwrap();
        assert!(lines.is_empty());
        assert!(trends.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
