//! Hospital Resource Forecast - Main Entry Point

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{
    export_forecast, init_logging, run_evaluate, run_forecast, run_status, AppConfig, OutputFormat,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "hospital-forecast")]
#[command(about = "Short-horizon hospital resource forecasting", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, default_value = "config/forecast.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every configured resource
    Forecast {
        /// Number of days to forecast (overrides the configuration)
        #[arg(long)]
        horizon: Option<usize>,

        /// Output file (overrides the configuration; stdout when neither is set)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// Score each model on its historical windows
    Evaluate,

    /// Show latest resource capacity and visit trends
    Status {
        /// Daily trend rows to show
        #[arg(long, default_value = "14")]
        days: usize,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;
    init_logging(&config.log_level, config.log_format)?;

    info!("=== Hospital Forecast v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Forecast {
            horizon,
            output,
            format,
        } => {
            if let Some(horizon) = horizon {
                config.horizon_days = horizon;
            }
            let report = run_forecast(&config)?;

            export_forecast(
                &report,
                output.as_deref().or(config.output_path.as_deref()),
                format,
            )?;

            for failure in &report.failures {
                eprintln!(
                    "forecast for {} failed [{:?}]: {}",
                    failure.resource,
                    failure.kind(),
                    failure.error
                );
            }
            if report.forecasts.is_empty() && !report.failures.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Evaluate => {
            let report = run_evaluate(&config)?;
            for evaluation in &report.evaluations {
                println!(
                    "{:<12} {:<24} R2: {:>6.2}  MAE: {:>6.3}  RMSE: {:>6.3}  ({} windows)",
                    evaluation.resource,
                    evaluation.target_column,
                    evaluation.metrics.r2,
                    evaluation.metrics.mae,
                    evaluation.metrics.rmse,
                    evaluation.metrics.samples
                );
            }
            for failure in &report.failures {
                eprintln!(
                    "evaluation for {} failed [{:?}]: {}",
                    failure.resource,
                    failure.kind(),
                    failure.error
                );
            }
        }
        Commands::Status { days } => {
            let (lines, trends) = run_status(&config)?;
            for line in &lines {
                println!(
                    "{:<16} {:>6.0} / {:>6.0} available",
                    line.label, line.status.available, line.status.total
                );
            }
            if let Some(trends) = trends {
                println!("\n{} per month", trends.column);
                for point in &trends.monthly {
                    println!("{}  {:>10.0}", point.period.format("%Y-%m"), point.total);
                }
                println!("\n{} per day (last {})", trends.column, days);
                let skip = trends.daily.len().saturating_sub(days);
                for point in trends.daily.iter().skip(skip) {
                    println!("{}  {:>10.0}", point.period, point.total);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
