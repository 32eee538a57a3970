use chrono::NaiveDate;
use forecaster::{
    to_csv_string, FailureKind, ForecastPipeline, PipelineConfig, ResourceSpec,
};
use inference_engine::{
    ArtifactRegistry, FnModel, InferenceError, InputShape, ModelArtifact, ModelProvider,
    PredictiveModel, StaticRegistry,
};
use std::collections::HashMap;
use std::sync::Arc;
use time_series::{read_csv_from, CsvOptions, Observation, RawSeries};
use window_builder::Window;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
}

fn bed_series(rows: usize) -> RawSeries {
    let observations = start()
        .iter_days()
        .take(rows)
        .enumerate()
        .map(|(i, date)| {
            let icu = 8.0 + (i % 4) as f64;
            let general = 60.0 + (i % 9) as f64;
            let weekday = (i % 7) as f64;
            Observation::new(date, vec![icu, general, 120.0 + i as f64, weekday])
        })
        .collect();

    RawSeries::from_observations(
        vec![
            "icu_available".to_string(),
            "general_available".to_string(),
            "er_visits".to_string(),
            "day_of_week".to_string(),
        ],
        observations,
    )
    .unwrap()
}

fn spec(name: &str, label: &str, target: &str) -> ResourceSpec {
    ResourceSpec {
        name: name.to_string(),
        label: label.to_string(),
        source: "beds".to_string(),
        target_column: target.to_string(),
        feature_columns: vec![target.to_string(), "day_of_week".to_string()],
    }
}

fn persistence() -> FnModel<impl Fn(&Window) -> f64> {
    FnModel::new(|w: &Window| w.last_row()[0])
}

/// Model whose artifact loads but fails on every call
struct BrokenModel;

impl PredictiveModel for BrokenModel {
    fn predict(&self, _window: &Window) -> Result<f64, InferenceError> {
        Err(InferenceError::InferenceFailed("corrupt weights".to_string()))
    }
}

#[test]
fn test_broken_model_is_isolated() {
    let mut sources = HashMap::new();
    sources.insert("beds".to_string(), bed_series(80));

    let mut models = StaticRegistry::new();
    models.register("icu", persistence());
    models.register("general", BrokenModel);
    models.register("er", persistence());

    let specs = vec![
        spec("icu", "ICU Beds", "icu_available"),
        spec("general", "General Beds", "general_available"),
        ResourceSpec {
            feature_columns: vec!["er_visits".to_string(), "day_of_week".to_string()],
            ..spec("er", "ER Visits", "er_visits")
        },
    ];

    let pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let report = pipeline.forecast_all(&specs, &sources, &models);

    assert!(!report.is_complete());
    assert_eq!(report.forecasts.len(), 2);
    assert_eq!(report.failures.len(), 1);

    let failure = report.failure("general").unwrap();
    assert_eq!(failure.kind(), FailureKind::Prediction);

    // Survivors are unaffected and no rows exist for the failed resource
    assert_eq!(report.forecast("icu").unwrap().series.len(), 7);
    assert_eq!(report.forecast("er").unwrap().series.len(), 7);
    assert_eq!(report.table.labels(), &["ICU Beds".to_string(), "ER Visits".to_string()]);
    assert_eq!(report.table.len(), 7);

    let csv = to_csv_string(&report.table).unwrap();
    assert!(csv.starts_with("date,ICU Beds,ER Visits"));
}

#[test]
fn test_missing_artifact_is_isolated() {
    let mut sources = HashMap::new();
    sources.insert("beds".to_string(), bed_series(60));

    let mut models = ArtifactRegistry::new();
    models.register(
        "general",
        ModelArtifact::from_path("/nonexistent/general_model.onnx").unwrap(),
    );

    let specs = vec![
        spec("icu", "ICU Beds", "icu_available"),
        spec("general", "General Beds", "general_available"),
    ];

    let pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let report = pipeline.forecast_all(&specs, &sources, &models);

    assert!(report.forecasts.is_empty());
    assert_eq!(report.failures.len(), 2);
    for failure in &report.failures {
        assert_eq!(failure.kind(), FailureKind::ModelUnavailable);
    }
    assert!(report.table.is_empty());
}

#[test]
fn test_missing_column_is_isolated() {
    let mut sources = HashMap::new();
    sources.insert("beds".to_string(), bed_series(60));

    let mut models = StaticRegistry::new();
    models.register("icu", persistence());
    models.register("vent", persistence());

    let specs = vec![
        spec("vent", "Ventilators", "available_ventilators"),
        spec("icu", "ICU Beds", "icu_available"),
    ];

    let pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let report = pipeline.forecast_all(&specs, &sources, &models);

    assert_eq!(report.failure("vent").unwrap().kind(), FailureKind::MissingColumn);
    assert!(report.forecast("icu").is_some());
}

#[test]
fn test_constant_series_round_trips_to_constant() {
    // 45 days of a constant target: 31 feature rows after warm-up
    let observations = start()
        .iter_days()
        .take(45)
        .enumerate()
        .map(|(i, date)| Observation::new(date, vec![100.0, (i % 7) as f64]))
        .collect();
    let series = RawSeries::from_observations(
        vec!["available_nurses".to_string(), "day_of_week".to_string()],
        observations,
    )
    .unwrap();

    let mut sources = HashMap::new();
    sources.insert("staff".to_string(), series);

    let mut models = StaticRegistry::new();
    models.register("nurse", persistence());

    let nurse = ResourceSpec {
        name: "nurse".to_string(),
        label: "Nurses".to_string(),
        source: "staff".to_string(),
        target_column: "available_nurses".to_string(),
        feature_columns: vec!["available_nurses".to_string(), "day_of_week".to_string()],
    };

    let pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let forecast = pipeline.forecast_resource(&nurse, &sources, &models).unwrap();

    let last = start().iter_days().nth(44).unwrap();
    assert_eq!(forecast.last_observed, last);
    assert!(forecast.scaler.degenerate_columns().contains(&"available_nurses"));

    let points = forecast.series.points();
    assert_eq!(points.len(), 7);
    for (offset, point) in points.iter().enumerate() {
        assert_eq!(point.date, last.iter_days().nth(offset + 1).unwrap());
        assert!((point.value - 100.0).abs() < 1e-9, "got {}", point.value);
    }
}

#[test]
fn test_rollout_length_follows_horizon() {
    let mut sources = HashMap::new();
    sources.insert("beds".to_string(), bed_series(50));

    let mut models = StaticRegistry::new();
    models.register("icu", persistence());

    for horizon in [0usize, 1, 14] {
        let config = PipelineConfig {
            horizon_days: horizon,
            ..PipelineConfig::default()
        };
        let pipeline = ForecastPipeline::new(config).unwrap();
        let forecast = pipeline
            .forecast_resource(&spec("icu", "ICU Beds", "icu_available"), &sources, &models)
            .unwrap();
        assert_eq!(forecast.series.len(), horizon);

        let dates: Vec<NaiveDate> = forecast.series.points().iter().map(|p| p.date).collect();
        let expected: Vec<NaiveDate> = forecast
            .last_observed
            .iter_days()
            .skip(1)
            .take(horizon)
            .collect();
        assert_eq!(dates, expected);
    }
}

#[test]
fn test_shape_mismatch_reported_as_model_unavailable() {
    /// Provider that always hands back a model built for another feature set
    struct Stale;

    impl ModelProvider for Stale {
        fn model_for(
            &self,
            _resource: &str,
            shape: InputShape,
        ) -> Result<Arc<dyn PredictiveModel>, InferenceError> {
            Err(InferenceError::InvalidInputShape {
                expected: "[30 x 4]".to_string(),
                actual: shape.to_string(),
            })
        }
    }

    let mut sources = HashMap::new();
    sources.insert("beds".to_string(), bed_series(60));

    let pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let err = pipeline
        .forecast_resource(&spec("icu", "ICU Beds", "icu_available"), &sources, &Stale)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::ModelUnavailable);
}

#[test]
fn test_csv_input_end_to_end() {
    let mut text = String::from("date,available_doctors,holiday_flag\n");
    for (i, date) in start().iter_days().take(50).enumerate() {
        text.push_str(&format!("{},{},{}\n", date, 20 + i % 3, i % 2 == 0));
    }
    // An unparsable row is skipped
    text.push_str("not-a-date,19,false\n");

    let series = read_csv_from(text.as_bytes(), &CsvOptions::default()).unwrap();
    assert_eq!(series.len(), 50);

    let mut sources = HashMap::new();
    sources.insert("staff".to_string(), series);

    let mut models = StaticRegistry::new();
    models.register("doctor", persistence());

    let doctor = ResourceSpec {
        name: "doctor".to_string(),
        label: "Doctors".to_string(),
        source: "staff".to_string(),
        target_column: "available_doctors".to_string(),
        feature_columns: vec!["available_doctors".to_string(), "holiday_flag".to_string()],
    };

    let pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let evaluation = pipeline.evaluate_all(&[doctor.clone()], &sources, &models);
    assert_eq!(evaluation.evaluations.len(), 1);
    // 50 rows - 14 warm-up = 36 rows, 6 windows
    assert_eq!(evaluation.evaluations[0].metrics.samples, 6);

    let report = pipeline.forecast_all(&[doctor], &sources, &models);
    assert!(report.is_complete());
    // Day 49: 20 + 49 % 3
    for value in report.forecast("doctor").unwrap().series.values() {
        assert!((value - 21.0).abs() < 1e-9);
    }
}
