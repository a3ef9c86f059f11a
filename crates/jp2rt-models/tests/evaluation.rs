//! Integration tests for cross-validated evaluation.

use jp2rt_models::evaluation::Figure;
use jp2rt_models::{
    evaluate, evaluate_model, train_with_config, DiagnosticsRenderer, EvaluationConfig,
    ModelError, PipelineSpec, RegressorConfig,
};
use ndarray::{Array1, Array2};

fn dataset(n: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 3), |(i, j)| match j {
        0 => i as f64,
        1 => ((i * 5) % 11) as f64,
        _ => f64::NAN,
    });
    let y = Array1::from_shape_fn(n, |i| 0.5 * i as f64 + ((i * 5) % 11) as f64);
    (x, y)
}

fn seeded(config: RegressorConfig) -> (PipelineSpec, EvaluationConfig) {
    let spec = PipelineSpec::new(config.with_seed(5));
    let evaluation = EvaluationConfig {
        seed: Some(5),
        ..EvaluationConfig::default()
    };
    (spec, evaluation)
}

struct Recording;

impl DiagnosticsRenderer for Recording {
    fn render(&self, d: &jp2rt_models::evaluation::Diagnostics<'_>) -> jp2rt_models::error::Result<Figure> {
        Ok(Figure {
            title: "recorded".to_string(),
            html: format!("{} {} {}", d.y_true.len(), d.band.0, d.band.1),
        })
    }
}

struct Failing;

impl DiagnosticsRenderer for Failing {
    fn render(&self, _: &jp2rt_models::evaluation::Diagnostics<'_>) -> jp2rt_models::error::Result<Figure> {
        Err(ModelError::Render("backend unavailable".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[test]
fn report_covers_every_sample_once() {
    let (x, y) = dataset(53);
    let (spec, config) = seeded(RegressorConfig::random_forest());
    let report = evaluate(&spec, x.view(), y.view(), &config, None).unwrap();

    assert_eq!(report.n_samples, 53);
    assert_eq!(report.r2.len(), 5);
    assert_eq!(report.rmse.len(), 5);
    assert_eq!(report.predictions.len(), 53);
    assert!(report.predictions.iter().all(|p| p.is_finite()));
    for ((t, p), r) in y.iter().zip(&report.predictions).zip(&report.residuals) {
        assert_eq!(*r, t - p);
    }
    assert!(report.figure.is_none());
    assert_eq!(report.regressor, "RandomForest");
}

#[test]
fn quantile_band_lies_within_residuals() {
    let (x, y) = dataset(60);
    let (spec, config) = seeded(RegressorConfig::bagging());
    let report = evaluate(&spec, x.view(), y.view(), &config, None).unwrap();

    let m = report.metrics;
    let lo = report.residuals.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = report.residuals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert!(m.q0 <= m.q1);
    assert!(lo <= m.q0 && m.q1 <= hi);
    assert!(m.rmse_mean >= 0.0 && m.rmse_std >= 0.0 && m.r2_std >= 0.0);
    assert!(m.r2_mean <= 1.0);
}

#[test]
fn table_lists_summary_keys() {
    let (x, y) = dataset(40);
    let (spec, config) = seeded(RegressorConfig::extra_trees());
    let report = evaluate(&spec, x.view(), y.view(), &config, None).unwrap();
    for key in ["r2 mean", "r2 std", "rmse mean", "rmse std", "q0", "q1"] {
        assert!(report.table.contains(key), "missing {}", key);
    }
    assert!(report.table.contains(&format!("{:.4}", report.metrics.q1)));
}

#[test]
fn seeded_evaluation_is_idempotent() {
    let (x, y) = dataset(45);
    let (spec, config) = seeded(RegressorConfig::extra_trees());
    let a = evaluate(&spec, x.view(), y.view(), &config, None).unwrap();
    let b = evaluate(&spec, x.view(), y.view(), &config, None).unwrap();
    assert_eq!(a.predictions, b.predictions);
    assert_eq!(a.metrics, b.metrics);
    assert_eq!(a.table, b.table);
}

#[test]
fn evaluating_a_fitted_pipeline_does_not_touch_it() {
    let (x, y) = dataset(40);
    let (spec, config) = seeded(RegressorConfig::random_forest());
    let pipeline = train_with_config(&spec, x.view(), y.view()).unwrap();
    let before = pipeline.predict(x.view()).unwrap();

    let report = evaluate_model(&pipeline, x.view(), y.view(), &config, None).unwrap();
    let direct = evaluate(&spec, x.view(), y.view(), &config, None).unwrap();
    assert_eq!(report.predictions, direct.predictions);
    assert_eq!(pipeline.predict(x.view()).unwrap(), before);
}

#[test]
fn single_row_folds_leave_r2_undefined() {
    let (x, y) = dataset(6);
    let spec = PipelineSpec::new(RegressorConfig::bagging().with_seed(5));
    let config = EvaluationConfig {
        folds: 6,
        ..EvaluationConfig::default()
    };
    let report = evaluate(&spec, x.view(), y.view(), &config, None).unwrap();

    assert_eq!(report.r2.len(), 6);
    assert!(report.r2.iter().all(|r| r.is_nan()));
    assert!(report.metrics.r2_mean.is_nan());
    assert!(report.rmse.iter().all(|r| r.is_finite() && *r >= 0.0));
    assert!(report.metrics.rmse_mean.is_finite());
}

#[test]
fn fold_without_usable_columns_fails_the_evaluation() {
    // the second half of the rows carries no value in the only column
    let x = Array2::from_shape_fn((10, 1), |(i, _)| if i < 5 { i as f64 } else { f64::NAN });
    let y = Array1::from_shape_fn(10, |i| i as f64);
    let spec = PipelineSpec::new(RegressorConfig::random_forest().with_seed(5));
    let config = EvaluationConfig {
        folds: 2,
        ..EvaluationConfig::default()
    };
    assert!(matches!(
        evaluate(&spec, x.view(), y.view(), &config, None),
        Err(ModelError::Fit(_))
    ));
}

// ---------------------------------------------------------------------------
// Arguments and rendering
// ---------------------------------------------------------------------------

#[test]
fn invalid_arguments_are_rejected() {
    let (x, y) = dataset(8);
    let spec = PipelineSpec::new(RegressorConfig::bagging());
    let too_many = EvaluationConfig {
        folds: 9,
        ..EvaluationConfig::default()
    };
    assert!(matches!(
        evaluate(&spec, x.view(), y.view(), &too_many, None),
        Err(ModelError::InvalidArgument(_))
    ));
    let bad_confidence = EvaluationConfig {
        confidence: 1.5,
        ..EvaluationConfig::default()
    };
    assert!(matches!(
        evaluate(&spec, x.view(), y.view(), &bad_confidence, None),
        Err(ModelError::InvalidArgument(_))
    ));
}

#[test]
fn renderer_receives_diagnostics() {
    let (x, y) = dataset(30);
    let (spec, config) = seeded(RegressorConfig::random_forest());
    let report = evaluate(&spec, x.view(), y.view(), &config, Some(&Recording)).unwrap();
    let figure = report.figure.unwrap();
    assert_eq!(figure.title, "recorded");
    assert_eq!(
        figure.html,
        format!("30 {} {}", report.metrics.q0, report.metrics.q1)
    );
}

#[test]
fn renderer_errors_propagate() {
    let (x, y) = dataset(30);
    let (spec, config) = seeded(RegressorConfig::random_forest());
    assert!(matches!(
        evaluate(&spec, x.view(), y.view(), &config, Some(&Failing)),
        Err(ModelError::Render(_))
    ));
}

#[cfg(feature = "plots")]
#[test]
fn plotly_report_embeds_the_figure() {
    use jp2rt_models::report::html::evaluation_report;
    use jp2rt_models::report::plots::PlotlyRenderer;

    let (x, y) = dataset(30);
    let (spec, config) = seeded(RegressorConfig::random_forest());
    let report = evaluate(&spec, x.view(), y.view(), &config, Some(&PlotlyRenderer::default())).unwrap();
    assert!(report.figure.is_some());

    let page = evaluation_report(&report, "JP2RT", "0.1.0", Some("{\"folds\": 5}"))
        .render()
        .into_string();
    assert!(page.contains("jp2rt-diagnostics"));
    assert!(page.contains("Cross validation"));
    assert!(page.contains("Configuration"));
}
