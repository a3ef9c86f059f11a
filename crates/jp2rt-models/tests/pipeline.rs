//! Integration tests for training and applying pipelines.

use jp2rt_models::{
    list_models, train, train_with_config, ModelError, PipelineSpec, RegressorConfig,
};
use ndarray::{Array1, Array2};

fn dataset(n: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 5), |(i, j)| match j {
        0 => i as f64 / n as f64,
        1 => ((i * 13) % 7) as f64,
        2 => f64::NAN,
        3 if i % 4 == 0 => f64::NAN,
        3 => (i as f64).ln_1p(),
        _ => 1.0,
    });
    let y = Array1::from_shape_fn(n, |i| 10.0 * i as f64 / n as f64 + ((i * 13) % 7) as f64 * 0.5);
    (x, y)
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

#[test]
fn every_listed_model_trains() {
    let (x, y) = dataset(60);
    let models = list_models();
    assert_eq!(
        models,
        vec![
            "AdaBoost",
            "Bagging",
            "ExtraTrees",
            "GradientBoosting",
            "HistGradientBoosting",
            "RandomForest"
        ]
    );
    for name in models {
        let pipeline = train(name, x.view(), y.view()).unwrap();
        assert_eq!(pipeline.regressor_name(), name);
        let predictions = pipeline.predict(x.view()).unwrap();
        assert_eq!(predictions.len(), 60);
        assert!(predictions.iter().all(|p| p.is_finite()), "{}", name);
    }
}

#[test]
fn unlisted_names_are_rejected() {
    let (x, y) = dataset(10);
    for name in ["Stacking", "Voting", "IsolationForest", "randomforest", ""] {
        assert!(
            matches!(train(name, x.view(), y.view()), Err(ModelError::InvalidSelection(_))),
            "{}",
            name
        );
    }
}

#[test]
fn all_missing_column_is_dropped_but_input_width_kept() {
    let (x, y) = dataset(30);
    let pipeline = train("ExtraTrees", x.view(), y.view()).unwrap();
    assert_eq!(pipeline.dropped_columns(), &[2]);
    assert_eq!(pipeline.n_features_in(), 5);
    assert!(pipeline.predict(x.slice(ndarray::s![..3, ..]).view()).is_ok());
}

#[test]
fn predict_checks_feature_count() {
    let (x, y) = dataset(30);
    let pipeline = train("Bagging", x.view(), y.view()).unwrap();
    match pipeline.predict(Array2::zeros((2, 4)).view()) {
        Err(ModelError::FeatureCountMismatch { expected, found }) => {
            assert_eq!(expected, 5);
            assert_eq!(found, 4);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn missing_values_at_prediction_are_imputed() {
    let (x, y) = dataset(30);
    let pipeline = train("RandomForest", x.view(), y.view()).unwrap();
    let unseen = Array2::from_elem((2, 5), f64::NAN);
    let predictions = pipeline.predict(unseen.view()).unwrap();
    assert!(predictions.iter().all(|p| p.is_finite()));
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn seeded_training_is_reproducible() {
    let (x, y) = dataset(50);
    for config in [
        RegressorConfig::random_forest(),
        RegressorConfig::extra_trees(),
        RegressorConfig::ada_boost(),
        RegressorConfig::hist_gradient_boosting(),
    ] {
        let spec = PipelineSpec::new(config.with_seed(11));
        let a = train_with_config(&spec, x.view(), y.view()).unwrap();
        let b = train_with_config(&spec, x.view(), y.view()).unwrap();
        assert_eq!(
            a.predict(x.view()).unwrap(),
            b.predict(x.view()).unwrap(),
            "{}",
            spec.regressor.family()
        );
    }
}

#[test]
fn refitting_a_spec_leaves_the_original_untouched() {
    let (x, y) = dataset(40);
    let spec = PipelineSpec::new(RegressorConfig::random_forest().with_seed(3));
    let first = spec.fit(x.view(), y.view()).unwrap();
    let before = first.predict(x.view()).unwrap();

    let half = x.slice(ndarray::s![..20, ..]);
    let _second = first.spec().fit(half, y.slice(ndarray::s![..20])).unwrap();
    assert_eq!(first.predict(x.view()).unwrap(), before);
}
