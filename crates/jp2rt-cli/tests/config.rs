//! Integration tests for the estimate-model configuration.

use jp2rt_cli::config::{load_estimate_config, EstimateConfig};
use jp2rt_models::RegressorConfig;

// ---------------------------------------------------------------------------
// EstimateConfig defaults & serialization
// ---------------------------------------------------------------------------

#[test]
fn estimate_config_default_values() {
    let cfg = EstimateConfig::default();
    assert!(cfg.regressor.is_none());
    assert!(cfg.seed.is_none());
    assert_eq!(cfg.evaluation.folds, 5);
    assert!((cfg.evaluation.confidence - 0.95).abs() < 1e-12);
}

#[test]
fn partial_json_keeps_defaults() {
    let cfg: EstimateConfig = serde_json::from_str(r#"{"evaluation": {"folds": 10}}"#).unwrap();
    assert_eq!(cfg.evaluation.folds, 10);
    assert!((cfg.evaluation.confidence - 0.95).abs() < 1e-12);
    assert!(cfg.regressor.is_none());
}

#[test]
fn estimate_config_round_trips_json() {
    let cfg = EstimateConfig {
        regressor: Some(RegressorConfig::extra_trees()),
        seed: Some(3),
        ..EstimateConfig::default()
    };
    let json = serde_json::to_string_pretty(&cfg).unwrap();
    assert!(json.contains("ExtraTrees"));
    let cfg2: EstimateConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, cfg2);
}

#[test]
fn estimate_config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("estimate.json");
    std::fs::write(
        &path,
        r#"{"regressor": {"RandomForest": {"n_estimators": 20}}, "seed": 9}"#,
    )
    .unwrap();

    let cfg = load_estimate_config(&path).unwrap();
    match cfg.regressor {
        Some(RegressorConfig::RandomForest(ref params)) => {
            assert_eq!(params.n_estimators, 20);
            assert_eq!(params.min_samples_leaf, 1);
        }
        ref other => panic!("unexpected regressor: {:?}", other),
    }
    assert_eq!(cfg.seed, Some(9));
}

#[test]
fn load_errors_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    let err = load_estimate_config(&missing).unwrap_err();
    assert!(format!("{}", err).contains("Failed to read config"));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    let err = load_estimate_config(&broken).unwrap_err();
    assert!(format!("{}", err).contains("Failed to parse config"));
}

// ---------------------------------------------------------------------------
// Applying the configuration
// ---------------------------------------------------------------------------

#[test]
fn pipeline_spec_uses_registry_defaults() {
    let spec = EstimateConfig::default().pipeline_spec("Bagging").unwrap();
    assert_eq!(spec.regressor, RegressorConfig::bagging());
    assert!(EstimateConfig::default().pipeline_spec("Stacking").is_err());
}

#[test]
fn pipeline_spec_rejects_family_mismatch() {
    let cfg = EstimateConfig {
        regressor: Some(RegressorConfig::ada_boost()),
        ..EstimateConfig::default()
    };
    assert!(cfg.pipeline_spec("RandomForest").is_err());
    assert!(cfg.pipeline_spec("AdaBoost").is_ok());
}

#[test]
fn seed_reaches_regressor_and_folds() {
    let cfg = EstimateConfig {
        seed: Some(42),
        ..EstimateConfig::default()
    };
    let spec = cfg.pipeline_spec("RandomForest").unwrap();
    assert_eq!(spec.regressor, RegressorConfig::random_forest().with_seed(42));
    assert_eq!(cfg.evaluation_config().seed, Some(42));

    let mut explicit = cfg.clone();
    explicit.evaluation.seed = Some(1);
    assert_eq!(explicit.evaluation_config().seed, Some(1));
}
