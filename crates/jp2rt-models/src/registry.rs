//! Catalog of the ensemble regressors that can be selected by name.

use crate::config::RegressorConfig;
use crate::error::{ModelError, Result};

type Factory = fn() -> RegressorConfig;

/// Every ensemble estimator known to the crate. Entries without a factory
/// need constructor arguments (sub-estimators) and are never listed, neither
/// are entries that are not regressors.
const CATALOG: &[(&str, Option<Factory>)] = &[
    ("AdaBoostRegressor", Some(RegressorConfig::ada_boost)),
    ("BaggingRegressor", Some(RegressorConfig::bagging)),
    ("ExtraTreesRegressor", Some(RegressorConfig::extra_trees)),
    ("GradientBoostingRegressor", Some(RegressorConfig::gradient_boosting)),
    (
        "HistGradientBoostingRegressor",
        Some(RegressorConfig::hist_gradient_boosting),
    ),
    ("IsolationForest", None),
    ("RandomForestRegressor", Some(RegressorConfig::random_forest)),
    ("StackingRegressor", None),
    ("VotingRegressor", None),
];

const SUFFIX: &str = "Regressor";

fn available() -> impl Iterator<Item = (&'static str, Factory)> {
    CATALOG.iter().filter_map(|(name, factory)| {
        let family = name.strip_suffix(SUFFIX)?;
        factory.map(|f| (family, f))
    })
}

/// Sorted family names of the regressors that can be built without arguments.
pub fn list_models() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = available().map(|(name, _)| name).collect();
    names.sort_unstable();
    names
}

/// Default configuration of the named family.
pub fn lookup(name: &str) -> Result<RegressorConfig> {
    available()
        .find(|(family, _)| *family == name)
        .map(|(_, factory)| factory())
        .ok_or_else(|| ModelError::InvalidSelection(name.to_string()))
}
