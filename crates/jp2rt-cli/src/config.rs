use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use jp2rt_models::{registry, EvaluationConfig, PipelineSpec, RegressorConfig};

/// Settings of `estimate-model`, loaded from JSON and overridable from the
/// command line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EstimateConfig {
    /// Hyperparameters replacing the defaults of the selected family. Must
    /// name the same family as the command line.
    pub regressor: Option<RegressorConfig>,
    /// Seeds both the regressor and the cross-validation shuffle.
    pub seed: Option<u64>,
    pub evaluation: EvaluationConfig,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            regressor: None,
            seed: None,
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl EstimateConfig {
    /// Pipeline spec for the family `name`.
    pub fn pipeline_spec(&self, name: &str) -> Result<PipelineSpec> {
        let regressor = match &self.regressor {
            Some(regressor) if regressor.family() != name => bail!(
                "Configuration holds {} parameters but {} was requested",
                regressor.family(),
                name
            ),
            Some(regressor) => regressor.clone(),
            None => registry::lookup(name)?,
        };
        let regressor = match self.seed {
            Some(seed) => regressor.with_seed(seed),
            None => regressor,
        };
        Ok(PipelineSpec::new(regressor))
    }

    /// Evaluation settings with the shared seed applied.
    pub fn evaluation_config(&self) -> EvaluationConfig {
        EvaluationConfig {
            seed: self.evaluation.seed.or(self.seed),
            ..self.evaluation.clone()
        }
    }
}

/// Load an estimation configuration from a JSON file.
pub fn load_estimate_config<P: AsRef<Path>>(path: P) -> Result<EstimateConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: EstimateConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}
