//! jp2rt-models: retention time regression from molecular descriptors.
//!
//! The crate covers the numeric side of the tool: loading headerless
//! descriptor tables, a fixed preprocessing pipeline (all-missing column
//! drop, mean imputation, standard scaling) in front of an ensemble
//! regressor chosen by name, k-fold cross-validation with residual
//! statistics, and a versioned zip archive format for fitted pipelines.
//!
//! Plotly diagnostics are behind the default `plots` feature.
pub mod codec;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod registry;
pub mod report;
pub mod stats;
pub mod version;

pub use config::{EvaluationConfig, RegressorConfig};
pub use error::{LoadError, ManifestError, ModelError};
pub use evaluation::{evaluate, evaluate_model, DiagnosticsRenderer, EvaluationReport};
pub use pipeline::{train, train_with_config, Pipeline, PipelineSpec};
pub use registry::list_models;
