use std::path::PathBuf;

use thiserror::Error;

use crate::version::Version;

/// Errors raised while reading tab separated descriptor files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{0} contains no rows")]
    Empty(PathBuf),
    #[error("no trailing numeric descriptor columns found on the first line of {0}")]
    NoDescriptors(PathBuf),
    #[error("line {line} has {found} fields, expected {expected} as on the first line")]
    InconsistentRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("{source_rows} input rows but {predictions} predictions")]
    RowCountMismatch {
        source_rows: usize,
        predictions: usize,
    },
}

/// Reasons a model archive manifest is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ManifestError {
    #[error("manifest missing Manifest-Version")]
    MissingManifestVersion,
    #[error("manifest version too high ({found} > {supported})")]
    ManifestVersionTooHigh { found: Version, supported: Version },
    #[error("manifest missing {0}")]
    MissingToolVersion(String),
    #[error("tool version too high ({found} > {supported})")]
    ToolVersionTooHigh { found: Version, supported: Version },
    #[error("unparseable version for {key}: '{value}'")]
    UnparseableVersion { key: String, value: String },
    #[error("malformed manifest line: '{0}'")]
    MalformedLine(String),
    #[error("archive has no entry named {0}")]
    MissingEntry(String),
}

/// Errors raised by training, evaluation and persistence of models.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid regressor name: {0}")]
    InvalidSelection(String),
    #[error("invalid model file, {0}")]
    InvalidModel(#[from] ManifestError),
    #[error("fit failed: {0}")]
    Fit(String),
    #[error("expected {expected} features, got {found}")]
    FeatureCountMismatch { expected: usize, found: usize },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("diagnostics rendering failed: {0}")]
    Render(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("model (de)serialization failed: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
