use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: the structure (last field) must not be blank")]
    BlankStructure { line: usize },

    #[error("descriptor engine failed ({}): {stderr}", exit_description(.status))]
    Engine { status: Option<i32>, stderr: String },

    #[error("could not parse descriptor engine output: {0}")]
    Parse(String),

    #[error("no descriptor engine configured; pass --engine or set {0}")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn exit_description(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl DescriptorError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| DescriptorError::Io { path, source }
    }
}

pub type Result<T, E = DescriptorError> = std::result::Result<T, E>;
