//! Error types for the CLI.

use std::{io, path::PathBuf};

use thiserror::Error;

use sysml_layout::{GraphError, LayoutError};

/// Everything that can stop a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Missing configuration file: {}", .0.display())]
    MissingConfig(PathBuf),

    #[error("Failed to parse TOML configuration: {0}")]
    Config(String),

    #[error("Failed to read graph definition: {0}")]
    Input(serde_json::Error),

    #[error("Unknown diagram kind `{0}`")]
    UnknownDiagram(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Failed to write layout document: {0}")]
    Output(serde_json::Error),
}

impl From<GraphError> for CliError {
    fn from(err: GraphError) -> Self {
        Self::Layout(LayoutError::from(err))
    }
}
