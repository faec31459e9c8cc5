//! Error types for layout operations.
//!
//! Every error is raised before layout computation begins. Once a strategy
//! starts placing nodes it always produces a document; geometric anomalies such
//! as unavoidable edge overlaps are reported as flags on the output instead.

use thiserror::Error;

use sysml_layout_core::{error::GraphError, identifier::Id};

/// The main error type for layout operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("invalid graph: {0}")]
    InvalidGraph(#[from] GraphError),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("invalid sequencing: {0}")]
    InvalidSequencing(#[from] SequencingError),
}

/// An out-of-range or nonsensical [`LayoutConfig`](crate::config::LayoutConfig) value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{key}` must be a finite number, got {value}")]
    NonFinite { key: &'static str, value: f32 },

    #[error("`{key}` must not be negative, got {value}")]
    Negative { key: &'static str, value: f32 },

    #[error("`{key}` must be greater than zero, got {value}")]
    NotPositive { key: &'static str, value: f32 },

    #[error("`{key}` must not be negative, got {value}")]
    NegativeCount { key: &'static str, value: i64 },

    #[error("`{key}` must not exceed {max}, got {value}")]
    AboveCap {
        key: &'static str,
        value: i64,
        max: usize,
    },

    #[error("`routingStyle` must be \"orthogonal\" or \"curved\", got \"{0}\"")]
    UnknownRoutingStyle(String),
}

/// Message ordering that a sequence diagram cannot reconcile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequencingError {
    #[error("message `{edge}` has no sequencing index")]
    MissingIndex { edge: Id },

    #[error(
        "messages `{first}` and `{second}` share index {index} between the same lifelines in opposite directions"
    )]
    ConflictingDirection { index: u32, first: Id, second: Id },
}
