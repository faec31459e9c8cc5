//! Structural validation errors for the graph model.

use std::fmt;

use thiserror::Error;

use crate::{identifier::Id, model::EdgeKind};

/// Which end of an edge an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// A structural violation detected while constructing a [`Graph`](crate::model::Graph).
///
/// Validation happens exactly once, when the graph is built. A graph that exists
/// has passed every one of these checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("duplicate node id `{0}`")]
    DuplicateNode(Id),

    #[error("duplicate edge id `{0}`")]
    DuplicateEdge(Id),

    #[error("edge `{edge}` references unknown {endpoint} node `{node}`")]
    DanglingEdge {
        edge: Id,
        endpoint: Endpoint,
        node: Id,
    },

    #[error("node `{parent}` lists unknown child `{child}`")]
    UnknownChild { parent: Id, child: Id },

    #[error("node `{node}` is owned by both `{first}` and `{second}`")]
    MultipleOwners { node: Id, first: Id, second: Id },

    #[error("composition cycle: node `{0}` transitively owns itself")]
    CompositionCycle(Id),

    #[error("edge `{edge}` of kind `{kind}` cannot be a self-loop")]
    IllegalSelfLoop { edge: Id, kind: EdgeKind },

    #[error("node `{node}` has an invalid size hint: {reason}")]
    InvalidSizeHint { node: Id, reason: String },
}
