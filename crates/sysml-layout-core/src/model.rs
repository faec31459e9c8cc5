//! Diagram-type-agnostic graph model.
//!
//! This module contains the input side of the layout engine:
//! - [`Node`] - A block, port, activity node, lifeline or requirement
//! - [`Edge`] - A connector, flow, message or trace link between two nodes
//! - [`Graph`] - A validated multigraph tagged with its [`DiagramKind`]
//!
//! Graphs are only obtainable through [`GraphBuilder::build`] (or the
//! deserializable [`GraphDefinition`]), which rejects structurally invalid input.
//! Once built, a graph is never mutated.

mod edge;
mod graph;
mod node;

pub use edge::{Edge, EdgeKind};
pub use graph::{DiagramKind, Graph, GraphBuilder, GraphDefinition};
pub use node::{ActivityKind, Node, NodeKind, SizeHint};
