//! SysML Layout - deterministic geometric layout for SysML diagrams.
//!
//! Takes a validated [`model::Graph`] and produces an immutable
//! [`document::LayoutDocument`]: node rectangles, routed edges and ordering
//! metadata that any rendering backend can draw. Block definition, internal
//! block, activity, sequence and requirements diagrams each have their own
//! strategy, selected by the graph's diagram kind.
//!
//! # Examples
//!
//! ```
//! use sysml_layout::{
//!     LayoutBuilder,
//!     config::LayoutConfig,
//!     model::{DiagramKind, Edge, EdgeKind, GraphBuilder, Node, NodeKind},
//! };
//!
//! let graph = GraphBuilder::new(DiagramKind::Bdd)
//!     .node(Node::new("Vehicle", NodeKind::Block))
//!     .node(Node::new("Car", NodeKind::Block))
//!     .edge(Edge::new("g", EdgeKind::Generalization, "Car", "Vehicle"))
//!     .build()?;
//!
//! let document = LayoutBuilder::new(LayoutConfig::default()).layout(&graph)?;
//! assert_eq!(document.nodes().len(), 2);
//! assert_eq!(document.ordering().rank_of("Vehicle".into()), Some(0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod document;

mod error;
mod layout;

pub use sysml_layout_core::{error::GraphError, geometry, identifier, model};

pub use error::{ConfigError, LayoutError, SequencingError};
pub use layout::engines::DiagramEngine;

use log::{debug, info};

use config::LayoutConfig;
use document::LayoutDocument;
use layout::engines::EngineBuilder;
use model::Graph;

/// Entry point for laying out diagrams with one configuration.
#[derive(Debug, Clone, Default)]
pub struct LayoutBuilder {
    config: LayoutConfig,
}

impl LayoutBuilder {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out a graph with the strategy for its diagram kind.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidConfiguration`] when an option is out of
    /// range, and [`LayoutError::InvalidSequencing`] when a sequence diagram's
    /// message indices cannot be reconciled. Both are detected before any
    /// placement work starts.
    pub fn layout(&self, graph: &Graph) -> Result<LayoutDocument, LayoutError> {
        self.config.validate()?;

        info!(
            diagram:% = graph.diagram(),
            nodes_count = graph.nodes_count(),
            edges_count = graph.edges_count();
            "Laying out diagram"
        );

        let mut engines = EngineBuilder::new(self.config.clone());
        let document = engines.engine(graph.diagram()).calculate(graph)?;

        debug!(
            width = document.bounds().width(),
            height = document.bounds().height();
            "Layout finished"
        );
        Ok(document)
    }
}

/// Lays out `graph` with `config`.
///
/// # Errors
///
/// See [`LayoutBuilder::layout`].
pub fn layout(graph: &Graph, config: &LayoutConfig) -> Result<LayoutDocument, LayoutError> {
    LayoutBuilder::new(config.clone()).layout(graph)
}
