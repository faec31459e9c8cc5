//! Requirements diagrams.
//!
//! Trace links drive a layered layout in which the element being traced to
//! sits above the element tracing to it. Trace cycles are legal: the link that
//! closes a cycle is kept as a feedback edge and drawn as a back-edge curve.

use std::collections::HashMap;

use log::debug;

use sysml_layout_core::model::{DiagramKind, EdgeKind, Graph};

use super::{DiagramEngine, finish_placement};
use crate::{
    config::LayoutConfig,
    document::LayoutDocument,
    error::LayoutError,
    layout::{
        layered::LayeredLayout,
        ports,
        routing::Router,
        scope::{PlacementEdge, ScopeLayout},
    },
};

pub struct Engine {
    config: LayoutConfig,
    layered: LayeredLayout,
    router: Router,
}

impl Engine {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            config: config.clone(),
            layered: LayeredLayout::new(
                config.rank_separation(),
                config.node_spacing(),
                config.layered_crossing_passes(),
            ),
            router: Router::new(
                config.routing_style_for(DiagramKind::Requirements),
                config.corner_radius(),
            ),
        }
    }
}

impl DiagramEngine for Engine {
    fn calculate(&self, graph: &Graph) -> Result<LayoutDocument, LayoutError> {
        let links: Vec<PlacementEdge> = graph
            .edges()
            .iter()
            .filter(|edge| edge.kind() == EdgeKind::TraceLink)
            .map(|edge| PlacementEdge {
                edge: edge.id(),
                from: edge.target(),
                to: edge.source(),
            })
            .collect();
        debug!(links_count = links.len(); "Laying out requirements diagram");

        let placement = ScopeLayout::new(graph, &self.layered).place(&links, &[]);
        Ok(finish_placement(
            graph,
            &self.config,
            placement,
            &self.router,
            ports::distribute,
            &HashMap::new(),
        ))
    }
}
