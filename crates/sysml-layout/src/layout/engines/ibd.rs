//! Internal block diagrams.
//!
//! The parts of each block are placed with the force-directed mode, with
//! connectors acting as springs between the parts they join. Ports are then
//! snapped to the boundary point of their owner closest to the far end of
//! their first connector.

use std::collections::HashMap;

use log::debug;

use sysml_layout_core::model::{DiagramKind, Graph};

use super::{DiagramEngine, finish_placement};
use crate::{
    config::LayoutConfig,
    document::LayoutDocument,
    error::LayoutError,
    layout::{
        force::ForceLayout,
        ports,
        routing::Router,
        scope::{PlacementEdge, ScopeLayout},
    },
};

pub struct Engine {
    config: LayoutConfig,
    force: ForceLayout,
    router: Router,
}

impl Engine {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            config: config.clone(),
            force: ForceLayout::new(config.force_iterations(), config.node_spacing()),
            router: Router::new(
                config.routing_style_for(DiagramKind::Ibd),
                config.corner_radius(),
            ),
        }
    }
}

impl DiagramEngine for Engine {
    fn calculate(&self, graph: &Graph) -> Result<LayoutDocument, LayoutError> {
        let springs: Vec<PlacementEdge> = graph
            .edges()
            .iter()
            .filter(|edge| !edge.is_self_loop())
            .map(|edge| PlacementEdge {
                edge: edge.id(),
                from: edge.source(),
                to: edge.target(),
            })
            .collect();
        debug!(springs_count = springs.len(); "Laying out internal block diagram");

        let placement = ScopeLayout::new(graph, &self.force).place(&springs, &[]);
        Ok(finish_placement(
            graph,
            &self.config,
            placement,
            &self.router,
            ports::snap,
            &HashMap::new(),
        ))
    }
}
