//! Activity diagrams.
//!
//! Flow edges drive a layered layout from top to bottom. The targets of a
//! decision or merge keep the declaration order of its outgoing flows within their rank,
//! and the flows leave the diamond from left to right in the same
//! order. Nodes sharing a lane are packed into one vertical swimlane.

use std::collections::HashMap;

use log::debug;

use sysml_layout_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    model::{ActivityKind, DiagramKind, Edge, EdgeKind, Graph},
};

use super::{DiagramEngine, finish_placement};
use crate::{
    config::LayoutConfig,
    document::LayoutDocument,
    error::LayoutError,
    layout::{
        layered::LayeredLayout,
        ports,
        routing::Router,
        scope::{Placement, PlacementEdge, ScopeLayout},
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
                config.routing_style_for(DiagramKind::Activity),
                config.corner_radius(),
            ),
        }
    }
}

/// Decision and merge diamonds keep their outgoing flows in declaration order.
fn is_branching(graph: &Graph, id: Id) -> bool {
    graph
        .node(id)
        .and_then(|node| node.activity_kind())
        .is_some_and(|kind| matches!(kind, ActivityKind::Decision | ActivityKind::Merge))
}

/// Outgoing flows of a node in declaration order, self-loops excluded.
fn outgoing_flows(graph: &Graph, id: Id) -> impl Iterator<Item = &Edge> {
    graph.edges().iter().filter(move |edge| {
        edge.kind() == EdgeKind::Flow && edge.source() == id && !edge.is_self_loop()
    })
}

/// A point on the lower half of a diamond's outline, from its left corner
/// (`t = 0`) through its bottom corner (`t = 0.5`) to its right corner (`t = 1`).
fn diamond_exit(bounds: Bounds, t: f32) -> Point {
    let center = bounds.center();
    let left = Point::new(bounds.min_x(), center.y());
    let bottom = Point::new(center.x(), bounds.max_y());
    let right = Point::new(bounds.max_x(), center.y());
    if t <= 0.5 {
        left.add_point(bottom.sub_point(left).scale(t * 2.0))
    } else {
        bottom.add_point(right.sub_point(bottom).scale((t - 0.5) * 2.0))
    }
}

/// Exit points for the forward outgoing flows of every decision or merge.
fn decision_exits(graph: &Graph, placement: &Placement) -> HashMap<Id, Point> {
    let mut exits = HashMap::new();
    for node in graph.nodes().filter(|node| is_branching(graph, node.id())) {
        let Some(bounds) = placement.bounds().get(&node.id()).copied() else {
            continue;
        };
        let forward: Vec<Id> = outgoing_flows(graph, node.id())
            .filter(|edge| !placement.feedback().contains(&edge.id()))
            .map(Edge::id)
            .collect();
        let count = forward.len();
        for (i, edge) in forward.into_iter().enumerate() {
            let t = (i + 1) as f32 / (count + 1) as f32;
            exits.insert(edge, diamond_exit(bounds, t));
        }
    }
    exits
}

impl DiagramEngine for Engine {
    fn calculate(&self, graph: &Graph) -> Result<LayoutDocument, LayoutError> {
        let flows: Vec<PlacementEdge> = graph
            .edges()
            .iter()
            .filter(|edge| edge.kind() == EdgeKind::Flow)
            .map(|edge| PlacementEdge {
                edge: edge.id(),
                from: edge.source(),
                to: edge.target(),
            })
            .collect();
        let fixed_groups: Vec<Vec<Id>> = graph
            .nodes()
            .filter(|node| is_branching(graph, node.id()))
            .map(|node| outgoing_flows(graph, node.id()).map(Edge::target).collect())
            .collect();
        debug!(
            flows_count = flows.len(),
            decisions_count = fixed_groups.len();
            "Laying out activity diagram"
        );

        let placement = ScopeLayout::new(graph, &self.layered).place(&flows, &fixed_groups);
        let exits = decision_exits(graph, &placement);
        Ok(finish_placement(
            graph,
            &self.config,
            placement,
            &self.router,
            ports::distribute,
            &exits,
        ))
    }
}
