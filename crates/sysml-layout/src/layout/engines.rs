//! Diagram layout strategies.
//!
//! Each diagram kind has one [`DiagramEngine`]. The strategies share the
//! generic placement modes, port anchoring and edge routing; they differ in
//! which edges drive placement and how the result is post-processed.
//!
//! [`EngineBuilder`] picks the engine for a diagram kind and configures it from
//! a [`LayoutConfig`]. Engines are created on first use and cached.

mod activity;
mod bdd;
mod ibd;
mod requirements;
mod sequence;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{trace, warn};

use sysml_layout_core::{
    geometry::{Bounds, Point},
    identifier::Id,
    model::{DiagramKind, Graph},
};

use super::{
    ports::PortRequest,
    routing::{RouteOptions, Router},
    scope::Placement,
};
use crate::{
    config::LayoutConfig,
    document::{DocumentBuilder, LayoutDocument, OrderingMetadata, PlacedNode, RoutedEdge},
    error::LayoutError,
};

/// Computes the layout of one diagram kind.
pub trait DiagramEngine {
    /// Lays out a validated graph.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] when the graph violates a rule of this diagram
    /// kind that construction could not check.
    fn calculate(&self, graph: &Graph) -> Result<LayoutDocument, LayoutError>;
}

/// Builder for configured layout engines.
pub struct EngineBuilder {
    engines: HashMap<DiagramKind, Box<dyn DiagramEngine>>,
    config: LayoutConfig,
}

impl EngineBuilder {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            engines: HashMap::new(),
            config,
        }
    }

    /// The engine for a diagram kind, configured from this builder's options.
    pub fn engine(&mut self, diagram: DiagramKind) -> &dyn DiagramEngine {
        let config = &self.config;
        let engine = self.engines.entry(diagram).or_insert_with(|| {
            trace!(diagram:% = diagram; "Creating layout engine");
            let engine: Box<dyn DiagramEngine> = match diagram {
                DiagramKind::Bdd => Box::new(bdd::Engine::new(config)),
                DiagramKind::Ibd => Box::new(ibd::Engine::new(config)),
                DiagramKind::Activity => Box::new(activity::Engine::new(config)),
                DiagramKind::Sequence => Box::new(sequence::Engine::new(config)),
                DiagramKind::Requirements => Box::new(requirements::Engine::new(config)),
            };
            engine
        });
        &**engine
    }
}

/// Anchors every owned port on its owner's rectangle and adds it to `boxes`.
///
/// A port faces the far endpoint of its first edge. When that endpoint is
/// itself an owned port, its owner's rectangle stands in for it.
fn anchor_ports(
    graph: &Graph,
    boxes: &mut IndexMap<Id, Bounds>,
    anchor: fn(Bounds, &[PortRequest]) -> Vec<(Id, Bounds)>,
) {
    let owners: Vec<Id> = boxes.keys().copied().collect();
    for owner in owners {
        let Some(owner_bounds) = boxes.get(&owner).copied() else {
            continue;
        };
        let requests: Vec<PortRequest> = graph
            .ports_of(owner)
            .map(|port| PortRequest {
                port: port.id(),
                toward: far_endpoint(graph, boxes, port.id()),
            })
            .collect();
        if requests.is_empty() {
            continue;
        }
        for (port, bounds) in anchor(owner_bounds, &requests) {
            boxes.insert(port, bounds);
        }
    }
}

fn far_endpoint(graph: &Graph, boxes: &IndexMap<Id, Bounds>, port: Id) -> Option<Point> {
    let edge = graph
        .incident_edges(port)
        .find(|edge| !edge.is_self_loop())?;
    let other = if edge.source() == port {
        edge.target()
    } else {
        edge.source()
    };
    boxes
        .get(&other)
        .or_else(|| graph.owner(other).and_then(|owner| boxes.get(&owner)))
        .map(|bounds| bounds.center())
}

/// Rectangles an edge must avoid: everything except its endpoints, their
/// ancestors and descendants, and owned ports.
fn obstacles(graph: &Graph, boxes: &IndexMap<Id, Bounds>, source: Id, target: Id) -> Vec<Bounds> {
    boxes
        .iter()
        .filter(|(id, _)| {
            let id = **id;
            let owned_port = graph
                .node(id)
                .is_some_and(|node| node.kind().is_port() && graph.owner(id).is_some());
            !owned_port
                && id != source
                && id != target
                && !graph.is_ancestor(id, source)
                && !graph.is_ancestor(id, target)
                && !graph.is_ancestor(source, id)
                && !graph.is_ancestor(target, id)
        })
        .map(|(_, bounds)| *bounds)
        .collect()
}

/// Routes every edge of the graph between its endpoints' rectangles.
fn route_edges(
    graph: &Graph,
    boxes: &IndexMap<Id, Bounds>,
    router: &Router,
    feedback: &HashSet<Id>,
    exits: &HashMap<Id, Point>,
) -> Vec<RoutedEdge> {
    let mut routed = Vec::with_capacity(graph.edges_count());
    for edge in graph.edges() {
        let (Some(source), Some(target)) = (boxes.get(&edge.source()), boxes.get(&edge.target()))
        else {
            warn!(edge:% = edge.id(); "Edge endpoint was not placed, skipping");
            continue;
        };
        let avoid = obstacles(graph, boxes, edge.source(), edge.target());

        let route = if edge.is_self_loop() {
            router.self_loop(*source, &avoid)
        } else {
            router.route(
                *source,
                *target,
                &avoid,
                RouteOptions {
                    feedback: feedback.contains(&edge.id()),
                    exit: exits.get(&edge.id()).copied(),
                },
            )
        };
        if route.overlap {
            trace!(edge:% = edge.id(); "Route overlaps a node");
        }

        routed.push(
            RoutedEdge::new(edge, route.path)
                .with_feedback(feedback.contains(&edge.id()))
                .with_overlap(route.overlap),
        );
    }
    routed
}

/// Freezes placed rectangles and routed edges into a document, nodes in graph order.
fn build_document(
    graph: &Graph,
    config: &LayoutConfig,
    boxes: &IndexMap<Id, Bounds>,
    containers: &HashSet<Id>,
    edges: Vec<RoutedEdge>,
    ordering: OrderingMetadata,
) -> LayoutDocument {
    let mut builder = DocumentBuilder::new(graph.diagram(), config.margin());
    for node in graph.nodes() {
        let Some(bounds) = boxes.get(&node.id()) else {
            continue;
        };
        let placed = PlacedNode::new(
            node,
            *bounds,
            graph.owner(node.id()),
            graph.depth(node.id()),
        );
        builder.add_node(if containers.contains(&node.id()) {
            placed.into_container()
        } else {
            placed
        });
    }
    for edge in edges {
        builder.add_edge(edge);
    }
    builder.set_ordering(ordering);
    builder.build()
}

/// The common tail of the block-style strategies: anchor ports, route, freeze.
fn finish_placement(
    graph: &Graph,
    config: &LayoutConfig,
    placement: Placement,
    router: &Router,
    anchor: fn(Bounds, &[PortRequest]) -> Vec<(Id, Bounds)>,
    exits: &HashMap<Id, Point>,
) -> LayoutDocument {
    let ordering = OrderingMetadata::default()
        .with_ranks(placement.ranks().to_vec())
        .with_lanes(placement.lanes().to_vec());
    let containers = placement.containers().clone();
    let feedback = placement.feedback().clone();

    let mut boxes = placement.into_bounds();
    anchor_ports(graph, &mut boxes, anchor);
    let edges = route_edges(graph, &boxes, router, &feedback, exits);
    build_document(graph, config, &boxes, &containers, edges, ordering)
}
