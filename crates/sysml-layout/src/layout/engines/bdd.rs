//! Block definition diagrams.
//!
//! Composition and generalization edges drive a layered layout: the whole sits
//! above its parts and the general block above its specializations. Plain
//! connectors are routed but do not influence ranks. Ports are spread evenly
//! along the side of their owner facing their first connection.

use std::collections::HashMap;

use log::debug;

use sysml_layout_core::model::{DiagramKind, Edge, EdgeKind, Graph};

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
                config.routing_style_for(DiagramKind::Bdd),
                config.corner_radius(),
            ),
        }
    }
}

/// The ranking direction of a structural edge: upper node first.
fn ranking_edge(edge: &Edge) -> Option<PlacementEdge> {
    let (from, to) = match edge.kind() {
        EdgeKind::Composition => (edge.source(), edge.target()),
        EdgeKind::Generalization => (edge.target(), edge.source()),
        _ => return None,
    };
    Some(PlacementEdge {
        edge: edge.id(),
        from,
        to,
    })
}

impl DiagramEngine for Engine {
    fn calculate(&self, graph: &Graph) -> Result<LayoutDocument, LayoutError> {
        let edges: Vec<PlacementEdge> = graph.edges().iter().filter_map(ranking_edge).collect();
        debug!(ranking_edges = edges.len(); "Laying out block definition diagram");

        let placement = ScopeLayout::new(graph, &self.layered).place(&edges, &[]);
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

#[cfg(test)]
mod tests {
    use sysml_layout_core::{
        identifier::Id,
        model::{GraphBuilder, Node, NodeKind},
    };

    use super::*;
    use crate::document::EdgePath;

    fn engine() -> Engine {
        Engine::new(&LayoutConfig::default())
    }

    #[test]
    fn test_generalization_chain_puts_general_on_top() {
        let graph = GraphBuilder::new(DiagramKind::Bdd)
            .node(Node::new("A", NodeKind::Block))
            .node(Node::new("B", NodeKind::Block))
            .node(Node::new("C", NodeKind::Block))
            .edge(Edge::new("g1", EdgeKind::Generalization, "A", "B"))
            .edge(Edge::new("g2", EdgeKind::Generalization, "B", "C"))
            .build()
            .expect("valid graph");
        let document = engine().calculate(&graph).expect("layout");

        let ordering = document.ordering();
        assert_eq!(ordering.rank_of(Id::new("C")), Some(0));
        assert_eq!(ordering.rank_of(Id::new("B")), Some(1));
        assert_eq!(ordering.rank_of(Id::new("A")), Some(2));

        let y = |id: &str| document.node(Id::new(id)).map(|node| node.bounds().min_y());
        assert!(y("C") < y("B") && y("B") < y("A"));
    }

    #[test]
    fn test_composition_whole_above_parts_in_input_order() {
        let graph = GraphBuilder::new(DiagramKind::Bdd)
            .node(Node::new("Car", NodeKind::Block))
            .node(Node::new("Engine", NodeKind::Block))
            .node(Node::new("Wheel", NodeKind::Block))
            .edge(Edge::new("c1", EdgeKind::Composition, "Car", "Engine"))
            .edge(Edge::new("c2", EdgeKind::Composition, "Car", "Wheel"))
            .build()
            .expect("valid graph");
        let document = engine().calculate(&graph).expect("layout");

        let bounds = |id: &str| document.node(Id::new(id)).map(|node| node.bounds());
        let (Some(car), Some(engine), Some(wheel)) = (bounds("Car"), bounds("Engine"), bounds("Wheel"))
        else {
            panic!("missing nodes");
        };
        assert!(car.max_y() < engine.min_y());
        assert!(engine.max_x() < wheel.min_x());
        assert_eq!(document.edges().len(), 2);
    }

    #[test]
    fn test_connectors_do_not_rank() {
        let graph = GraphBuilder::new(DiagramKind::Bdd)
            .node(Node::new("A", NodeKind::Block))
            .node(Node::new("B", NodeKind::Block))
            .edge(Edge::new("c", EdgeKind::Connector, "A", "B"))
            .build()
            .expect("valid graph");
        let document = engine().calculate(&graph).expect("layout");

        assert_eq!(document.ordering().rank_of(Id::new("A")), Some(0));
        assert_eq!(document.ordering().rank_of(Id::new("B")), Some(0));
        let edge = document.edge(Id::new("c")).expect("routed");
        assert!(matches!(edge.path(), EdgePath::Polyline { .. }));
    }

    #[test]
    fn test_ports_sit_on_owner() {
        let graph = GraphBuilder::new(DiagramKind::Bdd)
            .node(Node::new("A", NodeKind::Block).with_children(["p1", "p2"]))
            .node(Node::new("p1", NodeKind::Port))
            .node(Node::new("p2", NodeKind::Port))
            .node(Node::new("B", NodeKind::Block))
            .edge(Edge::new("c", EdgeKind::Connector, "p1", "B"))
            .build()
            .expect("valid graph");
        let document = engine().calculate(&graph).expect("layout");

        let owner = document.node(Id::new("A")).expect("placed").bounds();
        for port in ["p1", "p2"] {
            let port = document.node(Id::new(port)).expect("placed");
            assert!(owner.contains(&port.bounds()));
            assert_eq!(port.owner(), Some(Id::new("A")));
        }
    }

    #[test]
    fn test_composition_edge_cycle_becomes_feedback() {
        // Ownership comes from `children`; composition edges only rank.
        let graph = GraphBuilder::new(DiagramKind::Bdd)
            .node(Node::new("A", NodeKind::Block))
            .node(Node::new("B", NodeKind::Block))
            .edge(Edge::new("c1", EdgeKind::Composition, "A", "B"))
            .edge(Edge::new("c2", EdgeKind::Composition, "B", "A"))
            .build()
            .expect("valid graph");
        let document = engine().calculate(&graph).expect("layout");

        let feedback: Vec<_> = document.edges().iter().filter(|e| e.is_feedback()).collect();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].id(), Id::new("c2"));
    }

    #[test]
    fn test_generalization_across_containers_keeps_rank_order() {
        let graph = GraphBuilder::new(DiagramKind::Bdd)
            .node(Node::new("X", NodeKind::Block).with_children(["A"]))
            .node(Node::new("A", NodeKind::Block))
            .node(Node::new("Y", NodeKind::Block).with_children(["B"]))
            .node(Node::new("B", NodeKind::Block))
            .edge(Edge::new("g", EdgeKind::Generalization, "A", "B"))
            .build()
            .expect("valid graph");
        let document = engine().calculate(&graph).expect("layout");

        let rank = |id: &str| document.ordering().rank_of(Id::new(id)).expect("ranked");
        assert!(rank("A") > rank("B"));
        assert!(rank("X") > rank("Y"));
        assert!(!document.edge(Id::new("g")).expect("routed").is_feedback());
    }

    #[test]
    fn test_generalization_of_own_container_ranks_below_it() {
        let graph = GraphBuilder::new(DiagramKind::Bdd)
            .node(Node::new("P", NodeKind::Block).with_children(["C"]))
            .node(Node::new("C", NodeKind::Block))
            .edge(Edge::new("g", EdgeKind::Generalization, "C", "P"))
            .build()
            .expect("valid graph");
        let document = engine().calculate(&graph).expect("layout");

        let rank = |id: &str| document.ordering().rank_of(Id::new(id)).expect("ranked");
        assert!(rank("C") > rank("P"));
        assert!(!document.edge(Id::new("g")).expect("routed").is_feedback());
    }
}
