//! The validated diagram graph and its builder.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    str::FromStr,
};

use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Endpoint, GraphError},
    identifier::Id,
    model::{Edge, Node},
};

/// The diagram kind a graph is tagged with; selects the layout strategy.
///
/// The names match external configuration strings (lowercase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    /// Block Definition Diagram
    Bdd,
    /// Internal Block Diagram
    Ibd,
    Activity,
    Sequence,
    Requirements,
}

impl FromStr for DiagramKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bdd" => Ok(Self::Bdd),
            "ibd" => Ok(Self::Ibd),
            "activity" => Ok(Self::Activity),
            "sequence" => Ok(Self::Sequence),
            "requirements" => Ok(Self::Requirements),
            _ => Err("Unsupported diagram kind"),
        }
    }
}

impl From<DiagramKind> for &'static str {
    fn from(val: DiagramKind) -> Self {
        match val {
            DiagramKind::Bdd => "bdd",
            DiagramKind::Ibd => "ibd",
            DiagramKind::Activity => "activity",
            DiagramKind::Sequence => "sequence",
            DiagramKind::Requirements => "requirements",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// A validated, immutable diagram graph.
///
/// Nodes keep their insertion order, which layout strategies use as the
/// authoritative tie-breaker. Edges keep their declaration order. Parallel edges
/// are allowed.
#[derive(Debug, Clone)]
pub struct Graph {
    diagram: DiagramKind,
    nodes: IndexMap<Id, Node>,
    edges: Vec<Edge>,
    owners: HashMap<Id, Id>,
}

impl Graph {
    /// The diagram kind this graph is tagged with.
    pub fn diagram(&self) -> DiagramKind {
        self.diagram
    }

    /// Returns a copy of this graph tagged with another diagram kind.
    pub fn with_diagram(&self, diagram: DiagramKind) -> Self {
        Self {
            diagram,
            ..self.clone()
        }
    }

    /// Iterates over nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains_node(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Position of the node in insertion order.
    pub fn node_index(&self, id: Id) -> Option<usize> {
        self.nodes.get_index_of(&id)
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edges in declaration order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node that owns `id`, if any.
    pub fn owner(&self, id: Id) -> Option<Id> {
        self.owners.get(&id).copied()
    }

    /// Owners of `id` from the nearest to the outermost.
    pub fn ancestors(&self, id: Id) -> Vec<Id> {
        let mut ancestors = Vec::new();
        let mut current = id;
        while let Some(owner) = self.owner(current) {
            ancestors.push(owner);
            current = owner;
        }
        ancestors
    }

    /// Returns true when `ancestor` transitively owns `node`.
    pub fn is_ancestor(&self, ancestor: Id, node: Id) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    /// Nesting depth: zero for top-level nodes.
    pub fn depth(&self, id: Id) -> usize {
        self.ancestors(id).len()
    }

    /// Nodes without an owner, in insertion order.
    pub fn top_level_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(|node| !self.owners.contains_key(&node.id()))
    }

    /// Owned children of `id` that are ports, in declaration order.
    pub fn ports_of(&self, id: Id) -> impl Iterator<Item = &Node> {
        self.node(id)
            .into_iter()
            .flat_map(|node| node.children().iter())
            .filter_map(|child| self.node(*child))
            .filter(|child| child.kind().is_port())
    }

    /// Edges with `id` as source or target, in declaration order.
    pub fn incident_edges(&self, id: Id) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(move |edge| edge.source() == id || edge.target() == id)
    }
}

/// Builder that validates and freezes a [`Graph`].
///
/// # Examples
///
/// ```
/// use sysml_layout_core::model::{DiagramKind, Edge, EdgeKind, GraphBuilder, Node, NodeKind};
///
/// let graph = GraphBuilder::new(DiagramKind::Bdd)
///     .node(Node::new("Vehicle", NodeKind::Block))
///     .node(Node::new("Car", NodeKind::Block))
///     .edge(Edge::new("g1", EdgeKind::Generalization, "Car", "Vehicle"))
///     .build()
///     .expect("valid graph");
///
/// assert_eq!(graph.nodes_count(), 2);
/// assert_eq!(graph.edges_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    diagram: DiagramKind,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    pub fn new(diagram: DiagramKind) -> Self {
        Self {
            diagram,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Adds a node (builder style).
    pub fn node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Adds an edge (builder style).
    pub fn edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn add_edge(&mut self, edge: Edge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    /// Validates the collected nodes and edges and freezes them into a [`Graph`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] for duplicate ids, dangling edge endpoints or child
    /// references, nodes with two owners, composition cycles, illegal self-loops
    /// and invalid size hints.
    pub fn build(self) -> Result<Graph, GraphError> {
        let mut nodes = IndexMap::with_capacity(self.nodes.len());
        for node in self.nodes {
            node.size()
                .validate()
                .map_err(|reason| GraphError::InvalidSizeHint {
                    node: node.id(),
                    reason,
                })?;
            let id = node.id();
            if nodes.insert(id, node).is_some() {
                return Err(GraphError::DuplicateNode(id));
            }
        }

        let owners = collect_owners(&nodes)?;
        check_composition_cycles(&nodes, &owners)?;

        let mut edge_ids = HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            if !edge_ids.insert(edge.id()) {
                return Err(GraphError::DuplicateEdge(edge.id()));
            }
            for (endpoint, node) in [
                (Endpoint::Source, edge.source()),
                (Endpoint::Target, edge.target()),
            ] {
                if !nodes.contains_key(&node) {
                    return Err(GraphError::DanglingEdge {
                        edge: edge.id(),
                        endpoint,
                        node,
                    });
                }
            }
            if edge.is_self_loop() && !edge.kind().allows_self_loop() {
                return Err(GraphError::IllegalSelfLoop {
                    edge: edge.id(),
                    kind: edge.kind(),
                });
            }
        }

        debug!(
            diagram:% = self.diagram,
            nodes_count = nodes.len(),
            edges_count = self.edges.len();
            "Graph validated"
        );

        Ok(Graph {
            diagram: self.diagram,
            nodes,
            edges: self.edges,
            owners,
        })
    }
}

/// Builds the child -> owner map, rejecting unknown children and second owners.
fn collect_owners(nodes: &IndexMap<Id, Node>) -> Result<HashMap<Id, Id>, GraphError> {
    let mut owners = HashMap::new();
    for node in nodes.values() {
        for &child in node.children() {
            if !nodes.contains_key(&child) {
                return Err(GraphError::UnknownChild {
                    parent: node.id(),
                    child,
                });
            }
            if let Some(&first) = owners.get(&child) {
                return Err(GraphError::MultipleOwners {
                    node: child,
                    first,
                    second: node.id(),
                });
            }
            owners.insert(child, node.id());
        }
    }
    Ok(owners)
}

/// Walks every owner chain; each node has at most one owner so a chain either
/// ends at a top-level node or loops.
fn check_composition_cycles(
    nodes: &IndexMap<Id, Node>,
    owners: &HashMap<Id, Id>,
) -> Result<(), GraphError> {
    let mut acyclic: HashSet<Id> = HashSet::with_capacity(nodes.len());

    for &start in nodes.keys() {
        let mut chain = Vec::new();
        let mut on_chain = HashSet::new();
        let mut current = Some(start);

        while let Some(id) = current {
            if acyclic.contains(&id) {
                break;
            }
            if !on_chain.insert(id) {
                trace!(node:% = id; "Composition cycle detected");
                return Err(GraphError::CompositionCycle(id));
            }
            chain.push(id);
            current = owners.get(&id).copied();
        }

        acyclic.extend(chain);
    }
    Ok(())
}

/// Deserializable description of a graph, validated by conversion into [`Graph`].
///
/// The JSON shape is `{ "diagram": "...", "nodes": [...], "edges": [...] }`;
/// both lists default to empty.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDefinition {
    diagram: DiagramKind,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl GraphDefinition {
    /// Validates the definition into a [`Graph`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] for any structural violation, see [`GraphBuilder::build`].
    pub fn into_graph(self) -> Result<Graph, GraphError> {
        let mut builder = GraphBuilder::new(self.diagram);
        for node in self.nodes {
            builder.add_node(node);
        }
        for edge in self.edges {
            builder.add_edge(edge);
        }
        builder.build()
    }
}

impl TryFrom<GraphDefinition> for Graph {
    type Error = GraphError;

    fn try_from(definition: GraphDefinition) -> Result<Self, Self::Error> {
        definition.into_graph()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeKind, NodeKind, SizeHint};

    fn block(id: &str) -> Node {
        Node::new(id, NodeKind::Block)
    }

    #[test]
    fn test_build_preserves_insertion_order() {
        let graph = GraphBuilder::new(DiagramKind::Bdd)
            .node(block("c"))
            .node(block("a"))
            .node(block("b"))
            .build()
            .expect("valid graph");

        let ids: Vec<String> = graph.nodes().map(|node| node.id().to_string()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(graph.node_index(Id::new("a")), Some(1));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let result = GraphBuilder::new(DiagramKind::Bdd)
            .node(block("dup"))
            .node(block("dup"))
            .build();

        assert_eq!(result.unwrap_err(), GraphError::DuplicateNode(Id::new("dup")));
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let result = GraphBuilder::new(DiagramKind::Ibd)
            .node(block("a"))
            .node(block("b"))
            .edge(Edge::new("e", EdgeKind::Connector, "a", "b"))
            .edge(Edge::new("e", EdgeKind::Connector, "b", "a"))
            .build();

        assert_eq!(result.unwrap_err(), GraphError::DuplicateEdge(Id::new("e")));
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let result = GraphBuilder::new(DiagramKind::Bdd)
            .node(block("a"))
            .edge(Edge::new("e1", EdgeKind::Connector, "a", "ghost"))
            .build();

        assert_eq!(
            result.unwrap_err(),
            GraphError::DanglingEdge {
                edge: Id::new("e1"),
                endpoint: Endpoint::Target,
                node: Id::new("ghost"),
            }
        );
    }

    #[test]
    fn test_unknown_child_rejected() {
        let result = GraphBuilder::new(DiagramKind::Ibd)
            .node(block("a").with_children(["missing"]))
            .build();

        assert!(matches!(result, Err(GraphError::UnknownChild { .. })));
    }

    #[test]
    fn test_multiple_owners_rejected() {
        let result = GraphBuilder::new(DiagramKind::Ibd)
            .node(block("a").with_children(["p"]))
            .node(block("b").with_children(["p"]))
            .node(Node::new("p", NodeKind::Port))
            .build();

        assert_eq!(
            result.unwrap_err(),
            GraphError::MultipleOwners {
                node: Id::new("p"),
                first: Id::new("a"),
                second: Id::new("b"),
            }
        );
    }

    #[test]
    fn test_composition_cycle_rejected() {
        let result = GraphBuilder::new(DiagramKind::Bdd)
            .node(block("a").with_children(["b"]))
            .node(block("b").with_children(["c"]))
            .node(block("c").with_children(["a"]))
            .build();

        assert!(matches!(result, Err(GraphError::CompositionCycle(_))));
    }

    #[test]
    fn test_self_ownership_is_a_cycle() {
        let result = GraphBuilder::new(DiagramKind::Bdd)
            .node(block("a").with_children(["a"]))
            .build();

        assert_eq!(result.unwrap_err(), GraphError::CompositionCycle(Id::new("a")));
    }

    #[test]
    fn test_self_loop_permissions() {
        let message_loop = GraphBuilder::new(DiagramKind::Sequence)
            .node(Node::new("L", NodeKind::Lifeline))
            .edge(Edge::new("m", EdgeKind::Message, "L", "L").with_sequence(0))
            .build();
        assert!(message_loop.is_ok());

        let trace_loop = GraphBuilder::new(DiagramKind::Requirements)
            .node(Node::new("R", NodeKind::Requirement))
            .edge(Edge::new("t", EdgeKind::TraceLink, "R", "R"))
            .build();
        assert!(matches!(trace_loop, Err(GraphError::IllegalSelfLoop { .. })));
    }

    #[test]
    fn test_invalid_size_hint_rejected() {
        let result = GraphBuilder::new(DiagramKind::Bdd)
            .node(block("a").with_size(SizeHint::fixed(-5.0, 10.0)))
            .build();

        assert!(matches!(result, Err(GraphError::InvalidSizeHint { .. })));
    }

    #[test]
    fn test_parallel_edges_allowed() {
        let graph = GraphBuilder::new(DiagramKind::Ibd)
            .node(block("a"))
            .node(block("b"))
            .edge(Edge::new("e1", EdgeKind::Connector, "a", "b"))
            .edge(Edge::new("e2", EdgeKind::Connector, "a", "b"))
            .build()
            .expect("parallel edges are valid");

        assert_eq!(graph.incident_edges(Id::new("a")).count(), 2);
    }

    #[test]
    fn test_ownership_queries() {
        let graph = GraphBuilder::new(DiagramKind::Ibd)
            .node(block("system").with_children(["engine"]))
            .node(block("engine").with_children(["fuel_in", "shaft"]))
            .node(Node::new("fuel_in", NodeKind::Port))
            .node(block("shaft"))
            .build()
            .expect("valid graph");

        let fuel_in = Id::new("fuel_in");
        assert_eq!(graph.owner(fuel_in), Some(Id::new("engine")));
        assert_eq!(graph.ancestors(fuel_in), [Id::new("engine"), Id::new("system")]);
        assert!(graph.is_ancestor(Id::new("system"), fuel_in));
        assert_eq!(graph.depth(fuel_in), 2);
        assert_eq!(graph.top_level_nodes().count(), 1);

        let ports: Vec<Id> = graph.ports_of(Id::new("engine")).map(Node::id).collect();
        assert_eq!(ports, [fuel_in]);
    }

    #[test]
    fn test_definition_from_json() {
        let json = r#"{
            "diagram": "sequence",
            "nodes": [
                { "id": "L1", "kind": "lifeline" },
                { "id": "L2", "kind": "lifeline" }
            ],
            "edges": [
                { "id": "m0", "kind": "message", "source": "L1", "target": "L2", "sequence": 0 }
            ]
        }"#;
        let definition: GraphDefinition = serde_json::from_str(json).expect("valid json");
        let graph = Graph::try_from(definition).expect("valid graph");

        assert_eq!(graph.diagram(), DiagramKind::Sequence);
        assert_eq!(graph.nodes_count(), 2);
        assert_eq!(graph.edges()[0].sequence(), Some(0));
    }

    #[test]
    fn test_with_diagram_leaves_original_untouched() {
        let graph = GraphBuilder::new(DiagramKind::Bdd)
            .node(block("a"))
            .build()
            .expect("valid graph");
        let retagged = graph.with_diagram(DiagramKind::Ibd);

        assert_eq!(graph.diagram(), DiagramKind::Bdd);
        assert_eq!(retagged.diagram(), DiagramKind::Ibd);
        assert_eq!(retagged.nodes_count(), 1);
    }

    #[test]
    fn test_diagram_kind_from_str() {
        assert_eq!("ibd".parse::<DiagramKind>(), Ok(DiagramKind::Ibd));
        assert!("uml".parse::<DiagramKind>().is_err());
        assert_eq!(DiagramKind::Requirements.to_string(), "requirements");
    }
}
