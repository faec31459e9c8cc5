//! The immutable layout document produced by every strategy.
//!
//! A [`LayoutDocument`] holds everything a rendering backend needs: a placed
//! rectangle per node, a routed path per edge, the canvas bounds and the
//! ordering metadata computed along the way. All geometry is expressed in a
//! canvas whose top-left corner is `(0, 0)`.
//!
//! Documents are assembled by the crate-internal [`DocumentBuilder`], which
//! computes the padded bounding box, moves everything to the origin and assigns
//! a stacking order.

use serde::Serialize;

use sysml_layout_core::{
    geometry::{Bounds, Insets, Point},
    identifier::Id,
    model::{ActivityKind, DiagramKind, Edge, EdgeKind, Node, NodeKind},
};

/// Height reserved at the top of a container for its label.
pub(crate) const CONTAINER_LABEL_OFFSET: f32 = 14.0;

/// Stacking layers, from bottom to top.
///
/// The `Ord` derive uses declaration order, so the first variant is drawn first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLayer {
    /// Nodes that own other non-port nodes
    Container,
    /// Sequence diagram lifelines
    Lifeline,
    /// Regular nodes, the default layer
    Content,
    /// Routed edges and messages
    Edge,
    /// Ports, drawn above edge ends
    Port,
}

impl RenderLayer {
    /// Returns a human-readable name for this layer.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Lifeline => "lifeline",
            Self::Content => "content",
            Self::Edge => "edge",
            Self::Port => "port",
        }
    }
}

/// The outline a renderer should draw for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    Rectangle,
    RoundedRectangle,
    Diamond,
    Circle,
    Bar,
    Port,
    Lifeline,
}

impl NodeShape {
    /// Picks the shape for a node from its kind and activity refinement.
    pub fn for_node(node: &Node) -> Self {
        match node.kind() {
            NodeKind::Block | NodeKind::Requirement => Self::Rectangle,
            NodeKind::Port => Self::Port,
            NodeKind::Lifeline => Self::Lifeline,
            NodeKind::ActivityNode => match node.activity_kind().unwrap_or_default() {
                ActivityKind::Action => Self::RoundedRectangle,
                ActivityKind::Decision | ActivityKind::Merge => Self::Diamond,
                ActivityKind::Initial | ActivityKind::Final => Self::Circle,
                ActivityKind::Fork | ActivityKind::Join => Self::Bar,
            },
        }
    }
}

/// A node with its final rectangle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedNode {
    id: Id,
    kind: NodeKind,
    shape: NodeShape,
    bounds: Bounds,
    label: String,
    label_anchor: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    style_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<Id>,
    layer: RenderLayer,
    z_index: u32,
    #[serde(skip)]
    depth: usize,
}

impl PlacedNode {
    pub(crate) fn new(node: &Node, bounds: Bounds, owner: Option<Id>, depth: usize) -> Self {
        Self {
            id: node.id(),
            kind: node.kind(),
            shape: NodeShape::for_node(node),
            bounds,
            label: node.label(),
            label_anchor: bounds.center(),
            style_class: node.style_class().map(str::to_string),
            owner,
            layer: match node.kind() {
                NodeKind::Port => RenderLayer::Port,
                NodeKind::Lifeline => RenderLayer::Lifeline,
                _ => RenderLayer::Content,
            },
            z_index: 0,
            depth,
        }
    }

    /// Marks the node as a container: it moves to the container layer and its
    /// label sits at the top instead of the center.
    pub(crate) fn into_container(mut self) -> Self {
        self.layer = RenderLayer::Container;
        self.label_anchor = Point::new(
            self.bounds.center().x(),
            self.bounds.min_y() + CONTAINER_LABEL_OFFSET,
        );
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Where the label text should be centered.
    pub fn label_anchor(&self) -> Point {
        self.label_anchor
    }

    /// Opaque style class passed through from the graph.
    pub fn style_class(&self) -> Option<&str> {
        self.style_class.as_deref()
    }

    pub fn owner(&self) -> Option<Id> {
        self.owner
    }

    pub fn layer(&self) -> RenderLayer {
        self.layer
    }

    /// Stacking position; higher values are drawn later.
    pub fn z_index(&self) -> u32 {
        self.z_index
    }

    fn translate(&mut self, offset: Point) {
        self.bounds = self.bounds.translate(offset);
        self.label_anchor = self.label_anchor.add_point(offset);
    }
}

/// The geometry of a routed edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgePath {
    /// Connected segments; corners are rounded with `corner_radius` when drawn.
    Polyline {
        points: Vec<Point>,
        corner_radius: f32,
    },
    /// Cubic Bézier control points: `3n + 1` points describe `n` segments.
    Bezier { points: Vec<Point> },
}

impl EdgePath {
    pub fn points(&self) -> &[Point] {
        match self {
            Self::Polyline { points, .. } | Self::Bezier { points } => points,
        }
    }

    pub fn is_curved(&self) -> bool {
        matches!(self, Self::Bezier { .. })
    }

    /// A point halfway along the path, used to anchor labels.
    pub fn midpoint(&self) -> Point {
        match self {
            Self::Polyline { points, .. } => polyline_midpoint(points),
            Self::Bezier { points } => {
                let segments = points.len().saturating_sub(1) / 3;
                if segments == 0 {
                    return points.first().copied().unwrap_or_default();
                }
                let start = (segments / 2) * 3;
                let t = if segments % 2 == 1 { 0.5 } else { 0.0 };
                cubic_point(
                    [
                        points[start],
                        points[start + 1],
                        points[start + 2],
                        points[start + 3],
                    ],
                    t,
                )
            }
        }
    }

    fn translate(&mut self, offset: Point) {
        let points = match self {
            Self::Polyline { points, .. } | Self::Bezier { points } => points,
        };
        for point in points.iter_mut() {
            *point = point.add_point(offset);
        }
    }
}

/// Evaluates a cubic Bézier segment at `t`.
pub(crate) fn cubic_point(control: [Point; 4], t: f32) -> Point {
    let u = 1.0 - t;
    let weights = [u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t];
    control
        .iter()
        .zip(weights)
        .fold(Point::default(), |acc, (point, weight)| {
            acc.add_point(point.scale(weight))
        })
}

fn polyline_midpoint(points: &[Point]) -> Point {
    let total: f32 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    let mut remaining = total / 2.0;
    for window in points.windows(2) {
        let length = window[0].distance(window[1]);
        if length > 0.0 && remaining <= length {
            let t = remaining / length;
            return window[0].add_point(window[1].sub_point(window[0]).scale(t));
        }
        remaining -= length;
    }
    points.first().copied().unwrap_or_default()
}

/// An edge with its routed path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedEdge {
    id: Id,
    kind: EdgeKind,
    source: Id,
    target: Id,
    path: EdgePath,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label_anchor: Option<Point>,
    feedback: bool,
    self_loop: bool,
    overlap: bool,
    z_index: u32,
}

impl RoutedEdge {
    pub(crate) fn new(edge: &Edge, path: EdgePath) -> Self {
        Self {
            id: edge.id(),
            kind: edge.kind(),
            source: edge.source(),
            target: edge.target(),
            path,
            label: edge.label().map(str::to_string),
            label_anchor: None,
            feedback: false,
            self_loop: edge.is_self_loop(),
            overlap: false,
            z_index: 0,
        }
    }

    pub(crate) fn with_feedback(mut self, feedback: bool) -> Self {
        self.feedback = feedback;
        self
    }

    pub(crate) fn with_overlap(mut self, overlap: bool) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn path(&self) -> &EdgePath {
        &self.path
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn label_anchor(&self) -> Option<Point> {
        self.label_anchor
    }

    /// True when cycle breaking reversed this edge.
    pub fn is_feedback(&self) -> bool {
        self.feedback
    }

    pub fn is_self_loop(&self) -> bool {
        self.self_loop
    }

    /// True when no detour cleared every obstacle and the path crosses a node.
    pub fn is_overlapping(&self) -> bool {
        self.overlap
    }

    pub fn z_index(&self) -> u32 {
        self.z_index
    }
}

/// Rank and in-rank position of a node placed by layered layout.
///
/// Ranks are global across containment scopes: every non-feedback ranking
/// edge points from a lower rank to a higher one, even when its endpoints sit
/// in different containers or one contains the other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRank {
    node: Id,
    rank: usize,
    order: usize,
}

impl NodeRank {
    pub(crate) fn new(node: Id, rank: usize, order: usize) -> Self {
        Self { node, rank, order }
    }

    pub fn node(&self) -> Id {
        self.node
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Left-to-right position among all nodes of the rank.
    pub fn order(&self) -> usize {
        self.order
    }
}

/// The vertical line of a sequence diagram lifeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifelineTrack {
    node: Id,
    x: f32,
    top: f32,
    bottom: f32,
}

impl LifelineTrack {
    pub(crate) fn new(node: Id, x: f32, top: f32, bottom: f32) -> Self {
        Self {
            node,
            x,
            top,
            bottom,
        }
    }

    pub fn node(&self) -> Id {
        self.node
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }
}

/// The vertical slot assigned to a sequence diagram message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSlot {
    edge: Id,
    sequence: u32,
    y: f32,
}

impl MessageSlot {
    pub(crate) fn new(edge: Id, sequence: u32, y: f32) -> Self {
        Self { edge, sequence, y }
    }

    pub fn edge(&self) -> Id {
        self.edge
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn y(&self) -> f32 {
        self.y
    }
}

/// A swimlane's x-band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneBand {
    name: String,
    bounds: Bounds,
}

impl LaneBand {
    pub(crate) fn new(name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Ordering decisions recorded by the strategies.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderingMetadata {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ranks: Vec<NodeRank>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    lifelines: Vec<LifelineTrack>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<MessageSlot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    lanes: Vec<LaneBand>,
}

impl OrderingMetadata {
    pub(crate) fn with_ranks(mut self, ranks: Vec<NodeRank>) -> Self {
        self.ranks = ranks;
        self
    }

    pub(crate) fn with_lanes(mut self, lanes: Vec<LaneBand>) -> Self {
        self.lanes = lanes;
        self
    }

    pub(crate) fn with_sequence(
        mut self,
        lifelines: Vec<LifelineTrack>,
        messages: Vec<MessageSlot>,
    ) -> Self {
        self.lifelines = lifelines;
        self.messages = messages;
        self
    }

    /// Layered ranks, in graph node order.
    pub fn ranks(&self) -> &[NodeRank] {
        &self.ranks
    }

    pub fn rank_of(&self, node: Id) -> Option<usize> {
        self.ranks
            .iter()
            .find(|entry| entry.node == node)
            .map(NodeRank::rank)
    }

    /// Lifelines left to right.
    pub fn lifelines(&self) -> &[LifelineTrack] {
        &self.lifelines
    }

    /// Messages top to bottom.
    pub fn messages(&self) -> &[MessageSlot] {
        &self.messages
    }

    pub fn lanes(&self) -> &[LaneBand] {
        &self.lanes
    }

    fn extent(&self) -> impl Iterator<Item = Bounds> + '_ {
        let lanes = self.lanes.iter().map(LaneBand::bounds);
        let lifelines = self.lifelines.iter().map(|track| {
            Bounds::from_point(Point::new(track.x, track.top))
                .include_point(Point::new(track.x, track.bottom))
        });
        lanes.chain(lifelines)
    }

    fn translate(&mut self, offset: Point) {
        for lane in &mut self.lanes {
            lane.bounds = lane.bounds.translate(offset);
        }
        for track in &mut self.lifelines {
            track.x += offset.x();
            track.top += offset.y();
            track.bottom += offset.y();
        }
        for message in &mut self.messages {
            message.y += offset.y();
        }
    }
}

/// The frozen output of a layout run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutDocument {
    diagram: DiagramKind,
    bounds: Bounds,
    nodes: Vec<PlacedNode>,
    edges: Vec<RoutedEdge>,
    ordering: OrderingMetadata,
}

impl LayoutDocument {
    pub fn diagram(&self) -> DiagramKind {
        self.diagram
    }

    /// The canvas: origin at `(0, 0)`, margin included.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Placed nodes in graph insertion order.
    pub fn nodes(&self) -> &[PlacedNode] {
        &self.nodes
    }

    /// Routed edges in graph declaration order.
    pub fn edges(&self) -> &[RoutedEdge] {
        &self.edges
    }

    pub fn node(&self, id: Id) -> Option<&PlacedNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: Id) -> Option<&RoutedEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn ordering(&self) -> &OrderingMetadata {
        &self.ordering
    }
}

/// Collects placed nodes and routed edges and freezes them into a [`LayoutDocument`].
#[derive(Debug)]
pub(crate) struct DocumentBuilder {
    diagram: DiagramKind,
    margin: f32,
    nodes: Vec<PlacedNode>,
    edges: Vec<RoutedEdge>,
    ordering: OrderingMetadata,
}

impl DocumentBuilder {
    pub fn new(diagram: DiagramKind, margin: f32) -> Self {
        Self {
            diagram,
            margin,
            nodes: Vec::new(),
            edges: Vec::new(),
            ordering: OrderingMetadata::default(),
        }
    }

    pub fn add_node(&mut self, node: PlacedNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn add_edge(&mut self, edge: RoutedEdge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    pub fn set_ordering(&mut self, ordering: OrderingMetadata) -> &mut Self {
        self.ordering = ordering;
        self
    }

    /// Computes the canvas, moves all geometry to the origin and assigns z-order.
    ///
    /// An empty document gets a zero-area canvas at the origin.
    pub fn build(mut self) -> LayoutDocument {
        let extent = self
            .nodes
            .iter()
            .map(PlacedNode::bounds)
            .chain(
                self.edges
                    .iter()
                    .flat_map(|edge| edge.path.points().iter().copied())
                    .map(Bounds::from_point),
            )
            .chain(self.ordering.extent())
            .reduce(|acc, bounds| acc.merge(&bounds));

        let bounds = match extent {
            Some(extent) => {
                let padded = extent.add_padding(Insets::uniform(self.margin));
                let offset = Point::new(-padded.min_x(), -padded.min_y());
                for node in &mut self.nodes {
                    node.translate(offset);
                }
                for edge in &mut self.edges {
                    edge.path.translate(offset);
                }
                self.ordering.translate(offset);
                padded.translate(offset)
            }
            None => Bounds::default(),
        };

        for edge in &mut self.edges {
            if edge.label.is_some() {
                edge.label_anchor = Some(edge.path.midpoint());
            }
        }

        self.assign_z_order();

        LayoutDocument {
            diagram: self.diagram,
            bounds,
            nodes: self.nodes,
            edges: self.edges,
            ordering: self.ordering,
        }
    }

    /// Orders everything by layer, then nesting depth, then insertion order.
    fn assign_z_order(&mut self) {
        enum Item {
            Node(usize),
            Edge(usize),
        }

        let mut items: Vec<(RenderLayer, usize, Item)> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.layer, node.depth, Item::Node(index)))
            .chain(
                (0..self.edges.len()).map(|index| (RenderLayer::Edge, 0, Item::Edge(index))),
            )
            .collect();
        // Stable: ties keep nodes before edges and insertion order within each.
        items.sort_by_key(|(layer, depth, _)| (*layer, *depth));

        for (z_index, (_, _, item)) in (0_u32..).zip(items) {
            match item {
                Item::Node(index) => self.nodes[index].z_index = z_index,
                Item::Edge(index) => self.edges[index].z_index = z_index,
            }
        }
    }
}
