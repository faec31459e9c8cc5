//! Layered placement.
//!
//! Nodes are assigned to ranks along the edge direction and each rank is drawn
//! as a horizontal band, top to bottom:
//!
//! 1. Cycle breaking: a depth-first search in insertion order marks every edge
//!    that closes a cycle as [`EdgeClass::Feedback`]. Feedback edges and
//!    self-loops are left out of ranking and ordering.
//! 2. Ranking: longest path from the sources of the remaining acyclic graph.
//! 3. Ordering: barycenter sweeps, alternating downward and upward, for a fixed
//!    number of passes. Ties fall back to insertion order. Fixed-order groups are
//!    re-imposed after every sweep.
//! 4. Coordinates: nodes are packed left to right towards the average x of their
//!    parents, never closer than the node spacing. Ranks stack vertically as
//!    bands as tall as their tallest node, separated by the rank separation.
//!
//! When nodes carry lanes, steps 3 and 4 run once per lane and each lane becomes
//! a contiguous x-band. Ranks stay global so a rank is one band across lanes.

use log::{debug, trace, warn};
use petgraph::{algo::toposort, graph::DiGraph};

use sysml_layout_core::geometry::{Bounds, Point, Size};

/// How cycle breaking classified an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeClass {
    /// Part of the acyclic graph used for ranking.
    Tree,
    /// Closes a cycle; drawn as a back-edge.
    Feedback,
    SelfLoop,
}

/// Input to [`LayeredLayout`]: sizes by node index and directed edges between indices.
#[derive(Debug, Clone, Default)]
pub struct LayeredGraph {
    sizes: Vec<Size>,
    edges: Vec<(usize, usize)>,
    fixed_groups: Vec<Vec<usize>>,
    lanes: Vec<Option<String>>,
}

impl LayeredGraph {
    pub fn new(sizes: Vec<Size>) -> Self {
        let lanes = vec![None; sizes.len()];
        Self {
            sizes,
            edges: Vec::new(),
            fixed_groups: Vec::new(),
            lanes,
        }
    }

    pub fn add_edge(&mut self, source: usize, target: usize) -> &mut Self {
        debug_assert!(source < self.sizes.len() && target < self.sizes.len());
        self.edges.push((source, target));
        self
    }

    /// Forces the given nodes into this left-to-right order wherever they share a rank.
    pub fn add_fixed_group(&mut self, group: impl IntoIterator<Item = usize>) -> &mut Self {
        let mut members = Vec::new();
        for node in group {
            if !members.contains(&node) {
                members.push(node);
            }
        }
        if members.len() > 1 {
            self.fixed_groups.push(members);
        }
        self
    }

    pub fn set_lane(&mut self, node: usize, lane: impl Into<String>) -> &mut Self {
        self.lanes[node] = Some(lane.into());
        self
    }

    pub fn nodes_count(&self) -> usize {
        self.sizes.len()
    }
}

/// Placement computed by [`LayeredLayout`], indexed like its input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayeredResult {
    bounds: Vec<Bounds>,
    ranks: Vec<usize>,
    orders: Vec<usize>,
    edge_classes: Vec<EdgeClass>,
    lanes: Vec<(String, Bounds)>,
}

impl LayeredResult {
    /// Node rectangles; the layout starts at `(0, 0)`.
    pub fn bounds(&self) -> &[Bounds] {
        &self.bounds
    }

    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    /// Left-to-right position of each node within its rank.
    pub fn orders(&self) -> &[usize] {
        &self.orders
    }

    pub fn edge_classes(&self) -> &[EdgeClass] {
        &self.edge_classes
    }

    /// Named lane bands, spanning the full layout height.
    pub fn lanes(&self) -> &[(String, Bounds)] {
        &self.lanes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Layered layout with fixed spacing and a bounded number of ordering passes.
#[derive(Debug, Clone)]
pub struct LayeredLayout {
    rank_separation: f32,
    node_spacing: f32,
    crossing_passes: usize,
}

impl LayeredLayout {
    pub fn new(rank_separation: f32, node_spacing: f32, crossing_passes: usize) -> Self {
        Self {
            rank_separation,
            node_spacing,
            crossing_passes,
        }
    }

    pub fn layout(&self, graph: &LayeredGraph) -> LayeredResult {
        let n = graph.nodes_count();
        if n == 0 {
            return LayeredResult::default();
        }

        let edge_classes = classify_edges(n, &graph.edges);
        let dag: Vec<(usize, usize)> = graph
            .edges
            .iter()
            .zip(&edge_classes)
            .filter(|(_, class)| **class == EdgeClass::Tree)
            .map(|(edge, _)| *edge)
            .collect();
        let ranks = longest_path_ranks(&vec![0; n], &dag);
        let rank_count = ranks.iter().max().map_or(0, |max| max + 1);

        let (lane_of, lane_names) = assign_lanes(&graph.lanes);
        debug!(
            nodes_count = n,
            feedback_count = edge_classes.iter().filter(|c| **c == EdgeClass::Feedback).count(),
            rank_count,
            lane_count = lane_names.len();
            "Layered layout ranked"
        );

        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
        let mut centers_x = vec![0.0_f32; n];
        let mut lane_extents = Vec::with_capacity(lane_names.len());
        let mut lane_offset = 0.0_f32;

        // Ranks come from the whole graph, so a flow that crosses lanes still
        // moves down a band. Each lane orders and packs its share of every
        // band, and the bands are merged by rank index.
        for lane in 0..lane_names.len() {
            let in_lane: Vec<bool> = lane_of.iter().map(|l| *l == lane).collect();
            let lane_layers =
                self.order_layers(&in_lane, &ranks, &dag, &graph.fixed_groups, rank_count);
            let (lane_centers, width) = self.pack_layers(&lane_layers, &in_lane, &dag, &graph.sizes);

            for (node, center) in lane_centers.into_iter().enumerate() {
                if let Some(center) = center {
                    centers_x[node] = center + lane_offset;
                }
            }
            for (layer, lane_layer) in layers.iter_mut().zip(lane_layers) {
                layer.extend(lane_layer);
            }
            lane_extents.push((lane_offset, width));
            lane_offset += width + self.node_spacing;
        }

        let mut band_tops = Vec::with_capacity(rank_count);
        let mut band_heights = Vec::with_capacity(rank_count);
        let mut cursor = 0.0_f32;
        for layer in &layers {
            let height = layer
                .iter()
                .map(|node| graph.sizes[*node].height())
                .fold(0.0_f32, f32::max);
            band_tops.push(cursor);
            band_heights.push(height);
            cursor += height + self.rank_separation;
        }
        let total_height = (cursor - self.rank_separation).max(0.0);

        let bounds: Vec<Bounds> = (0..n)
            .map(|node| {
                let rank = ranks[node];
                let center = Point::new(centers_x[node], band_tops[rank] + band_heights[rank] / 2.0);
                Bounds::new_from_center(center, graph.sizes[node])
            })
            .collect();

        let mut orders = vec![0; n];
        for layer in &layers {
            for (order, node) in layer.iter().enumerate() {
                orders[*node] = order;
            }
        }

        let lanes = lane_names
            .into_iter()
            .zip(lane_extents)
            .filter_map(|(name, (offset, width))| {
                name.map(|name| {
                    let band = Bounds::new_from_top_left(
                        Point::new(offset, 0.0),
                        Size::new(width, total_height),
                    );
                    (name, band)
                })
            })
            .collect();

        LayeredResult {
            bounds,
            ranks,
            orders,
            edge_classes,
            lanes,
        }
    }

    /// Orders the nodes of one lane within each rank.
    fn order_layers(
        &self,
        in_lane: &[bool],
        ranks: &[usize],
        dag: &[(usize, usize)],
        fixed_groups: &[Vec<usize>],
        rank_count: usize,
    ) -> Vec<Vec<usize>> {
        let n = in_lane.len();
        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
        for node in (0..n).filter(|node| in_lane[*node]) {
            layers[ranks[node]].push(node);
        }

        let (ups, downs) = lane_neighbours(in_lane, dag);
        let mut position = vec![0.0_f32; n];

        apply_fixed_groups(&mut layers, fixed_groups);
        refresh_positions(&layers, &mut position);

        for pass in 0..self.crossing_passes {
            let before = layers.clone();
            if pass % 2 == 0 {
                for rank in 1..rank_count {
                    sort_by_barycenter(&mut layers[rank], &ups, &position);
                    refresh_positions(&layers[rank..=rank], &mut position);
                }
            } else {
                for rank in (0..rank_count.saturating_sub(1)).rev() {
                    sort_by_barycenter(&mut layers[rank], &downs, &position);
                    refresh_positions(&layers[rank..=rank], &mut position);
                }
            }
            apply_fixed_groups(&mut layers, fixed_groups);
            refresh_positions(&layers, &mut position);

            if layers == before {
                trace!(pass; "Crossing reduction converged");
                break;
            }
        }

        layers
    }

    /// Assigns x centers rank by rank; returns them with the lane width.
    fn pack_layers(
        &self,
        layers: &[Vec<usize>],
        in_lane: &[bool],
        dag: &[(usize, usize)],
        sizes: &[Size],
    ) -> (Vec<Option<f32>>, f32) {
        let (ups, _) = lane_neighbours(in_lane, dag);
        let mut centers: Vec<Option<f32>> = vec![None; in_lane.len()];

        for layer in layers {
            let mut previous_right: Option<f32> = None;
            for &node in layer {
                let half = sizes[node].width() / 2.0;
                let parents: Vec<f32> = ups[node].iter().filter_map(|u| centers[*u]).collect();
                let desired = (!parents.is_empty())
                    .then(|| parents.iter().sum::<f32>() / parents.len() as f32);
                let minimum = previous_right.map(|right| right + self.node_spacing + half);

                let center = match (desired, minimum) {
                    (Some(desired), Some(minimum)) => desired.max(minimum),
                    (Some(desired), None) => desired,
                    (None, Some(minimum)) => minimum,
                    (None, None) => half,
                };
                centers[node] = Some(center);
                previous_right = Some(center + half);
            }
        }

        let extents: Vec<(f32, f32)> = centers
            .iter()
            .enumerate()
            .filter_map(|(node, center)| {
                let half = sizes[node].width() / 2.0;
                center.map(|center| (center - half, center + half))
            })
            .collect();
        let left = extents.iter().map(|(left, _)| *left).fold(f32::INFINITY, f32::min);
        if !left.is_finite() {
            return (centers, 0.0);
        }
        let width = extents
            .iter()
            .map(|(_, right)| *right)
            .fold(f32::NEG_INFINITY, f32::max)
            - left;

        let centers = centers
            .into_iter()
            .map(|center| center.map(|center| center - left))
            .collect();
        (centers, width)
    }
}

/// Depth-first classification in insertion order.
pub(super) fn classify_edges(n: usize, edges: &[(usize, usize)]) -> Vec<EdgeClass> {
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut classes = vec![EdgeClass::Tree; edges.len()];
    for (index, &(source, target)) in edges.iter().enumerate() {
        if source == target {
            classes[index] = EdgeClass::SelfLoop;
        } else {
            outgoing[source].push(index);
        }
    }

    let mut state = vec![Visit::New; n];
    for root in 0..n {
        if state[root] != Visit::New {
            continue;
        }
        state[root] = Visit::Active;
        let mut stack = vec![(root, 0_usize)];

        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            let Some(&edge) = outgoing[node].get(cursor) else {
                state[node] = Visit::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            let target = edges[edge].1;
            match state[target] {
                Visit::Active => classes[edge] = EdgeClass::Feedback,
                Visit::New => {
                    state[target] = Visit::Active;
                    stack.push((target, 0));
                }
                Visit::Done => {}
            }
        }
    }
    classes
}

/// Longest path from the sources, in a topological order of the acyclic edges.
///
/// `floors` gives each node's lowest allowed rank.
pub(super) fn longest_path_ranks(floors: &[usize], dag: &[(usize, usize)]) -> Vec<usize> {
    let n = floors.len();
    let mut graph = DiGraph::<(), ()>::with_capacity(n, dag.len());
    let indices: Vec<_> = (0..n).map(|_| graph.add_node(())).collect();
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(source, target) in dag {
        graph.add_edge(indices[source], indices[target], ());
        outgoing[source].push(target);
    }

    let order: Vec<usize> = match toposort(&graph, None) {
        Ok(order) => order.into_iter().map(|index| index.index()).collect(),
        Err(cycle) => {
            warn!(node = cycle.node_id().index(); "Cycle left after cycle breaking, ranking in insertion order");
            (0..n).collect()
        }
    };

    let mut ranks = floors.to_vec();
    for node in order {
        for &target in &outgoing[node] {
            ranks[target] = ranks[target].max(ranks[node] + 1);
        }
    }
    ranks
}

/// Maps nodes to lane indices. Named lanes come first in order of first
/// appearance; nodes without a lane share a trailing unnamed lane.
fn assign_lanes(lanes: &[Option<String>]) -> (Vec<usize>, Vec<Option<String>>) {
    let mut names: Vec<Option<String>> = Vec::new();
    for name in lanes.iter().flatten() {
        if !names.iter().flatten().any(|known| known == name) {
            names.push(Some(name.clone()));
        }
    }
    let unnamed = names.len();
    if lanes.iter().any(Option::is_none) {
        names.push(None);
    }

    let lane_of = lanes
        .iter()
        .map(|lane| match lane {
            Some(name) => names
                .iter()
                .position(|known| known.as_deref() == Some(name.as_str()))
                .unwrap_or(unnamed),
            None => unnamed,
        })
        .collect();
    (lane_of, names)
}

/// Upper and lower neighbours restricted to one lane.
fn lane_neighbours(in_lane: &[bool], dag: &[(usize, usize)]) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
    let n = in_lane.len();
    let mut ups = vec![Vec::new(); n];
    let mut downs = vec![Vec::new(); n];
    for &(source, target) in dag {
        if in_lane[source] && in_lane[target] {
            downs[source].push(target);
            ups[target].push(source);
        }
    }
    (ups, downs)
}

fn refresh_positions(layers: &[Vec<usize>], position: &mut [f32]) {
    for layer in layers {
        for (index, node) in layer.iter().enumerate() {
            position[*node] = index as f32;
        }
    }
}

/// Stable sort by average neighbour position; nodes without neighbours keep
/// their own position, ties fall back to insertion order.
fn sort_by_barycenter(layer: &mut [usize], neighbours: &[Vec<usize>], position: &[f32]) {
    let mut keyed: Vec<(f32, usize)> = layer
        .iter()
        .map(|&node| {
            let around = &neighbours[node];
            let barycenter = if around.is_empty() {
                position[node]
            } else {
                around.iter().map(|n| position[*n]).sum::<f32>() / around.len() as f32
            };
            (barycenter, node)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    for (slot, (_, node)) in layer.iter_mut().zip(keyed) {
        *slot = node;
    }
}

/// Re-imposes the declared order of each group on the slots its members occupy.
fn apply_fixed_groups(layers: &mut [Vec<usize>], groups: &[Vec<usize>]) {
    for group in groups {
        for layer in layers.iter_mut() {
            let members: Vec<usize> = group.iter().copied().filter(|node| layer.contains(node)).collect();
            if members.len() < 2 {
                continue;
            }
            let slots: Vec<usize> = layer
                .iter()
                .enumerate()
                .filter(|(_, node)| members.contains(node))
                .map(|(slot, _)| slot)
                .collect();
            for (slot, node) in slots.into_iter().zip(members) {
                layer[slot] = node;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn layout() -> LayeredLayout {
        LayeredLayout::new(60.0, 30.0, 6)
    }

    fn uniform(n: usize) -> LayeredGraph {
        LayeredGraph::new(vec![Size::new(100.0, 40.0); n])
    }

    #[test]
    fn test_empty_graph() {
        let result = layout().layout(&LayeredGraph::default());
        assert!(result.bounds().is_empty());
    }

    #[test]
    fn test_chain_ranks() {
        let mut graph = uniform(3);
        graph.add_edge(0, 1).add_edge(1, 2);
        let result = layout().layout(&graph);

        assert_eq!(result.ranks(), [0, 1, 2]);
        let bounds = result.bounds();
        assert_approx_eq!(f32, bounds[1].min_y() - bounds[0].max_y(), 60.0);
        assert_approx_eq!(f32, bounds[0].center().x(), bounds[2].center().x());
    }

    #[test]
    fn test_longest_path_rank() {
        let mut graph = uniform(4);
        graph.add_edge(0, 1).add_edge(1, 2).add_edge(0, 2).add_edge(3, 2);
        let result = layout().layout(&graph);

        assert_eq!(result.ranks(), [0, 1, 2, 0]);
    }

    #[test]
    fn test_two_cycle_marks_one_feedback_edge() {
        let mut graph = uniform(2);
        graph.add_edge(0, 1).add_edge(1, 0);
        let result = layout().layout(&graph);

        assert_eq!(result.edge_classes(), [EdgeClass::Tree, EdgeClass::Feedback]);
        assert_eq!(result.ranks(), [0, 1]);
    }

    #[test]
    fn test_self_loop_is_classified_separately() {
        let mut graph = uniform(1);
        graph.add_edge(0, 0);
        let result = layout().layout(&graph);

        assert_eq!(result.edge_classes(), [EdgeClass::SelfLoop]);
        assert_eq!(result.ranks(), [0]);
    }

    #[test]
    fn test_barycenter_uncrosses_edges() {
        let mut graph = uniform(4);
        graph.add_edge(0, 3).add_edge(1, 2);
        let result = layout().layout(&graph);

        assert_eq!(result.orders()[3], 0);
        assert_eq!(result.orders()[2], 1);
        assert!(result.bounds()[3].center().x() < result.bounds()[2].center().x());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut graph = uniform(4);
        graph.add_edge(0, 1).add_edge(0, 2).add_edge(0, 3);
        let result = layout().layout(&graph);

        assert_eq!(&result.orders()[1..], [0, 1, 2]);
    }

    #[test]
    fn test_fixed_group_overrides_insertion_order() {
        let mut graph = uniform(3);
        graph.add_edge(0, 1).add_edge(0, 2).add_fixed_group([2, 1]);
        let result = layout().layout(&graph);

        assert_eq!(result.orders()[2], 0);
        assert_eq!(result.orders()[1], 1);
    }

    #[test]
    fn test_lanes_form_disjoint_bands() {
        let mut graph = uniform(3);
        graph
            .add_edge(0, 1)
            .add_edge(1, 2)
            .set_lane(0, "Driver")
            .set_lane(1, "Controller")
            .set_lane(2, "Driver");
        let result = layout().layout(&graph);

        let lanes = result.lanes();
        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes[0].0, "Driver");
        assert_eq!(lanes[1].0, "Controller");
        assert!(lanes[0].1.max_x() <= lanes[1].1.min_x());

        let bounds = result.bounds();
        assert!(lanes[0].1.contains(&bounds[0]));
        assert!(lanes[1].1.contains(&bounds[1]));
        assert!(lanes[0].1.contains(&bounds[2]));
        assert_eq!(result.ranks(), [0, 1, 2]);
    }

    #[test]
    fn test_lanes_share_rank_bands() {
        let mut graph = uniform(3);
        graph
            .add_edge(0, 1)
            .add_edge(0, 2)
            .set_lane(0, "Customer")
            .set_lane(1, "Warehouse")
            .set_lane(2, "Customer");
        let result = layout().layout(&graph);

        assert_eq!(result.ranks(), [0, 1, 1]);
        let bounds = result.bounds();
        assert_approx_eq!(f32, bounds[1].min_y(), bounds[2].min_y());
        assert!(bounds[1].min_y() > bounds[0].max_y());
        assert!(bounds[1].min_x() > bounds[2].max_x());
    }

    #[test]
    fn test_rank_band_uses_tallest_node() {
        let mut graph = LayeredGraph::new(vec![
            Size::new(50.0, 100.0),
            Size::new(50.0, 20.0),
            Size::new(50.0, 20.0),
        ]);
        graph.add_edge(0, 2).add_edge(1, 2);
        let result = layout().layout(&graph);

        let bounds = result.bounds();
        assert_approx_eq!(f32, bounds[1].center().y(), 50.0);
        assert_approx_eq!(f32, bounds[2].min_y(), 160.0);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn graph_strategy() -> impl Strategy<Value = LayeredGraph> {
        (1_usize..12).prop_flat_map(|n| {
            (
                prop::collection::vec((1.0_f32..150.0, 1.0_f32..80.0), n),
                prop::collection::vec((0..n, 0..n), 0..(n * 2)),
                prop::collection::vec(prop::option::of(0_usize..3), n),
            )
                .prop_map(|(sizes, edges, lanes)| {
                    let mut graph = LayeredGraph::new(
                        sizes.into_iter().map(|(w, h)| Size::new(w, h)).collect(),
                    );
                    for (source, target) in edges {
                        graph.add_edge(source, target);
                    }
                    for (node, lane) in lanes.into_iter().enumerate() {
                        if let Some(lane) = lane {
                            graph.set_lane(node, format!("lane{lane}"));
                        }
                    }
                    graph
                })
        })
    }

    fn check_no_overlap(graph: &LayeredGraph) -> Result<(), TestCaseError> {
        let result = LayeredLayout::new(40.0, 20.0, 6).layout(graph);
        let bounds = result.bounds();
        for (i, a) in bounds.iter().enumerate() {
            for b in &bounds[i + 1..] {
                prop_assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
        Ok(())
    }

    fn check_tree_edges_point_down(graph: &LayeredGraph) -> Result<(), TestCaseError> {
        let result = LayeredLayout::new(40.0, 20.0, 6).layout(graph);
        for (&(source, target), class) in graph.edges.iter().zip(result.edge_classes()) {
            if *class == EdgeClass::Tree {
                prop_assert!(result.ranks()[source] < result.ranks()[target]);
            }
        }
        Ok(())
    }

    fn check_deterministic(graph: &LayeredGraph) -> Result<(), TestCaseError> {
        let layout = LayeredLayout::new(40.0, 20.0, 6);
        prop_assert_eq!(layout.layout(graph), layout.layout(graph));
        Ok(())
    }

    proptest! {
        #[test]
        fn no_overlap(graph in graph_strategy()) {
            check_no_overlap(&graph)?;
        }

        #[test]
        fn tree_edges_point_down(graph in graph_strategy()) {
            check_tree_edges_point_down(&graph)?;
        }

        #[test]
        fn deterministic(graph in graph_strategy()) {
            check_deterministic(&graph)?;
        }
    }
}
