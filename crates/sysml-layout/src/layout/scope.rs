//! Containment scopes.
//!
//! A scope is the set of direct structural children of one container block, or
//! the top-level nodes for the root scope. Ports owned by a block are not
//! members of any scope; they are anchored on their owner afterwards.
//!
//! Scopes are placed innermost first so a container knows the extent of its
//! content before its own scope is laid out. Absolute positions are then
//! resolved outermost first, centering each scope's content inside its
//! container below the header.
//!
//! Rank metadata is global. Once every scope is placed, all ranking edges are
//! ranked together over their own endpoints and the representatives they were
//! lifted to, so an edge keeps its direction across container boundaries.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace};

use sysml_layout_core::{
    geometry::{Bounds, Insets, Point, Size},
    identifier::Id,
    model::Graph,
};

use super::{
    force::ForceLayout,
    layered::{EdgeClass, LayeredGraph, LayeredLayout, classify_edges, longest_path_ranks},
    ports::min_owner_extent,
    sizing::intrinsic_size,
};
use crate::document::{LaneBand, NodeRank};

/// Space between a container's outline and its content; the top holds the label.
pub const CONTAINER_PADDING: Insets = Insets::new(28.0, 16.0, 16.0, 16.0);

/// One scope's placement input, indexed by member position.
#[derive(Debug, Clone, Default)]
pub struct ScopeProblem {
    pub sizes: Vec<Size>,
    pub edges: Vec<(usize, usize)>,
    pub fixed_groups: Vec<Vec<usize>>,
    pub lanes: Vec<Option<String>>,
}

/// One scope's placement, relative to the scope's own origin.
#[derive(Debug, Clone, Default)]
pub struct ScopeSolution {
    pub bounds: Vec<Bounds>,
    /// Parallel to [`ScopeProblem::edges`].
    pub feedback: Vec<bool>,
    /// Scope-local `(rank, order)` per member when the placer works in ranks.
    pub ranks: Option<Vec<(usize, usize)>>,
    pub lanes: Vec<(String, Bounds)>,
}

/// Places the members of a single scope.
pub trait ScopePlacer {
    fn place(&self, problem: &ScopeProblem) -> ScopeSolution;
}

impl ScopePlacer for LayeredLayout {
    fn place(&self, problem: &ScopeProblem) -> ScopeSolution {
        let mut graph = LayeredGraph::new(problem.sizes.clone());
        for &(source, target) in &problem.edges {
            graph.add_edge(source, target);
        }
        for group in &problem.fixed_groups {
            graph.add_fixed_group(group.iter().copied());
        }
        for (node, lane) in problem.lanes.iter().enumerate() {
            if let Some(lane) = lane {
                graph.set_lane(node, lane.clone());
            }
        }

        let result = self.layout(&graph);
        ScopeSolution {
            bounds: result.bounds().to_vec(),
            feedback: result
                .edge_classes()
                .iter()
                .map(|class| *class == EdgeClass::Feedback)
                .collect(),
            ranks: Some(
                result
                    .ranks()
                    .iter()
                    .copied()
                    .zip(result.orders().iter().copied())
                    .collect(),
            ),
            lanes: result.lanes().to_vec(),
        }
    }
}

impl ScopePlacer for ForceLayout {
    fn place(&self, problem: &ScopeProblem) -> ScopeSolution {
        ScopeSolution {
            bounds: self.layout(&problem.sizes, &problem.edges),
            feedback: vec![false; problem.edges.len()],
            ranks: None,
            lanes: Vec::new(),
        }
    }
}

/// A directed edge used for placement, tagged with the graph edge it came from.
#[derive(Debug, Clone, Copy)]
pub struct PlacementEdge {
    pub edge: Id,
    pub from: Id,
    pub to: Id,
}

/// Absolute placement of every structural node of a graph.
#[derive(Debug, Clone, Default)]
pub struct Placement {
    bounds: IndexMap<Id, Bounds>,
    containers: HashSet<Id>,
    feedback: HashSet<Id>,
    ranks: Vec<NodeRank>,
    lanes: Vec<LaneBand>,
}

impl Placement {
    /// Node rectangles in graph insertion order; owned ports are absent.
    pub fn bounds(&self) -> &IndexMap<Id, Bounds> {
        &self.bounds
    }

    pub fn into_bounds(self) -> IndexMap<Id, Bounds> {
        self.bounds
    }

    /// Nodes that have structural children drawn inside them.
    pub fn containers(&self) -> &HashSet<Id> {
        &self.containers
    }

    /// Graph edges that closed a cycle during ranking.
    pub fn feedback(&self) -> &HashSet<Id> {
        &self.feedback
    }

    pub fn ranks(&self) -> &[NodeRank] {
        &self.ranks
    }

    pub fn lanes(&self) -> &[LaneBand] {
        &self.lanes
    }
}

/// Lays out a graph scope by scope.
pub struct ScopeLayout<'a> {
    graph: &'a Graph,
    placer: &'a dyn ScopePlacer,
}

impl<'a> ScopeLayout<'a> {
    pub fn new(graph: &'a Graph, placer: &'a dyn ScopePlacer) -> Self {
        Self { graph, placer }
    }

    /// Places every structural node.
    ///
    /// `edges` are lifted to the innermost scope holding distinct ancestors of
    /// both endpoints; an edge between a node and its own ancestor is dropped.
    /// `fixed_groups` apply within whichever scope holds their members.
    pub fn place(&self, edges: &[PlacementEdge], fixed_groups: &[Vec<Id>]) -> Placement {
        let scopes = self.scopes_post_order();
        let lifted: Vec<(Option<Id>, Id, Id, Id)> = edges
            .iter()
            .filter_map(|edge| {
                self.lift(edge.from, edge.to)
                    .map(|(scope, from, to)| (scope, from, to, edge.edge))
            })
            .collect();

        let mut sizes: HashMap<Id, Size> = self
            .graph
            .nodes()
            .filter(|node| self.is_structural(node.id()))
            .map(|node| {
                let ports = self.graph.ports_of(node.id()).count();
                let extent = min_owner_extent(ports);
                (node.id(), intrinsic_size(node).max(Size::new(extent, extent)))
            })
            .collect();

        let mut local: HashMap<Option<Id>, (Vec<Id>, ScopeSolution)> = HashMap::new();
        let mut ranked = false;
        let mut feedback = HashSet::new();
        let mut containers = HashSet::new();

        for scope in &scopes {
            let members = self.members(*scope);
            let index: HashMap<Id, usize> =
                members.iter().enumerate().map(|(i, id)| (*id, i)).collect();

            let scope_edges: Vec<(usize, usize, Id)> = lifted
                .iter()
                .filter(|(edge_scope, ..)| edge_scope == scope)
                .filter_map(|(_, from, to, edge)| Some((*index.get(from)?, *index.get(to)?, *edge)))
                .collect();

            let problem = ScopeProblem {
                sizes: members
                    .iter()
                    .map(|id| sizes.get(id).copied().unwrap_or_default())
                    .collect(),
                edges: scope_edges.iter().map(|(from, to, _)| (*from, *to)).collect(),
                fixed_groups: fixed_groups
                    .iter()
                    .map(|group| group.iter().filter_map(|id| index.get(id).copied()).collect())
                    .collect(),
                lanes: members
                    .iter()
                    .map(|id| {
                        self.graph
                            .node(*id)
                            .and_then(|node| node.lane())
                            .map(str::to_string)
                    })
                    .collect(),
            };

            let solution = self.placer.place(&problem);
            ranked |= solution.ranks.is_some();
            for ((_, _, edge), is_feedback) in scope_edges.iter().zip(&solution.feedback) {
                if *is_feedback {
                    feedback.insert(*edge);
                }
            }

            if let Some(container) = scope {
                let content = content_size(&solution.bounds);
                let needed = content.add_padding(CONTAINER_PADDING);
                if let Some(size) = sizes.get_mut(container) {
                    *size = size.max(needed);
                }
                containers.insert(*container);
                trace!(
                    container:% = container,
                    members_count = members.len();
                    "Sized container from its content"
                );
            }

            local.insert(*scope, (members, solution));
        }

        let mut placement = self.resolve(&scopes, &local, containers, feedback);
        if ranked {
            self.rank_globally(edges, &local, &mut placement);
        }
        debug!(
            scopes_count = scopes.len(),
            nodes_count = placement.bounds.len(),
            feedback_count = placement.feedback.len();
            "Scopes placed"
        );
        placement
    }

    /// Turns per-scope placements into absolute ones, outermost scope first.
    fn resolve(
        &self,
        scopes: &[Option<Id>],
        local: &HashMap<Option<Id>, (Vec<Id>, ScopeSolution)>,
        containers: HashSet<Id>,
        feedback: HashSet<Id>,
    ) -> Placement {
        let mut absolute: HashMap<Id, Bounds> = HashMap::new();
        let mut lanes = Vec::new();

        for scope in scopes.iter().rev() {
            let Some((members, solution)) = local.get(scope) else {
                continue;
            };

            let offset = match scope {
                None => Point::default(),
                Some(container) => {
                    let Some(outer) = absolute.get(container).copied() else {
                        continue;
                    };
                    let content = content_size(&solution.bounds);
                    let inner_width = outer.width() - CONTAINER_PADDING.horizontal_sum();
                    let inner_height = outer.height() - CONTAINER_PADDING.vertical_sum();
                    Point::new(
                        outer.min_x() + CONTAINER_PADDING.left() + (inner_width - content.width()) / 2.0,
                        outer.min_y() + CONTAINER_PADDING.top() + (inner_height - content.height()) / 2.0,
                    )
                }
            };

            for (member, bounds) in members.iter().zip(&solution.bounds) {
                absolute.insert(*member, bounds.translate(offset));
            }
            for (name, band) in &solution.lanes {
                lanes.push(LaneBand::new(name.clone(), band.translate(offset)));
            }
        }

        let bounds: IndexMap<Id, Bounds> = self
            .graph
            .nodes()
            .filter_map(|node| absolute.get(&node.id()).map(|bounds| (node.id(), *bounds)))
            .collect();

        Placement {
            bounds,
            containers,
            feedback,
            ranks: Vec::new(),
            lanes,
        }
    }

    /// Ranks every placed node over the whole graph.
    ///
    /// Each edge links its own structural endpoints and, when they differ, the
    /// representatives it was lifted to. Scope-local ranks are floors, so nodes
    /// of one scope keep their bands where the edges allow it. Edges already
    /// drawn as feedback are skipped; an edge that still closes a cycle, through
    /// a container and its content for instance, becomes feedback as well.
    /// Orders count left to right by absolute center within each rank.
    fn rank_globally(
        &self,
        edges: &[PlacementEdge],
        local: &HashMap<Option<Id>, (Vec<Id>, ScopeSolution)>,
        placement: &mut Placement,
    ) {
        let nodes: Vec<Id> = placement.bounds.keys().copied().collect();
        let index: HashMap<Id, usize> = nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut floors = vec![0; nodes.len()];
        let mut local_order = vec![0; nodes.len()];
        for (members, solution) in local.values() {
            let Some(member_ranks) = &solution.ranks else {
                continue;
            };
            for (member, (rank, order)) in members.iter().zip(member_ranks) {
                if let Some(&i) = index.get(member) {
                    floors[i] = *rank;
                    local_order[i] = *order;
                }
            }
        }

        let mut links: Vec<(usize, usize)> = Vec::new();
        let mut owners: Vec<Option<Id>> = Vec::new();
        for edge in edges {
            if placement.feedback.contains(&edge.edge) {
                continue;
            }
            let from = self.structural(edge.from);
            let to = self.structural(edge.to);
            if let (Some(&from), Some(&to)) = (index.get(&from), index.get(&to))
                && from != to
            {
                links.push((from, to));
                owners.push(Some(edge.edge));
            }
            if let Some((_, rep_from, rep_to)) = self.lift(edge.from, edge.to)
                && let (Some(&rep_from), Some(&rep_to)) = (index.get(&rep_from), index.get(&rep_to))
                && links.last() != Some(&(rep_from, rep_to))
            {
                links.push((rep_from, rep_to));
                owners.push(None);
            }
        }

        let classes = classify_edges(nodes.len(), &links);
        let mut dag = Vec::with_capacity(links.len());
        for ((link, owner), class) in links.iter().zip(&owners).zip(&classes) {
            match (class, owner) {
                (EdgeClass::Tree, _) => dag.push(*link),
                (EdgeClass::Feedback, Some(edge)) => {
                    if placement.feedback.insert(*edge) {
                        trace!(edge:% = edge; "Edge closes a cycle across scopes");
                    }
                }
                _ => {}
            }
        }
        let ranks = longest_path_ranks(&floors, &dag);

        let centers: Vec<f32> = placement.bounds.values().map(|b| b.center().x()).collect();
        let mut by_position: Vec<usize> = (0..nodes.len()).collect();
        by_position.sort_by(|a, b| {
            ranks[*a]
                .cmp(&ranks[*b])
                .then(centers[*a].total_cmp(&centers[*b]))
                .then(local_order[*a].cmp(&local_order[*b]))
                .then(a.cmp(b))
        });
        let mut orders = vec![0; nodes.len()];
        let mut previous: Option<(usize, usize)> = None;
        for node in by_position {
            let order = match previous {
                Some((rank, order)) if rank == ranks[node] => order + 1,
                _ => 0,
            };
            orders[node] = order;
            previous = Some((ranks[node], order));
        }

        placement.ranks = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| NodeRank::new(*id, ranks[i], orders[i]))
            .collect();
        trace!(
            ranked_count = placement.ranks.len(),
            rank_count = ranks.iter().max().map_or(0, |max| max + 1);
            "Ranked globally"
        );
    }

    /// Owned ports are anchored on their owner instead of being placed.
    fn is_structural(&self, id: Id) -> bool {
        self.graph.node(id).is_some_and(|node| {
            !(node.kind().is_port() && self.graph.owner(id).is_some())
        })
    }

    /// Direct structural members of a scope, in declaration order.
    fn members(&self, scope: Option<Id>) -> Vec<Id> {
        match scope {
            None => self
                .graph
                .top_level_nodes()
                .map(|node| node.id())
                .filter(|id| self.is_structural(*id))
                .collect(),
            Some(container) => self
                .graph
                .node(container)
                .map(|node| {
                    node.children()
                        .iter()
                        .copied()
                        .filter(|id| self.is_structural(*id))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Containers innermost first; the root scope comes last.
    fn scopes_post_order(&self) -> Vec<Option<Id>> {
        let mut scopes = Vec::new();
        let mut stack: Vec<(Id, bool)> = self
            .members(None)
            .into_iter()
            .rev()
            .map(|id| (id, false))
            .collect();

        while let Some((id, expanded)) = stack.pop() {
            let children = self.members(Some(id));
            if children.is_empty() {
                continue;
            }
            if expanded {
                scopes.push(Some(id));
            } else {
                stack.push((id, true));
                stack.extend(children.into_iter().rev().map(|child| (child, false)));
            }
        }

        scopes.push(None);
        scopes
    }

    /// The innermost scope where `from` and `to` have distinct representatives.
    fn lift(&self, from: Id, to: Id) -> Option<(Option<Id>, Id, Id)> {
        let from_chain = self.chain(from);
        let to_chain = self.chain(to);

        for a in &from_chain {
            let scope = self.graph.owner(*a);
            if let Some(b) = to_chain.iter().find(|b| self.graph.owner(**b) == scope) {
                return (a != b).then_some((scope, *a, *b));
            }
        }
        None
    }

    /// The node itself, or the owner a port is anchored on.
    fn structural(&self, id: Id) -> Id {
        if self.is_structural(id) {
            id
        } else {
            self.graph.owner(id).unwrap_or(id)
        }
    }

    /// A node's structural self followed by its ancestors, nearest first.
    fn chain(&self, id: Id) -> Vec<Id> {
        let start = self.structural(id);
        let mut chain = vec![start];
        chain.extend(self.graph.ancestors(start));
        chain
    }
}

fn content_size(bounds: &[Bounds]) -> Size {
    bounds
        .iter()
        .copied()
        .reduce(|acc, b| acc.merge(&b))
        .map_or_else(Size::default, |extent| {
            Size::new(extent.max_x(), extent.max_y())
        })
}
