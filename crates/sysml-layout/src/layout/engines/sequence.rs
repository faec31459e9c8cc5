//! Sequence diagrams.
//!
//! Lifelines are placed left to right in declaration order, with extra room
//! between neighbours whose messages carry wide labels. Messages are sorted by
//! their sequencing index (stable, so equal indices keep input order) and each
//! gets its own row below the lifeline headers. A message to its own lifeline is
//! drawn as a loop to the right.

use indexmap::IndexMap;
use log::{debug, trace};

use sysml_layout_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
    model::{DiagramKind, Edge, Graph},
};

use super::DiagramEngine;
use crate::{
    config::LayoutConfig,
    document::{
        DocumentBuilder, LayoutDocument, LifelineTrack, MessageSlot, OrderingMetadata, PlacedNode,
        RoutedEdge,
    },
    error::{LayoutError, SequencingError},
    layout::{
        routing::Router,
        sizing::{intrinsic_size, text_size},
    },
};

pub struct Engine {
    config: LayoutConfig,
    router: Router,
    label_padding: f32,
}

impl Engine {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            config: config.clone(),
            router: Router::new(
                config.routing_style_for(DiagramKind::Sequence),
                config.corner_radius(),
            ),
            label_padding: 20.0,
        }
    }

    /// Room needed between two neighbouring lifelines for the labels of the
    /// messages exchanged between them.
    fn message_label_spacing(&self, messages: &[&Edge], left: Id, right: Id) -> f32 {
        messages
            .iter()
            .filter(|edge| {
                (edge.source() == left && edge.target() == right)
                    || (edge.source() == right && edge.target() == left)
            })
            .filter_map(|edge| edge.label())
            .map(|label| text_size(label).width() + self.label_padding)
            .fold(0.0, f32::max)
    }
}

/// Checks every message has an index and that no index is used by two
/// messages going opposite ways between the same lifelines.
fn validate_sequencing(messages: &[&Edge]) -> Result<(), SequencingError> {
    let mut by_index: IndexMap<u32, Vec<&Edge>> = IndexMap::new();
    for &edge in messages {
        let index = edge
            .sequence()
            .ok_or(SequencingError::MissingIndex { edge: edge.id() })?;
        by_index.entry(index).or_default().push(edge);
    }

    for (index, edges) in &by_index {
        for (i, first) in edges.iter().enumerate() {
            let opposite = edges[i + 1..].iter().find(|second| {
                !first.is_self_loop()
                    && second.source() == first.target()
                    && second.target() == first.source()
            });
            if let Some(second) = opposite {
                return Err(SequencingError::ConflictingDirection {
                    index: *index,
                    first: first.id(),
                    second: second.id(),
                });
            }
        }
    }
    Ok(())
}

/// Centers of elements laid out in a row, each gap at least `min_spacing` or
/// the matching entry of `extra_spacings`, whichever is larger.
fn distribute_horizontally(sizes: &[Size], min_spacing: f32, extra_spacings: &[f32]) -> Vec<f32> {
    let mut positions = Vec::with_capacity(sizes.len());
    let mut x = 0.0_f32;
    for (i, size) in sizes.iter().enumerate() {
        if i == 0 {
            x += size.width() / 2.0;
        } else {
            let spacing = min_spacing.max(extra_spacings.get(i - 1).copied().unwrap_or(0.0));
            x += sizes[i - 1].width() / 2.0 + spacing + size.width() / 2.0;
        }
        positions.push(x);
    }
    positions
}

impl DiagramEngine for Engine {
    fn calculate(&self, graph: &Graph) -> Result<LayoutDocument, LayoutError> {
        let mut messages: Vec<&Edge> = graph.edges().iter().collect();
        validate_sequencing(&messages)?;
        messages.sort_by_key(|edge| edge.sequence().unwrap_or(u32::MAX));

        let lifelines: Vec<Id> = graph.nodes().map(|node| node.id()).collect();
        let sizes: Vec<Size> = graph.nodes().map(intrinsic_size).collect();
        let spacings: Vec<f32> = lifelines
            .windows(2)
            .map(|pair| self.message_label_spacing(&messages, pair[0], pair[1]))
            .collect();
        let centers = distribute_horizontally(&sizes, self.config.node_spacing(), &spacings);

        let header_height = sizes.iter().map(|size| size.height()).fold(0.0, f32::max);
        let headers: IndexMap<Id, Bounds> = lifelines
            .iter()
            .zip(&sizes)
            .zip(&centers)
            .map(|((id, size), x)| {
                let top_left = Point::new(x - size.width() / 2.0, 0.0);
                (*id, Bounds::new_from_top_left(top_left, *size))
            })
            .collect();
        let x_of: IndexMap<Id, f32> = lifelines.iter().copied().zip(centers.iter().copied()).collect();

        let spacing = self.config.message_spacing();
        let mut y = header_height + spacing;
        let mut slots = Vec::with_capacity(messages.len());
        let mut routed: Vec<(Id, RoutedEdge)> = Vec::with_capacity(messages.len());

        for edge in &messages {
            let (Some(source_x), Some(target_x)) =
                (x_of.get(&edge.source()).copied(), x_of.get(&edge.target()).copied())
            else {
                continue;
            };
            let start = Point::new(source_x, y);
            let path = if edge.is_self_loop() {
                trace!(message:% = edge.id(), y; "Self message");
                self.router
                    .loop_path(start, Point::new(source_x, y + spacing / 2.0), spacing / 2.0)
            } else {
                self.router.polyline(vec![start, Point::new(target_x, y)])
            };

            slots.push(MessageSlot::new(
                edge.id(),
                edge.sequence().unwrap_or_default(),
                y,
            ));
            routed.push((edge.id(), RoutedEdge::new(edge, path)));
            y += spacing;
        }

        let tracks = lifelines
            .iter()
            .map(|id| {
                let x = x_of.get(id).copied().unwrap_or_default();
                let top = headers.get(id).map_or(0.0, |bounds| bounds.max_y());
                LifelineTrack::new(*id, x, top, y)
            })
            .collect();
        debug!(
            lifelines_count = lifelines.len(),
            messages_count = slots.len();
            "Sequence diagram laid out"
        );

        let mut builder = DocumentBuilder::new(graph.diagram(), self.config.margin());
        for node in graph.nodes() {
            if let Some(bounds) = headers.get(&node.id()) {
                builder.add_node(PlacedNode::new(node, *bounds, graph.owner(node.id()), 0));
            }
        }
        // Edges keep graph declaration order in the document.
        for edge in graph.edges() {
            if let Some(position) = routed.iter().position(|(id, _)| *id == edge.id()) {
                builder.add_edge(routed.swap_remove(position).1);
            }
        }
        builder.set_ordering(OrderingMetadata::default().with_sequence(tracks, slots));
        Ok(builder.build())
    }
}
