//! Port anchoring on the perimeter of the owning block.
//!
//! Ports are small squares placed inside their owner's rectangle, flush with
//! one of its sides. The corners are kept free so ports on adjacent sides never
//! touch. Owners are enlarged beforehand with [`min_owner_extent`] so every port
//! of a block fits on any single side.

use sysml_layout_core::{
    geometry::{Bounds, Point, Side},
    identifier::Id,
};

use super::sizing::PORT_SIZE;

/// Minimum distance between two ports on the same side.
const PORT_GAP: f32 = 8.0;

const SIDES: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

/// A port to anchor, with the point it should face if it is connected.
#[derive(Debug, Clone, Copy)]
pub struct PortRequest {
    pub port: Id,
    pub toward: Option<Point>,
}

/// Side length an owner needs so `count` ports fit on one side.
pub fn min_owner_extent(count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    (count + 2) as f32 * PORT_SIZE + (count + 1) as f32 * PORT_GAP
}

/// Places every port on the side nearest the point it faces, spreading the
/// ports of each side evenly in request order. Unconnected ports go left.
pub fn distribute(owner: Bounds, requests: &[PortRequest]) -> Vec<(Id, Bounds)> {
    let sides: Vec<Side> = requests
        .iter()
        .map(|request| {
            request
                .toward
                .map_or(Side::Left, |toward| owner.nearest_boundary_point(toward).1)
        })
        .collect();

    let mut placed: Vec<Option<Bounds>> = vec![None; requests.len()];
    for side in SIDES {
        let members: Vec<usize> = (0..requests.len()).filter(|i| sides[*i] == side).collect();
        let (start, end) = usable_span(owner, side);
        let free = (end - start - members.len() as f32 * PORT_SIZE).max(0.0);
        let gap = free / (members.len() + 1) as f32;

        for (k, &index) in members.iter().enumerate() {
            let along = start + gap * (k + 1) as f32 + PORT_SIZE * k as f32 + PORT_SIZE / 2.0;
            placed[index] = Some(port_bounds(owner, side, along));
        }
    }

    collect(requests, placed)
}

/// Snaps every port to the boundary point nearest the point it faces, then
/// pushes ports sharing a side apart. Unconnected ports face the left side.
pub fn snap(owner: Bounds, requests: &[PortRequest]) -> Vec<(Id, Bounds)> {
    let snapped: Vec<(Side, f32)> = requests
        .iter()
        .map(|request| {
            let toward = request
                .toward
                .unwrap_or_else(|| owner.side_midpoint(Side::Left).with_x(f32::NEG_INFINITY));
            let (point, side) = owner.nearest_boundary_point(toward);
            let along = if side.is_horizontal() {
                point.x()
            } else {
                point.y()
            };
            (side, along)
        })
        .collect();

    let mut placed: Vec<Option<Bounds>> = vec![None; requests.len()];
    for side in SIDES {
        let mut members: Vec<(usize, f32)> = snapped
            .iter()
            .enumerate()
            .filter(|(_, (s, _))| *s == side)
            .map(|(index, (_, along))| (index, *along))
            .collect();
        members.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let wanted: Vec<f32> = members.iter().map(|(_, along)| *along).collect();
        for ((index, _), along) in members.iter().zip(spread(owner, side, &wanted)) {
            placed[*index] = Some(port_bounds(owner, side, along));
        }
    }

    collect(requests, placed)
}

fn collect(requests: &[PortRequest], placed: Vec<Option<Bounds>>) -> Vec<(Id, Bounds)> {
    requests
        .iter()
        .zip(placed)
        .filter_map(|(request, bounds)| bounds.map(|bounds| (request.port, bounds)))
        .collect()
}

/// Clamps sorted port centers into the usable span of a side and enforces the
/// minimum gap, first forwards then backwards.
fn spread(owner: Bounds, side: Side, wanted: &[f32]) -> Vec<f32> {
    let (start, end) = usable_span(owner, side);
    let first = start + PORT_SIZE / 2.0;
    let last = (end - PORT_SIZE / 2.0).max(first);
    let step = PORT_SIZE + PORT_GAP;

    let mut centers: Vec<f32> = wanted.iter().map(|along| along.clamp(first, last)).collect();
    for i in 1..centers.len() {
        centers[i] = centers[i].max(centers[i - 1] + step);
    }
    if let Some(tail) = centers.last_mut() {
        *tail = tail.min(last);
    }
    for i in (0..centers.len().saturating_sub(1)).rev() {
        centers[i] = centers[i].min(centers[i + 1] - step);
    }
    centers
}

/// The stretch of a side ports may occupy, corners excluded.
fn usable_span(owner: Bounds, side: Side) -> (f32, f32) {
    if side.is_horizontal() {
        (owner.min_x() + PORT_SIZE, owner.max_x() - PORT_SIZE)
    } else {
        (owner.min_y() + PORT_SIZE, owner.max_y() - PORT_SIZE)
    }
}

/// A port square flush with `side`, centered at `along` on that side.
///
/// The flush edge is copied from the owner so containment holds exactly.
fn port_bounds(owner: Bounds, side: Side, along: f32) -> Bounds {
    let half = PORT_SIZE / 2.0;
    let (min, max) = match side {
        Side::Top => (
            Point::new(along - half, owner.min_y()),
            Point::new(along + half, owner.min_y() + PORT_SIZE),
        ),
        Side::Bottom => (
            Point::new(along - half, owner.max_y() - PORT_SIZE),
            Point::new(along + half, owner.max_y()),
        ),
        Side::Left => (
            Point::new(owner.min_x(), along - half),
            Point::new(owner.min_x() + PORT_SIZE, along + half),
        ),
        Side::Right => (
            Point::new(owner.max_x() - PORT_SIZE, along - half),
            Point::new(owner.max_x(), along + half),
        ),
    };
    Bounds::from_corners(min, max)
}
