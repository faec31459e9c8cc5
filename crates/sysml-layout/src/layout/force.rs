//! Force-directed placement
//!
//! A spring embedder: every pair of nodes repels, every edge pulls its
//! endpoints together, and velocities are damped each step. Nodes start on a
//! circle in insertion order and each step's displacement is capped and cooled
//! so the run is deterministic for a fixed iteration count. A final sweep
//! pushes apart any rectangles that still overlap.

use std::f32::consts::TAU;

use log::{debug, trace};

use sysml_layout_core::geometry::{Bounds, Insets, Point, Size};

/// Force-directed layout engine.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    // Simulation parameters
    iterations: usize,
    spring_constant: f32,
    repulsion_constant: f32,
    damping_factor: f32,
    max_displacement: f32,
    // Used for maintaining distance between nodes
    min_distance: f32,
}

impl ForceLayout {
    pub fn new(iterations: usize, min_distance: f32) -> Self {
        Self {
            iterations,
            spring_constant: 0.1,
            repulsion_constant: 1000.0,
            damping_factor: 0.85,
            max_displacement: 50.0,
            min_distance,
        }
    }

    /// Places nodes with the given sizes; edges are pairs of node indices.
    ///
    /// The returned rectangles never overlap and the layout starts at `(0, 0)`.
    pub fn layout(&self, sizes: &[Size], edges: &[(usize, usize)]) -> Vec<Bounds> {
        if sizes.is_empty() {
            return Vec::new();
        }

        let centers = self.run_force_simulation(sizes, edges);
        let bounds = self.remove_overlaps(sizes, &centers);
        normalize(bounds)
    }

    /// Places nodes evenly on a circle large enough to hold them side by side.
    fn initialize_positions(&self, sizes: &[Size]) -> Vec<Point> {
        let n = sizes.len();
        if n == 1 {
            return vec![Point::default()];
        }

        let circumference: f32 = sizes
            .iter()
            .map(|size| size.width().max(size.height()) + self.min_distance)
            .sum();
        let radius = (circumference / TAU).max(self.min_distance);

        (0..n)
            .map(|i| {
                let angle = TAU * i as f32 / n as f32 - TAU / 4.0;
                Point::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect()
    }

    fn run_force_simulation(&self, sizes: &[Size], edges: &[(usize, usize)]) -> Vec<Point> {
        let n = sizes.len();
        let mut positions = self.initialize_positions(sizes);
        let mut velocities = vec![Point::default(); n];

        for iteration in 0..self.iterations {
            let mut forces = vec![Point::default(); n];

            // Repulsion between all pairs
            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let trans = positions[i].sub_point(positions[j]);

                    // Minimum distance based on node sizes plus spacing
                    let min_dist = (sizes[i].width()
                        + sizes[j].width()
                        + sizes[i].height()
                        + sizes[j].height())
                        / 4.0
                        + self.min_distance;

                    let distance = trans.hypot().max(1.0);

                    // Stronger repulsion when nodes are too close
                    let force_factor = if distance < min_dist {
                        self.repulsion_constant * (min_dist / distance).powf(2.0)
                    } else {
                        self.repulsion_constant / distance
                    };

                    forces[i] = forces[i].add_point(trans.scale(force_factor / distance));
                }
            }

            // Springs along edges
            for &(source, target) in edges {
                if source == target {
                    continue;
                }
                let dist = positions[source].sub_point(positions[target]);
                // Spring force proportional to distance
                let pull = dist.scale(self.spring_constant);

                forces[source] = forces[source].sub_point(pull);
                forces[target] = forces[target].add_point(pull);
            }

            // Cooling keeps late steps small
            let cooling = 1.0 - iteration as f32 / self.iterations as f32;
            let cap = (self.max_displacement * cooling).max(1.0);

            for i in 0..n {
                let mut velocity = velocities[i].add_point(forces[i]).scale(self.damping_factor);
                let speed = velocity.hypot();
                if speed > cap {
                    velocity = velocity.scale(cap / speed);
                }
                velocities[i] = velocity;
                positions[i] = positions[i].add_point(velocity);
            }
        }

        debug!(
            nodes_count = n,
            edges_count = edges.len(),
            iterations = self.iterations;
            "Force simulation finished"
        );
        positions
    }

    /// Sweeps nodes left to right and shifts each one right past any placed
    /// rectangle it collides with.
    fn remove_overlaps(&self, sizes: &[Size], centers: &[Point]) -> Vec<Bounds> {
        let gap = self.min_distance / 2.0;
        let mut order: Vec<usize> = (0..sizes.len()).collect();
        order.sort_by(|a, b| centers[*a].x().total_cmp(&centers[*b].x()).then(a.cmp(b)));

        let mut placed: Vec<Option<Bounds>> = vec![None; sizes.len()];
        for &node in &order {
            let mut bounds = Bounds::new_from_center(centers[node], sizes[node]);
            let others: Vec<Bounds> = placed.iter().flatten().copied().collect();

            // Each shift moves past one placed rectangle for good.
            for _ in 0..=others.len() {
                let padded = bounds.add_padding(Insets::uniform(gap));
                let Some(blocker) = others.iter().find(|other| padded.overlaps(other)) else {
                    break;
                };
                let shift = blocker.max_x() + gap - bounds.min_x();
                trace!(node, shift; "Shifting node out of overlap");
                bounds = bounds.translate(Point::new(shift, 0.0));
            }
            placed[node] = Some(bounds);
        }

        placed.into_iter().flatten().collect()
    }
}

/// Moves the layout so its top-left corner is `(0, 0)`.
pub(crate) fn normalize(bounds: Vec<Bounds>) -> Vec<Bounds> {
    let Some(extent) = bounds.iter().copied().reduce(|acc, b| acc.merge(&b)) else {
        return bounds;
    };
    let offset = Point::new(-extent.min_x(), -extent.min_y());
    bounds.into_iter().map(|b| b.translate(offset)).collect()
}
