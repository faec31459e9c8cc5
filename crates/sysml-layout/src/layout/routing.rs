//! Edge routing.
//!
//! Routes run between the boundaries of their endpoint rectangles and try to
//! stay clear of every other node. Orthogonal routes are axis-aligned polylines
//! whose corners are rounded by the renderer; curved routes are cubic Bézier
//! curves; straight routes are single segments.
//!
//! Candidates are tried in a fixed order. When a candidate crosses an obstacle,
//! the crossed rectangles are collected and the next detour goes around all of
//! them. After [`MAX_DETOUR_ATTEMPTS`] the direct route is returned and flagged
//! as overlapping. Routing never fails.

use log::trace;

use sysml_layout_core::geometry::{Bounds, Point, Side};

use crate::{
    config::RoutingStyle,
    document::{EdgePath, cubic_point},
};

/// Upper bound on detours tried before falling back to the direct route.
pub const MAX_DETOUR_ATTEMPTS: usize = 8;

/// Distance kept between a detour and the rectangles it avoids.
const CLEARANCE: f32 = 12.0;
/// How far a loop sticks out to the right of its node.
const LOOP_EXTENT: f32 = 24.0;
/// Sideways offset of a feedback curve.
const BOW: f32 = 40.0;
/// Samples per Bézier segment when checking for crossings.
const CURVE_SAMPLES: usize = 16;

/// A routed path and whether it had to cross an obstacle.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: EdgePath,
    pub overlap: bool,
}

/// Per-edge routing options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteOptions {
    /// The edge closes a cycle and should be drawn as a back-edge.
    pub feedback: bool,
    /// A fixed start point on the source boundary.
    pub exit: Option<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Vertical,
    Horizontal,
}

/// Routes edges in one style.
#[derive(Debug, Clone)]
pub struct Router {
    style: RoutingStyle,
    corner_radius: f32,
}

impl Router {
    pub fn new(style: RoutingStyle, corner_radius: f32) -> Self {
        Self {
            style,
            corner_radius,
        }
    }

    /// Routes between two rectangles around `obstacles`.
    pub fn route(
        &self,
        source: Bounds,
        target: Bounds,
        obstacles: &[Bounds],
        options: RouteOptions,
    ) -> Route {
        // Back-edges bow out whatever the style so they never retrace a forward edge.
        if options.feedback {
            return self.feedback_curve(source, target, obstacles);
        }
        match self.style {
            RoutingStyle::Straight => self.straight(source, target, obstacles),
            RoutingStyle::Orthogonal => self.orthogonal(source, target, obstacles, options),
            RoutingStyle::Curved => self.curved(source, target, obstacles, options),
        }
    }

    /// A small loop on the right side of a node.
    pub fn self_loop(&self, bounds: Bounds, obstacles: &[Bounds]) -> Route {
        let center = bounds.center();
        let half = (bounds.height() / 4.0).min(CLEARANCE);
        let start = Point::new(bounds.max_x(), center.y() - half);
        let end = Point::new(bounds.max_x(), center.y() + half);
        let path = self.loop_path(start, end, LOOP_EXTENT);
        let overlap = path_crosses(&path, obstacles);
        Route { path, overlap }
    }

    /// A loop that leaves `start` to the right and comes back at `end`.
    pub fn loop_path(&self, start: Point, end: Point, extent: f32) -> EdgePath {
        let right = start.x().max(end.x()) + extent;
        match self.style {
            RoutingStyle::Curved => EdgePath::Bezier {
                points: vec![
                    start,
                    Point::new(right + extent / 2.0, start.y()),
                    Point::new(right + extent / 2.0, end.y()),
                    end,
                ],
            },
            RoutingStyle::Orthogonal | RoutingStyle::Straight => self.polyline(vec![
                start,
                Point::new(right, start.y()),
                Point::new(right, end.y()),
                end,
            ]),
        }
    }

    pub fn polyline(&self, points: Vec<Point>) -> EdgePath {
        EdgePath::Polyline {
            points: simplify(points),
            corner_radius: self.corner_radius,
        }
    }

    fn straight(&self, source: Bounds, target: Bounds, obstacles: &[Bounds]) -> Route {
        let (start, _) = source.nearest_boundary_point(target.center());
        let (end, _) = target.nearest_boundary_point(source.center());
        let points = vec![start, end];
        let overlap = polyline_crosses(&points, obstacles);
        Route {
            path: self.polyline(points),
            overlap,
        }
    }

    fn orthogonal(
        &self,
        source: Bounds,
        target: Bounds,
        obstacles: &[Bounds],
        options: RouteOptions,
    ) -> Route {
        let axis = if options.exit.is_some() {
            Axis::Vertical
        } else {
            main_axis(source, target)
        };

        let (points, overlap) = match axis {
            Axis::Vertical => {
                let (start, end) = vertical_anchors(source, target);
                vertical_route(options.exit.unwrap_or(start), end, obstacles)
            }
            Axis::Horizontal => {
                let source = transpose_bounds(source);
                let target = transpose_bounds(target);
                let obstacles: Vec<Bounds> = obstacles.iter().copied().map(transpose_bounds).collect();
                let (start, end) = vertical_anchors(source, target);
                let (points, overlap) = vertical_route(start, end, &obstacles);
                (points.into_iter().map(transpose_point).collect(), overlap)
            }
        };

        if overlap {
            trace!(attempts = MAX_DETOUR_ATTEMPTS; "No clear orthogonal route, using direct route");
        }
        Route {
            path: self.polyline(points),
            overlap,
        }
    }

    fn curved(
        &self,
        source: Bounds,
        target: Bounds,
        obstacles: &[Bounds],
        options: RouteOptions,
    ) -> Route {
        let axis = main_axis(source, target);
        let (start, end) = match axis {
            Axis::Vertical => vertical_anchors(source, target),
            Axis::Horizontal => {
                let (start, end) =
                    vertical_anchors(transpose_bounds(source), transpose_bounds(target));
                (transpose_point(start), transpose_point(end))
            }
        };
        let start = options.exit.unwrap_or(start);

        let candidate = |offset: f32| {
            let (c1, c2) = match axis {
                Axis::Vertical => {
                    let half = (end.y() - start.y()) / 2.0;
                    (
                        Point::new(start.x() + offset, start.y() + half),
                        Point::new(end.x() + offset, end.y() - half),
                    )
                }
                Axis::Horizontal => {
                    let half = (end.x() - start.x()) / 2.0;
                    (
                        Point::new(start.x() + half, start.y() + offset),
                        Point::new(end.x() - half, end.y() + offset),
                    )
                }
            };
            EdgePath::Bezier {
                points: vec![start, c1, c2, end],
            }
        };

        // Bow alternately to one side and the other, further each attempt.
        for attempt in 0..=MAX_DETOUR_ATTEMPTS {
            let step = attempt.div_ceil(2) as f32 * BOW;
            let offset = if attempt % 2 == 1 { step } else { -step };
            let path = candidate(offset);
            if !path_crosses(&path, obstacles) {
                return Route {
                    path,
                    overlap: false,
                };
            }
        }

        Route {
            path: candidate(0.0),
            overlap: true,
        }
    }

    /// A back-edge bowing out to the right of both endpoints.
    fn feedback_curve(&self, source: Bounds, target: Bounds, obstacles: &[Bounds]) -> Route {
        let start = source.side_midpoint(Side::Right);
        let end = target.side_midpoint(Side::Right);
        let candidate = |bow: f32| {
            let x = start.x().max(end.x()) + bow;
            EdgePath::Bezier {
                points: vec![start, Point::new(x, start.y()), Point::new(x, end.y()), end],
            }
        };

        for attempt in 0..MAX_DETOUR_ATTEMPTS {
            let path = candidate(BOW * (attempt + 1) as f32);
            if !path_crosses(&path, obstacles) {
                return Route {
                    path,
                    overlap: false,
                };
            }
        }

        Route {
            path: candidate(BOW),
            overlap: true,
        }
    }
}

/// Vertical when the rectangles are separated more vertically than horizontally.
fn main_axis(source: Bounds, target: Bounds) -> Axis {
    let vertical_gap = (target.min_y() - source.max_y()).max(source.min_y() - target.max_y());
    let horizontal_gap = (target.min_x() - source.max_x()).max(source.min_x() - target.max_x());
    if vertical_gap >= horizontal_gap {
        Axis::Vertical
    } else {
        Axis::Horizontal
    }
}

/// Bottom-to-top anchors when the target lies below, top-to-bottom otherwise.
fn vertical_anchors(source: Bounds, target: Bounds) -> (Point, Point) {
    if target.center().y() >= source.center().y() {
        (
            source.side_midpoint(Side::Bottom),
            target.side_midpoint(Side::Top),
        )
    } else {
        (
            source.side_midpoint(Side::Top),
            target.side_midpoint(Side::Bottom),
        )
    }
}

/// Finds an axis-aligned route that leaves and enters vertically.
fn vertical_route(start: Point, end: Point, obstacles: &[Bounds]) -> (Vec<Point>, bool) {
    let z_route = |y: f32| {
        vec![
            start,
            Point::new(start.x(), y),
            Point::new(end.x(), y),
            end,
        ]
    };

    let mid = (start.y() + end.y()) / 2.0;
    let step = (end.y() - start.y()).abs() / 6.0;
    for k in [0.0, 1.0, -1.0, 2.0, -2.0] {
        let candidate = z_route(mid + k * step);
        if crossed(&candidate, obstacles).is_empty() {
            return (candidate, false);
        }
    }

    let direction = if end.y() >= start.y() { 1.0 } else { -1.0 };
    let exit_y = start.y() + direction * CLEARANCE;
    let entry_y = end.y() - direction * CLEARANCE;
    let detour = |x: f32| {
        vec![
            start,
            Point::new(start.x(), exit_y),
            Point::new(x, exit_y),
            Point::new(x, entry_y),
            Point::new(end.x(), entry_y),
            end,
        ]
    };

    let mut blocking: Vec<usize> = crossed(&z_route(mid), obstacles);
    for _ in 0..MAX_DETOUR_ATTEMPTS {
        let Some(extent) = blocking
            .iter()
            .map(|index| obstacles[*index])
            .reduce(|acc, bounds| acc.merge(&bounds))
        else {
            break;
        };
        let right = extent.max_x().max(start.x()).max(end.x()) + CLEARANCE;
        let left = extent.min_x().min(start.x()).min(end.x()) - CLEARANCE;

        let mut grew = false;
        for x in [right, left] {
            let candidate = detour(x);
            let crossers = crossed(&candidate, obstacles);
            if crossers.is_empty() {
                return (candidate, false);
            }
            for index in crossers {
                if !blocking.contains(&index) {
                    blocking.push(index);
                    grew = true;
                }
            }
        }
        if !grew {
            break;
        }
    }

    (z_route(mid), true)
}

/// Indices of the obstacles crossed by a polyline, in obstacle order.
fn crossed(points: &[Point], obstacles: &[Bounds]) -> Vec<usize> {
    obstacles
        .iter()
        .enumerate()
        .filter(|(_, obstacle)| {
            points
                .windows(2)
                .any(|segment| obstacle.segment_crosses(segment[0], segment[1]))
        })
        .map(|(index, _)| index)
        .collect()
}

fn polyline_crosses(points: &[Point], obstacles: &[Bounds]) -> bool {
    !crossed(points, obstacles).is_empty()
}

/// Checks a path against obstacles, sampling curves into short segments.
pub fn path_crosses(path: &EdgePath, obstacles: &[Bounds]) -> bool {
    match path {
        EdgePath::Polyline { points, .. } => polyline_crosses(points, obstacles),
        EdgePath::Bezier { points } => {
            let sampled: Vec<Point> = points
                .windows(4)
                .step_by(3)
                .flat_map(|control| {
                    let control = [control[0], control[1], control[2], control[3]];
                    (0..=CURVE_SAMPLES).map(move |i| cubic_point(control, i as f32 / CURVE_SAMPLES as f32))
                })
                .collect();
            polyline_crosses(&sampled, obstacles)
        }
    }
}

/// Drops repeated points and the middle of three collinear points.
fn simplify(points: Vec<Point>) -> Vec<Point> {
    let mut simplified: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        if simplified.last() == Some(&point) {
            continue;
        }
        if let [.., a, b] = simplified.as_slice()
            && ((a.x() == b.x() && b.x() == point.x()) || (a.y() == b.y() && b.y() == point.y()))
        {
            simplified.pop();
        }
        simplified.push(point);
    }
    simplified
}

fn transpose_point(point: Point) -> Point {
    Point::new(point.y(), point.x())
}

fn transpose_bounds(bounds: Bounds) -> Bounds {
    Bounds::from_corners(
        Point::new(bounds.min_y(), bounds.min_x()),
        Point::new(bounds.max_y(), bounds.max_x()),
    )
}

#[cfg(test)]
mod tests {
    use sysml_layout_core::geometry::Size;

    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h))
    }

    fn orthogonal() -> Router {
        Router::new(RoutingStyle::Orthogonal, 4.0)
    }

    fn assert_axis_aligned(points: &[Point]) {
        for segment in points.windows(2) {
            assert!(
                segment[0].x() == segment[1].x() || segment[0].y() == segment[1].y(),
                "diagonal segment {segment:?}"
            );
        }
    }

    #[test]
    fn test_z_route_between_offset_boxes() {
        let route = orthogonal().route(
            rect(0.0, 0.0, 100.0, 40.0),
            rect(200.0, 140.0, 100.0, 40.0),
            &[],
            RouteOptions::default(),
        );

        assert!(!route.overlap);
        assert_eq!(
            route.path.points(),
            [
                Point::new(50.0, 40.0),
                Point::new(50.0, 90.0),
                Point::new(250.0, 90.0),
                Point::new(250.0, 140.0),
            ]
        );
    }

    #[test]
    fn test_aligned_boxes_get_straight_route() {
        let route = orthogonal().route(
            rect(0.0, 0.0, 100.0, 40.0),
            rect(0.0, 100.0, 100.0, 40.0),
            &[],
            RouteOptions::default(),
        );
        assert_eq!(
            route.path.points(),
            [Point::new(50.0, 40.0), Point::new(50.0, 100.0)]
        );
    }

    #[test]
    fn test_horizontal_route() {
        let route = orthogonal().route(
            rect(0.0, 0.0, 40.0, 40.0),
            rect(200.0, 0.0, 40.0, 40.0),
            &[],
            RouteOptions::default(),
        );
        assert_eq!(
            route.path.points(),
            [Point::new(40.0, 20.0), Point::new(200.0, 20.0)]
        );
    }

    #[test]
    fn test_detour_around_obstacle() {
        let obstacle = rect(0.0, 100.0, 100.0, 40.0);
        let route = orthogonal().route(
            rect(0.0, 0.0, 100.0, 40.0),
            rect(0.0, 200.0, 100.0, 40.0),
            &[obstacle],
            RouteOptions::default(),
        );

        assert!(!route.overlap);
        assert_axis_aligned(route.path.points());
        for segment in route.path.points().windows(2) {
            assert!(!obstacle.segment_crosses(segment[0], segment[1]));
        }
    }

    #[test]
    fn test_unavoidable_overlap_falls_back_to_direct_route() {
        let target = rect(0.0, 100.0, 10.0, 10.0);
        let enclosure = rect(-50.0, 80.0, 110.0, 60.0);
        let route = orthogonal().route(
            rect(0.0, 0.0, 10.0, 10.0),
            target,
            &[enclosure],
            RouteOptions::default(),
        );

        assert!(route.overlap);
        assert_eq!(route.path.points().first(), Some(&Point::new(5.0, 10.0)));
        assert_eq!(route.path.points().last(), Some(&Point::new(5.0, 100.0)));
    }

    #[test]
    fn test_fixed_exit_point() {
        let exit = Point::new(30.0, 40.0);
        let route = orthogonal().route(
            rect(0.0, 0.0, 100.0, 40.0),
            rect(0.0, 100.0, 100.0, 40.0),
            &[],
            RouteOptions {
                exit: Some(exit),
                ..RouteOptions::default()
            },
        );
        assert_eq!(route.path.points().first(), Some(&exit));
        assert_axis_aligned(route.path.points());
    }

    #[test]
    fn test_feedback_curve_bows_right() {
        let source = rect(0.0, 100.0, 100.0, 40.0);
        let target = rect(0.0, 0.0, 100.0, 40.0);
        let route = Router::new(RoutingStyle::Curved, 4.0).route(
            source,
            target,
            &[],
            RouteOptions {
                feedback: true,
                ..RouteOptions::default()
            },
        );

        assert!(route.path.is_curved());
        let points = route.path.points();
        assert_eq!(points.len(), 4);
        assert!(points[1].x() > 100.0 && points[2].x() > 100.0);
    }

    #[test]
    fn test_feedback_is_curved_in_every_style() {
        let source = rect(0.0, 100.0, 100.0, 40.0);
        let target = rect(0.0, 0.0, 100.0, 40.0);
        let options = RouteOptions {
            feedback: true,
            ..RouteOptions::default()
        };

        for style in [RoutingStyle::Orthogonal, RoutingStyle::Straight, RoutingStyle::Curved] {
            let router = Router::new(style, 4.0);
            let back = router.route(source, target, &[], options);
            let forward = router.route(target, source, &[], RouteOptions::default());

            assert!(back.path.is_curved(), "{style:?}");
            assert_ne!(back.path.points(), forward.path.points(), "{style:?}");
        }
    }

    #[test]
    fn test_curved_route_has_single_segment() {
        let route = Router::new(RoutingStyle::Curved, 4.0).route(
            rect(0.0, 0.0, 100.0, 40.0),
            rect(150.0, 200.0, 100.0, 40.0),
            &[],
            RouteOptions::default(),
        );
        assert!(!route.overlap);
        assert_eq!(route.path.points().len(), 4);
    }

    #[test]
    fn test_self_loop_right_of_node() {
        let bounds = rect(0.0, 0.0, 100.0, 40.0);
        let route = orthogonal().self_loop(bounds, &[]);
        let points = route.path.points();

        assert_eq!(points.len(), 4);
        assert_eq!(points[0].x(), 100.0);
        assert_eq!(points[3].x(), 100.0);
        assert!(points[1].x() > 100.0);
        assert!(points[0].y() < points[3].y());
    }

    #[test]
    fn test_simplify_drops_collinear_points() {
        let points = simplify(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 20.0),
            Point::new(5.0, 20.0),
        ]);
        assert_eq!(
            points,
            [Point::new(0.0, 0.0), Point::new(0.0, 20.0), Point::new(5.0, 20.0)]
        );
    }
}
