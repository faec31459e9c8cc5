//! Geometric primitives for diagram layout and positioning.
//!
//! This module provides fundamental geometric types used by the layout engine
//! for calculating positions, sizes, and bounding boxes of diagram elements.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//! - [`Insets`] - Padding/margin values for four sides
//! - [`Side`] - One of the four sides of a rectangle
//!
//! # Coordinate System
//!
//! Layout documents use a coordinate system consistent with SVG:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner at `(0, 0)`
//! - **X-axis**: Increases rightward
//! - **Y-axis**: Increases downward

use serde::{Serialize, Serializer, ser::SerializeStruct};

/// Tolerance used when deciding whether a segment enters the interior of a box.
const INTERIOR_EPSILON: f32 = 0.5;

/// A 2D point representing a position in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use sysml_layout_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Calculates the hypotenuse (Euclidean distance from origin)
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f32 {
        self.sub_point(other).hypot()
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Checks if both coordinates are finite numbers
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Grows the size by the given insets
    pub fn add_padding(self, insets: Insets) -> Self {
        Self {
            width: self.width + insets.horizontal_sum(),
            height: self.height + insets.vertical_sum(),
        }
    }
}

/// One side of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Whether the side runs horizontally (top or bottom)
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Top | Side::Bottom)
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Creates a new bounds from its top-left and bottom-right corners
    pub fn from_corners(min: Point, max: Point) -> Self {
        Self {
            min_x: min.x,
            min_y: min.y,
            max_x: max.x,
            max_y: max.y,
        }
    }

    /// Creates a zero-area bounds located at a single point
    pub fn from_point(point: Point) -> Self {
        Self {
            min_x: point.x,
            min_y: point.y,
            max_x: point.x,
            max_y: point.y,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point {
            x: self.min_x,
            y: self.min_y,
        }
    }

    /// Merges two bounds to create a larger bounds that contains both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sysml_layout_core::geometry::{Bounds, Point, Size};
    /// let header = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 30.0));
    /// let content = Bounds::new_from_top_left(Point::new(10.0, 40.0), Size::new(120.0, 80.0));
    ///
    /// let combined = header.merge(&content);
    /// assert_eq!(combined.min_x(), 0.0);
    /// assert_eq!(combined.width(), 130.0);
    /// assert_eq!(combined.height(), 120.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grows the bounds so it also contains the given point
    pub fn include_point(&self, point: Point) -> Self {
        self.merge(&Self::from_point(point))
    }

    /// Moves the bounds by the specified offset.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Expands the bounds by adding insets.
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left(),
            min_y: self.min_y - insets.top(),
            max_x: self.max_x + insets.right(),
            max_y: self.max_y + insets.bottom(),
        }
    }

    /// Returns true when the interiors of both bounds overlap.
    ///
    /// Rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Returns true when `other` lies entirely on or within these bounds
    pub fn contains(&self, other: &Self) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Returns true when the point lies on or within these bounds
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Clamps a point into these bounds
    pub fn clamp_point(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.min_x, self.max_x.max(self.min_x)),
            point.y.clamp(self.min_y, self.max_y.max(self.min_y)),
        )
    }

    /// Finds the point on the boundary closest to `point`, together with its side.
    ///
    /// Points inside the rectangle are projected onto the nearest side; points
    /// outside are clamped onto the boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sysml_layout_core::geometry::{Bounds, Point, Side, Size};
    /// let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 50.0));
    /// let (snapped, side) = bounds.nearest_boundary_point(Point::new(300.0, 20.0));
    /// assert_eq!(side, Side::Right);
    /// assert_eq!(snapped, Point::new(100.0, 20.0));
    /// ```
    pub fn nearest_boundary_point(&self, point: Point) -> (Point, Side) {
        let clamped = self.clamp_point(point);
        let candidates = [
            (Side::Top, (clamped.y - self.min_y).abs()),
            (Side::Right, (self.max_x - clamped.x).abs()),
            (Side::Bottom, (self.max_y - clamped.y).abs()),
            (Side::Left, (clamped.x - self.min_x).abs()),
        ];

        // Outside points keep the side they were clamped against.
        let outside_side = if point.y < self.min_y {
            Some(Side::Top)
        } else if point.y > self.max_y {
            Some(Side::Bottom)
        } else if point.x > self.max_x {
            Some(Side::Right)
        } else if point.x < self.min_x {
            Some(Side::Left)
        } else {
            None
        };

        let side = outside_side.unwrap_or_else(|| {
            candidates
                .iter()
                .fold(candidates[0], |best, &candidate| {
                    if candidate.1 < best.1 { candidate } else { best }
                })
                .0
        });

        let snapped = match side {
            Side::Top => clamped.with_y(self.min_y),
            Side::Right => clamped.with_x(self.max_x),
            Side::Bottom => clamped.with_y(self.max_y),
            Side::Left => clamped.with_x(self.min_x),
        };
        (snapped, side)
    }

    /// Returns the midpoint of one side
    pub fn side_midpoint(&self, side: Side) -> Point {
        let center = self.center();
        match side {
            Side::Top => center.with_y(self.min_y),
            Side::Right => center.with_x(self.max_x),
            Side::Bottom => center.with_y(self.max_y),
            Side::Left => center.with_x(self.min_x),
        }
    }

    /// Returns true when the segment `a`-`b` passes through the interior of the bounds.
    ///
    /// Segments running along or touching the boundary are not considered to
    /// cross it. Uses Liang-Barsky clipping against a slightly shrunk rectangle.
    pub fn segment_crosses(&self, a: Point, b: Point) -> bool {
        let min_x = self.min_x + INTERIOR_EPSILON;
        let min_y = self.min_y + INTERIOR_EPSILON;
        let max_x = self.max_x - INTERIOR_EPSILON;
        let max_y = self.max_y - INTERIOR_EPSILON;
        if min_x >= max_x || min_y >= max_y {
            return false;
        }

        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let mut t0 = 0.0_f32;
        let mut t1 = 1.0_f32;

        for (p, q) in [
            (-dx, a.x - min_x),
            (dx, max_x - a.x),
            (-dy, a.y - min_y),
            (dy, max_y - a.y),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    if r > t1 {
                        return false;
                    }
                    t0 = t0.max(r);
                } else {
                    if r < t0 {
                        return false;
                    }
                    t1 = t1.min(r);
                }
            }
        }
        t0 <= t1
    }
}

impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Bounds", 4)?;
        state.serialize_field("x", &self.min_x)?;
        state.serialize_field("y", &self.min_y)?;
        state.serialize_field("width", &self.width())?;
        state.serialize_field("height", &self.height())?;
        state.end()
    }
}

/// Represents spacing around an element (padding, margin, etc.)
/// with potentially different values for each side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    /// Creates new insets with specified values for each side
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates uniform insets with the same value for all sides
    pub const fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Returns the top inset value
    pub fn top(self) -> f32 {
        self.top
    }

    /// Returns the right inset value
    pub fn right(self) -> f32 {
        self.right
    }

    /// Returns the bottom inset value
    pub fn bottom(self) -> f32 {
        self.bottom
    }

    /// Returns the left inset value
    pub fn left(self) -> f32 {
        self.left
    }

    /// Returns the sum of left and right insets
    pub fn horizontal_sum(self) -> f32 {
        self.left + self.right
    }

    /// Returns the sum of top and bottom insets
    pub fn vertical_sum(self) -> f32 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_new() {
        let point = Point::new(3.5, 4.2);
        assert_eq!(point.x(), 3.5);
        assert_eq!(point.y(), 4.2);
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn test_size_add_padding() {
        let size = Size::new(100.0, 50.0).add_padding(Insets::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(size.width(), 106.0);
        assert_eq!(size.height(), 54.0);
    }

    #[test]
    fn test_bounds_from_center() {
        let bounds = Bounds::new_from_center(Point::new(50.0, 50.0), Size::new(20.0, 10.0));
        assert_eq!(bounds.min_x(), 40.0);
        assert_eq!(bounds.min_y(), 45.0);
        assert_eq!(bounds.max_x(), 60.0);
        assert_eq!(bounds.max_y(), 55.0);
        assert_eq!(bounds.center(), Point::new(50.0, 50.0));
    }

    #[test]
    fn test_bounds_overlaps_ignores_shared_edges() {
        let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let touching = Bounds::new_from_top_left(Point::new(10.0, 0.0), Size::new(10.0, 10.0));
        let overlapping = Bounds::new_from_top_left(Point::new(5.0, 5.0), Size::new(10.0, 10.0));

        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&overlapping));
        assert!(overlapping.overlaps(&a));
    }

    #[test]
    fn test_bounds_contains() {
        let outer = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 100.0));
        let inner = Bounds::new_from_top_left(Point::new(0.0, 10.0), Size::new(10.0, 10.0));
        let outside = Bounds::new_from_top_left(Point::new(95.0, 10.0), Size::new(10.0, 10.0));

        assert!(outer.contains(&inner));
        assert!(!outer.contains(&outside));
        assert!(outer.contains_point(Point::new(100.0, 100.0)));
        assert!(!outer.contains_point(Point::new(100.1, 100.0)));
    }

    #[test]
    fn test_nearest_boundary_point_inside() {
        let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 40.0));
        let (point, side) = bounds.nearest_boundary_point(Point::new(30.0, 35.0));
        assert_eq!(side, Side::Bottom);
        assert_eq!(point, Point::new(30.0, 40.0));
    }

    #[test]
    fn test_nearest_boundary_point_outside_corner() {
        let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 40.0));
        let (point, side) = bounds.nearest_boundary_point(Point::new(-50.0, -50.0));
        assert_eq!(side, Side::Top);
        assert_eq!(point, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_segment_crosses() {
        let bounds = Bounds::new_from_top_left(Point::new(10.0, 10.0), Size::new(20.0, 20.0));

        // Straight through the middle
        assert!(bounds.segment_crosses(Point::new(0.0, 20.0), Point::new(40.0, 20.0)));
        // Passing above
        assert!(!bounds.segment_crosses(Point::new(0.0, 5.0), Point::new(40.0, 5.0)));
        // Running along the top edge
        assert!(!bounds.segment_crosses(Point::new(0.0, 10.0), Point::new(40.0, 10.0)));
        // Ending before the box
        assert!(!bounds.segment_crosses(Point::new(0.0, 20.0), Point::new(9.0, 20.0)));
        // Fully inside
        assert!(bounds.segment_crosses(Point::new(15.0, 15.0), Point::new(16.0, 16.0)));
    }

    #[test]
    fn test_bounds_serializes_as_rectangle() {
        let bounds = Bounds::new_from_top_left(Point::new(1.0, 2.0), Size::new(3.0, 4.0));
        let json = serde_json::to_value(bounds).expect("serialize");
        assert_eq!(json["x"], 1.0);
        assert_eq!(json["y"], 2.0);
        assert_eq!(json["width"], 3.0);
        assert_eq!(json["height"], 4.0);
    }

    #[test]
    fn test_insets_sums() {
        let insets = Insets::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(insets.horizontal_sum(), 6.0);
        assert_eq!(insets.vertical_sum(), 4.0);
        assert_eq!(Insets::uniform(5.0).left(), 5.0);
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            -1000.0f32..1000.0,
            -1000.0f32..1000.0,
            1.0f32..500.0,
            1.0f32..500.0,
        )
            .prop_map(|(x, y, w, h)| Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h)))
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-2000.0f32..2000.0, -2000.0f32..2000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    // ===================
    // Property Test Functions
    // ===================

    /// A snapped point always lies on the boundary of the rectangle.
    fn check_nearest_boundary_point_is_on_boundary(
        bounds: Bounds,
        point: Point,
    ) -> Result<(), TestCaseError> {
        let (snapped, side) = bounds.nearest_boundary_point(point);

        prop_assert!(bounds.contains_point(snapped));
        let on_side = match side {
            Side::Top => approx_eq!(f32, snapped.y(), bounds.min_y()),
            Side::Right => approx_eq!(f32, snapped.x(), bounds.max_x()),
            Side::Bottom => approx_eq!(f32, snapped.y(), bounds.max_y()),
            Side::Left => approx_eq!(f32, snapped.x(), bounds.min_x()),
        };
        prop_assert!(on_side, "{snapped:?} is not on side {side:?} of {bounds:?}");
        Ok(())
    }

    /// Merging is commutative and contains both inputs.
    fn check_merge_contains_both(a: Bounds, b: Bounds) -> Result<(), TestCaseError> {
        let merged = a.merge(&b);
        prop_assert_eq!(merged, b.merge(&a));
        prop_assert!(merged.contains(&a));
        prop_assert!(merged.contains(&b));
        Ok(())
    }

    /// Overlap is symmetric.
    fn check_overlap_is_symmetric(a: Bounds, b: Bounds) -> Result<(), TestCaseError> {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        Ok(())
    }

    /// A segment between two points outside the bounding box of a rectangle,
    /// on the same side, never crosses it.
    fn check_segment_left_of_bounds_never_crosses(
        bounds: Bounds,
        y1: f32,
        y2: f32,
    ) -> Result<(), TestCaseError> {
        let x = bounds.min_x() - 1.0;
        prop_assert!(!bounds.segment_crosses(Point::new(x, y1), Point::new(x, y2)));
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn nearest_boundary_point_is_on_boundary(bounds in bounds_strategy(), point in point_strategy()) {
            check_nearest_boundary_point_is_on_boundary(bounds, point)?;
        }

        #[test]
        fn merge_contains_both(a in bounds_strategy(), b in bounds_strategy()) {
            check_merge_contains_both(a, b)?;
        }

        #[test]
        fn overlap_is_symmetric(a in bounds_strategy(), b in bounds_strategy()) {
            check_overlap_is_symmetric(a, b)?;
        }

        #[test]
        fn segment_left_of_bounds_never_crosses(
            bounds in bounds_strategy(),
            y1 in -2000.0f32..2000.0,
            y2 in -2000.0f32..2000.0,
        ) {
            check_segment_left_of_bounds_never_crosses(bounds, y1, y2)?;
        }
    }
}
