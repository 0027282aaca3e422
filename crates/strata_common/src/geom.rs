//! Integer-micrometre geometry.
//!
//! All physical coordinates in strata are integer micrometres. Wirelength
//! estimation uses the Manhattan metric, so sums of coordinates never leave
//! `i64` for any realistic die.

use serde::{Deserialize, Serialize};

/// A point on the die, in integer micrometres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate in µm.
    pub x: i64,
    /// Vertical coordinate in µm.
    pub y: i64,
}

impl Point {
    /// Creates a point from µm coordinates.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another point.
    pub fn manhattan(self, other: Point) -> i64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangle, closed on all sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// Lower-left corner.
    pub min: Point,
    /// Upper-right corner.
    pub max: Point,
}

impl Rect {
    /// Creates a rectangle from two corners.
    ///
    /// The corners must already be ordered (`min.x <= max.x`, `min.y <= max.y`).
    pub fn new(min: Point, max: Point) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y);
        Self { min, max }
    }

    /// Creates a rectangle anchored at the origin with the given extent.
    pub fn from_size(width: i64, height: i64) -> Self {
        Self::new(Point::new(0, 0), Point::new(width, height))
    }

    /// Returns whether the point lies inside the rectangle (borders included).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Width in µm.
    pub fn width(&self) -> i64 {
        self.max.x - self.min.x
    }

    /// Height in µm.
    pub fn height(&self) -> i64 {
        self.max.y - self.min.y
    }

    /// Geometric centre, rounded toward the lower-left.
    pub fn center(&self) -> Point {
        Point::new(
            self.min.x + self.width() / 2,
            self.min.y + self.height() / 2,
        )
    }

    /// Manhattan half-perimeter (width + height).
    pub fn half_perimeter(&self) -> i64 {
        self.width() + self.height()
    }
}

/// Accumulates the bounding box of a set of points.
///
/// Used by the HPWL cost function and the clock tree synthesizer. An empty
/// box reports a half-perimeter of zero, which is exactly the wirelength
/// contribution of a net with fewer than two placed endpoints.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    min_x: i64,
    max_x: i64,
    min_y: i64,
    max_y: i64,
    count: usize,
}

impl BoundingBox {
    /// Creates an empty bounding box.
    pub fn new() -> Self {
        Self {
            min_x: i64::MAX,
            max_x: i64::MIN,
            min_y: i64::MAX,
            max_y: i64::MIN,
            count: 0,
        }
    }

    /// Expands the box to include `p`.
    pub fn expand(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.max_x = self.max_x.max(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_y = self.max_y.max(p.y);
        self.count += 1;
    }

    /// Number of points accumulated so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Half-perimeter of the accumulated box.
    ///
    /// Zero when fewer than two points have been accumulated.
    pub fn half_perimeter(&self) -> i64 {
        if self.count < 2 {
            return 0;
        }
        (self.max_x - self.min_x) + (self.max_y - self.min_y)
    }

    /// Extent along x (zero when empty).
    pub fn width(&self) -> i64 {
        if self.count == 0 {
            return 0;
        }
        self.max_x - self.min_x
    }

    /// Extent along y (zero when empty).
    pub fn height(&self) -> i64 {
        if self.count == 0 {
            return 0;
        }
        self.max_y - self.min_y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}
