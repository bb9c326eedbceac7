//! Axis-aligned 2D regions used by the quad-tree

use serde::{Deserialize, Serialize};
use std::fmt;

/// A quad-tree region, an axis-aligned rectangle on the ground plane
///
/// Bounds are inclusive for `overlaps` and `contains`: two regions sharing
/// only an edge overlap.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QuadTreeRegion {
    /// Minimum X
    pub min_x: f32,
    /// Minimum Y
    pub min_y: f32,
    /// Maximum X
    pub max_x: f32,
    /// Maximum Y
    pub max_y: f32,
}

impl QuadTreeRegion {
    /// Create a region from its bounds
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Create a region centered on `(x, y)` with the given half extents
    pub fn from_center(x: f32, y: f32, half_width: f32, half_height: f32) -> Self {
        Self::new(x - half_width, y - half_height, x + half_width, y + half_height)
    }

    /// A region with no area
    pub fn is_degenerate(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }

    /// Whether the two regions share at least one point
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max_x >= other.min_x && self.min_x <= other.max_x
            && self.max_y >= other.min_y && self.min_y <= other.max_y
    }

    /// Whether `other` lies entirely within this region
    pub fn contains(&self, other: &Self) -> bool {
        self.max_x >= other.max_x && self.min_x <= other.min_x
            && self.max_y >= other.max_y && self.min_y <= other.min_y
    }

    /// Whether the point lies within this region
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }

    /// Split coordinates of this region
    pub fn midpoint(&self) -> (f32, f32) {
        ((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    /// The four corners, counter-clockwise from `(min_x, min_y)`
    pub fn corners(&self) -> [(f32, f32); 4] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
        ]
    }
}

impl fmt::Display for QuadTreeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] x [{}, {}]", self.min_x, self.max_x, self.min_y, self.max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_regions() {
        assert!(QuadTreeRegion::new(0.0, 0.0, 0.0, 1.0).is_degenerate());
        assert!(QuadTreeRegion::new(0.0, 2.0, 1.0, 1.0).is_degenerate());
        assert!(!QuadTreeRegion::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_touching_regions_overlap() {
        let a = QuadTreeRegion::new(0.0, 0.0, 1.0, 1.0);
        let b = QuadTreeRegion::new(1.0, 0.5, 2.0, 2.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&QuadTreeRegion::new(1.1, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let outer = QuadTreeRegion::new(-1.0, -1.0, 1.0, 1.0);
        assert!(outer.contains(&outer));
        assert!(outer.contains(&QuadTreeRegion::new(-0.5, -0.5, 1.0, 0.0)));
        assert!(!outer.contains(&QuadTreeRegion::new(-0.5, -0.5, 1.5, 0.0)));
    }
}
