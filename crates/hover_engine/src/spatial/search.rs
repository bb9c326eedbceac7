//! Search shapes for quad-tree queries

use super::region::QuadTreeRegion;
use crate::foundation::math::Vec2;

/// Outcome of testing a region against a search shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchResult {
    /// The region lies entirely inside the shape
    pub contains: bool,
    /// The region and the shape share at least one point
    pub overlaps: bool,
}

impl SearchResult {
    /// Region neither contained nor overlapped
    pub const MISS: Self = Self { contains: false, overlaps: false };

    /// Whether the region is matched at all
    pub fn is_hit(self) -> bool {
        self.contains || self.overlaps
    }
}

/// A shape the quad-tree can be searched with
///
/// `contains` lets the tree collect a whole cell without testing its
/// members, `overlaps` makes it descend into the cell.
pub trait QuadTreeSearch {
    /// Test a region against this shape
    fn test(&self, region: &QuadTreeRegion) -> SearchResult;
}

impl<F> QuadTreeSearch for F
where
    F: Fn(&QuadTreeRegion) -> (bool, bool),
{
    fn test(&self, region: &QuadTreeRegion) -> SearchResult {
        let (contains, overlaps) = self(region);
        SearchResult { contains, overlaps }
    }
}

/// Axis-aligned rectangle search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSearch {
    bounds: QuadTreeRegion,
}

impl RegionSearch {
    /// Search for everything overlapping `bounds`
    pub fn new(bounds: QuadTreeRegion) -> Self {
        Self { bounds }
    }
}

impl QuadTreeSearch for RegionSearch {
    fn test(&self, region: &QuadTreeRegion) -> SearchResult {
        SearchResult {
            contains: self.bounds.contains(region),
            overlaps: self.bounds.overlaps(region),
        }
    }
}

/// Disc search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleSearch {
    center: Vec2,
    radius: f32,
}

impl CircleSearch {
    /// Search for everything within `radius` of `center`
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius: radius.max(0.0) }
    }
}

impl QuadTreeSearch for CircleSearch {
    fn test(&self, region: &QuadTreeRegion) -> SearchResult {
        let radius_sq = self.radius * self.radius;
        let contains = region
            .corners()
            .iter()
            .all(|&(x, y)| (Vec2::new(x, y) - self.center).norm_squared() <= radius_sq);
        let closest = Vec2::new(
            self.center.x.clamp(region.min_x, region.max_x),
            self.center.y.clamp(region.min_y, region.max_y),
        );
        SearchResult {
            contains,
            overlaps: contains || (closest - self.center).norm_squared() <= radius_sq,
        }
    }
}

/// Circular sector search, the ground footprint of a camera frustum
///
/// The half angle is clamped to `[0, PI/2]` so the sector stays convex and
/// "all four corners inside" implies "region inside".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewWedgeSearch {
    origin: Vec2,
    direction: Vec2,
    half_angle: f32,
    cos_half_angle: f32,
    range: f32,
}

impl ViewWedgeSearch {
    /// Create a sector from its apex, viewing direction, half aperture and
    /// view distance. A null direction looks along `+X`.
    pub fn new(origin: Vec2, direction: Vec2, half_angle: f32, range: f32) -> Self {
        let half_angle = half_angle.clamp(0.0, std::f32::consts::FRAC_PI_2);
        Self {
            origin,
            direction: direction.try_normalize(f32::EPSILON).unwrap_or_else(Vec2::x),
            half_angle,
            cos_half_angle: half_angle.cos(),
            range: range.max(0.0),
        }
    }

    /// Whether a point lies within the sector
    pub fn contains_point(&self, point: &Vec2) -> bool {
        let offset = point - self.origin;
        let distance = offset.norm();
        if distance > self.range {
            return false;
        }
        distance <= f32::EPSILON || offset.dot(&self.direction) >= self.cos_half_angle * distance
    }

    fn edge_ends(&self) -> [Vec2; 2] {
        [self.half_angle, -self.half_angle].map(|angle| {
            let (sin, cos) = angle.sin_cos();
            let rotated = Vec2::new(
                self.direction.x * cos - self.direction.y * sin,
                self.direction.x * sin + self.direction.y * cos,
            );
            self.origin + rotated * self.range
        })
    }

    fn arc_crosses(&self, a: &Vec2, b: &Vec2) -> bool {
        // |a + t (b - a) - origin|^2 = range^2 with t in [0, 1]
        let segment = b - a;
        let offset = a - self.origin;
        let qa = segment.norm_squared();
        if qa <= f32::EPSILON {
            return false;
        }
        let qb = 2.0 * offset.dot(&segment);
        let qc = offset.norm_squared() - self.range * self.range;
        let discriminant = qb * qb - 4.0 * qa * qc;
        if discriminant < 0.0 {
            return false;
        }
        let root = discriminant.sqrt();
        [(-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)]
            .into_iter()
            .filter(|t| (0.0..=1.0).contains(t))
            .any(|t| {
                let on_arc = a + segment * t - self.origin;
                on_arc.dot(&self.direction) >= self.cos_half_angle * on_arc.norm() - 1e-4
            })
    }
}

impl QuadTreeSearch for ViewWedgeSearch {
    fn test(&self, region: &QuadTreeRegion) -> SearchResult {
        let corners = region.corners().map(|(x, y)| Vec2::new(x, y));
        let inside = corners.iter().filter(|corner| self.contains_point(corner)).count();
        if inside == corners.len() {
            return SearchResult { contains: true, overlaps: true };
        }
        if inside > 0 || region.contains_point(self.origin.x, self.origin.y) {
            return SearchResult { contains: false, overlaps: true };
        }

        let radial_hit = self
            .edge_ends()
            .iter()
            .any(|end| segment_hits_region(&self.origin, end, region));
        let arc_hit = (0..corners.len())
            .any(|i| self.arc_crosses(&corners[i], &corners[(i + 1) % corners.len()]));

        SearchResult {
            contains: false,
            overlaps: radial_hit || arc_hit,
        }
    }
}

/// Segment against axis-aligned rectangle, slab clipping
fn segment_hits_region(a: &Vec2, b: &Vec2, region: &QuadTreeRegion) -> bool {
    let delta = b - a;
    let mut t_min = 0.0_f32;
    let mut t_max = 1.0_f32;
    for (start, step, low, high) in [
        (a.x, delta.x, region.min_x, region.max_x),
        (a.y, delta.y, region.min_y, region.max_y),
    ] {
        if step.abs() <= f32::EPSILON {
            if start < low || start > high {
                return false;
            }
            continue;
        }
        let (t0, t1) = ((low - start) / step, (high - start) / step);
        t_min = t_min.max(t0.min(t1));
        t_max = t_max.min(t0.max(t1));
        if t_min > t_max {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_search() {
        let search = RegionSearch::new(QuadTreeRegion::new(0.0, 0.0, 10.0, 10.0));
        let inner = search.test(&QuadTreeRegion::new(1.0, 1.0, 2.0, 2.0));
        assert!(inner.contains && inner.overlaps);
        let partial = search.test(&QuadTreeRegion::new(9.0, 9.0, 12.0, 12.0));
        assert!(!partial.contains && partial.overlaps);
        assert_eq!(search.test(&QuadTreeRegion::new(11.0, 11.0, 12.0, 12.0)), SearchResult::MISS);
    }

    #[test]
    fn test_circle_search() {
        let search = CircleSearch::new(Vec2::new(0.0, 0.0), 5.0);
        assert!(search.test(&QuadTreeRegion::new(-1.0, -1.0, 1.0, 1.0)).contains);
        let corner = search.test(&QuadTreeRegion::new(3.0, 3.0, 10.0, 10.0));
        assert!(!corner.contains && corner.overlaps);
        assert!(!search.test(&QuadTreeRegion::new(4.0, 4.0, 10.0, 10.0)).is_hit());
    }

    #[test]
    fn test_view_wedge_contains_region_ahead() {
        let wedge = ViewWedgeSearch::new(Vec2::zeros(), Vec2::new(1.0, 0.0), 0.5, 100.0);
        let ahead = wedge.test(&QuadTreeRegion::new(20.0, -1.0, 22.0, 1.0));
        assert!(ahead.contains);
        assert!(!wedge.test(&QuadTreeRegion::new(-22.0, -1.0, -20.0, 1.0)).is_hit());
    }

    #[test]
    fn test_view_wedge_overlaps_region_crossed_by_edge() {
        let wedge = ViewWedgeSearch::new(Vec2::zeros(), Vec2::new(0.0, 1.0), std::f32::consts::FRAC_PI_4, 50.0);
        // straddles the left radial edge
        let result = wedge.test(&QuadTreeRegion::new(-12.0, 9.0, -8.0, 11.0));
        assert!(!result.contains);
        assert!(result.overlaps);
    }

    #[test]
    fn test_view_wedge_overlaps_region_crossed_by_arc() {
        let wedge = ViewWedgeSearch::new(Vec2::zeros(), Vec2::new(1.0, 0.0), 0.3, 10.0);
        // corners all beyond the range but the arc tip pokes into the region
        let result = wedge.test(&QuadTreeRegion::new(9.8, -8.0, 30.0, 8.0));
        assert!(result.overlaps);
        assert!(!result.contains);
    }

    #[test]
    fn test_view_wedge_origin_inside_region() {
        let wedge = ViewWedgeSearch::new(Vec2::new(5.0, 5.0), Vec2::new(1.0, 0.0), 0.1, 1.0);
        assert!(wedge.test(&QuadTreeRegion::new(0.0, 0.0, 100.0, 100.0)).overlaps);
    }

    #[test]
    fn test_closure_search() {
        let search = |region: &QuadTreeRegion| (false, region.min_x > 0.0);
        assert!(search.test(&QuadTreeRegion::new(1.0, 0.0, 2.0, 1.0)).overlaps);
    }
}
