//! Track center lines and their oriented anchors

use serde::{Deserialize, Serialize};

use super::{BezierCurve, CurveError, EvenDiscretizationSettings};
use crate::foundation::math::utils::lerp_vec;
use crate::foundation::math::{up_axis, Vec3};
use crate::spatial::QuadTreeRegion;

/// A point pulling the track's vertical toward itself
///
/// The pull fades with the squared distance, `strength` being the squared
/// distance at which the vertical is bent half way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttractionPoint {
    /// World position
    pub position: Vec3,
    /// Squared falloff distance
    pub strength: f32,
}

/// A resampled track point with its local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPoint {
    /// Point on the center line
    pub position: Vec3,
    /// Lateral axis to the right of travel, `forward x up`
    pub right: Vec3,
    /// Track vertical, orthogonal to `forward`
    pub up: Vec3,
    /// Direction of travel
    pub forward: Vec3,
}

/// Center line of a track piece
#[derive(Debug, Clone)]
pub struct TrackPath {
    curve: BezierCurve,
    attraction_points: Vec<AttractionPoint>,
    settings: EvenDiscretizationSettings,
}

impl TrackPath {
    /// Create a track path sampled with the default spacing
    pub fn new(curve: BezierCurve, attraction_points: Vec<AttractionPoint>) -> Self {
        Self::with_settings(curve, attraction_points, EvenDiscretizationSettings::default())
    }

    /// Create a track path with explicit anchor spacing
    pub fn with_settings(
        curve: BezierCurve,
        attraction_points: Vec<AttractionPoint>,
        settings: EvenDiscretizationSettings,
    ) -> Self {
        Self { curve, attraction_points, settings }
    }

    /// Center line
    pub fn curve(&self) -> &BezierCurve {
        &self.curve
    }

    /// Points bending the track vertical
    pub fn attraction_points(&self) -> &[AttractionPoint] {
        &self.attraction_points
    }

    /// Evenly spaced anchors along the center line.
    ///
    /// The first anchor lies one spacing after the curve start. Looping
    /// curves repeat their first anchor at the end to close the strip.
    pub fn sample_anchor_points(&self) -> Result<Vec<AnchorPoint>, CurveError> {
        self.settings.validate()?;
        let mut anchors: Vec<AnchorPoint> = Vec::new();
        let mut previous = self.curve.sample_point(0.0);
        let mut t = 0.0;

        while t < self.curve.max_parameter() {
            let (next, next_t) = self.curve.next_even_sample(&previous, t, &self.settings)?;
            let forward = (next - previous)
                .try_normalize(f32::EPSILON)
                .or_else(|| anchors.last().map(|anchor| anchor.forward))
                .unwrap_or_else(crate::foundation::math::forward_axis);
            let up = self.oriented_vertical(&next, &forward);
            let right = forward.cross(&up).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros);
            anchors.push(AnchorPoint { position: next, right, up, forward });

            previous = next;
            t = next_t;
        }

        if self.curve.is_loop() {
            if let Some(first) = anchors.first().copied() {
                anchors.push(first);
            }
        }
        Ok(anchors)
    }

    /// Ground footprint of the control points and their handles, widened by
    /// `margin` on every side
    ///
    /// A Bezier segment stays inside the hull of its control points, so the
    /// whole center line is covered.
    pub fn footprint(&self, margin: f32) -> QuadTreeRegion {
        let start = self.curve.sample_point(0.0);
        let mut region = QuadTreeRegion::new(start.x, start.z, start.x, start.z);
        let corners = self
            .curve
            .control_points()
            .iter()
            .flat_map(|point| [point.position, point.handle_left, point.handle_right]);
        for corner in corners {
            region.min_x = region.min_x.min(corner.x);
            region.min_y = region.min_y.min(corner.z);
            region.max_x = region.max_x.max(corner.x);
            region.max_y = region.max_y.max(corner.z);
        }
        QuadTreeRegion::new(
            region.min_x - margin,
            region.min_y - margin,
            region.max_x + margin,
            region.max_y + margin,
        )
    }

    fn oriented_vertical(&self, position: &Vec3, forward: &Vec3) -> Vec3 {
        let mut up = up_axis();
        for attraction in &self.attraction_points {
            let offset = attraction.position - position;
            let distance_sq = offset.norm_squared();
            let Some(direction) = offset.try_normalize(f32::EPSILON) else { continue };
            let pull = if attraction.strength > 0.0 {
                1.0 / (1.0 + distance_sq / attraction.strength)
            } else {
                0.0
            };
            up = lerp_vec(&up, &direction, pull);
        }

        let tangent_free = up - forward * up.dot(forward);
        tangent_free.try_normalize(f32::EPSILON).unwrap_or(tangent_free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::BezierControlPoint;
    use approx::assert_relative_eq;

    fn line(length: f32) -> BezierCurve {
        BezierCurve::new(vec![
            BezierControlPoint::new(Vec3::zeros(), Vec3::zeros(), Vec3::new(length / 3.0, 0.0, 0.0)),
            BezierControlPoint::new(
                Vec3::new(length, 0.0, 0.0),
                Vec3::new(length * 2.0 / 3.0, 0.0, 0.0),
                Vec3::new(length, 0.0, 0.0),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_flat_track_frame() {
        let track = TrackPath::new(line(20.0), Vec::new());
        let anchors = track.sample_anchor_points().unwrap();
        // every 2 units up to the end, the last one may be repeated by rounding
        assert!((10..=11).contains(&anchors.len()));
        for anchor in &anchors {
            assert_relative_eq!(anchor.forward, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
            assert_relative_eq!(anchor.up, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
            assert_relative_eq!(anchor.right, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_attraction_point_banks_the_track() {
        let attraction = AttractionPoint { position: Vec3::new(10.0, 0.0, 10.0), strength: 10_000.0 };
        let track = TrackPath::new(line(20.0), vec![attraction]);
        let anchors = track.sample_anchor_points().unwrap();
        let middle = anchors[anchors.len() / 2];
        // pulled sideways toward +Z, still orthogonal to the travel direction
        assert!(middle.up.z > 0.1);
        assert_relative_eq!(middle.up.dot(&middle.forward), 0.0, epsilon = 1e-5);
        assert_relative_eq!(middle.up.norm(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_loop_repeats_first_anchor() {
        let a = BezierControlPoint::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -5.0));
        let b = BezierControlPoint::new(Vec3::new(20.0, 0.0, 0.0), Vec3::new(20.0, 0.0, -5.0), Vec3::new(20.0, 0.0, 5.0));
        let track = TrackPath::new(BezierCurve::new(vec![a, b, a]).unwrap(), Vec::new());
        let anchors = track.sample_anchor_points().unwrap();
        assert_eq!(anchors.first(), anchors.last());
    }

    #[test]
    fn test_footprint_covers_center_line() {
        let track = TrackPath::new(line(20.0), Vec::new());
        let footprint = track.footprint(1.0);
        assert_relative_eq!(footprint.min_x, -1.0, epsilon = 1e-4);
        assert_relative_eq!(footprint.max_x, 21.0, epsilon = 1e-4);
        assert_relative_eq!(footprint.min_y, -1.0);
        assert_relative_eq!(footprint.max_y, 1.0);
    }

    #[test]
    fn test_footprint_covers_handles() {
        let a = BezierControlPoint::new(Vec3::zeros(), Vec3::zeros(), Vec3::new(0.0, 0.0, 12.0));
        let b = BezierControlPoint::new(Vec3::new(20.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 12.0), Vec3::new(20.0, 0.0, 0.0));
        let track = TrackPath::new(BezierCurve::new(vec![a, b]).unwrap(), Vec::new());
        let footprint = track.footprint(0.0);
        assert_relative_eq!(footprint.max_y, 12.0);

        // the bulge of the curve stays inside
        let bulge = track.curve().sample_point(0.5);
        assert!(bulge.z > 0.0 && bulge.z <= footprint.max_y);
    }

    #[test]
    fn test_anchor_sampling_rejects_bad_spacing() {
        let settings = EvenDiscretizationSettings { target_even_distance: -1.0, ..Default::default() };
        let track = TrackPath::with_settings(line(20.0), Vec::new(), settings);
        assert!(matches!(track.sample_anchor_points(), Err(CurveError::InvalidSettings { .. })));
    }
}
