//! Sampled curves

use super::CurveError;
use crate::foundation::math::utils::{fract, lerp_vec, positive_modulo};
use crate::foundation::math::Vec3;

/// An ordered, non-empty sequence of points
///
/// Sampling linearly interpolates between `points[floor(t)]` and
/// `points[floor(t) + 1]`, so unevenly spaced points give unevenly spaced
/// samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteCurve {
    points: Vec<Vec3>,
}

impl DiscreteCurve {
    /// Create a curve from its points
    pub fn new(points: Vec<Vec3>) -> Result<Self, CurveError> {
        if points.is_empty() {
            return Err(CurveError::Empty);
        }
        Ok(Self { points })
    }

    pub(crate) fn from_points_unchecked(points: Vec<Vec3>) -> Self {
        debug_assert!(!points.is_empty());
        Self { points }
    }

    /// Points in curve order
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false, kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `t`, clamped to the end points outside `[0, N-1]`
    pub fn sample_point(&self, t: f32) -> Vec3 {
        let last = self.points.len() - 1;
        if t.is_nan() || t <= 0.0 {
            return self.points[0];
        }
        if t >= last as f32 {
            return self.points[last];
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = t as usize;
        lerp_vec(&self.points[index], &self.points[index + 1], t - index as f32)
    }

    /// Point at `t`, wrapping around `[0, N)`
    pub fn sample_loop_point(&self, t: f32) -> Vec3 {
        let (current, next) = self.wrapped_pair(t);
        lerp_vec(current, next, fract(t))
    }

    /// Direction from the point before `t` to the point after it, wrapping
    pub fn sample_straight_tangent(&self, t: f32) -> Vec3 {
        let (current, next) = self.wrapped_pair(t);
        (next - current).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros)
    }

    /// Finite-difference tangent around `t` over a `delta` wide window,
    /// wrapping
    pub fn sample_smooth_tangent(&self, t: f32, delta: f32) -> Vec3 {
        let half = delta * 0.5;
        (self.sample_loop_point(t + half) - self.sample_loop_point(t - half))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::zeros)
    }

    /// Index and position of the point closest to `target`
    pub fn nearest_point(&self, target: &Vec3) -> (usize, Vec3) {
        self.points
            .iter()
            .enumerate()
            .map(|(index, point)| (index, *point, (point - target).norm_squared()))
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map_or((0, self.points[0]), |(index, point, _)| (index, point))
    }

    fn wrapped_pair(&self, t: f32) -> (&Vec3, &Vec3) {
        #[allow(clippy::cast_possible_truncation)]
        let index = if t.is_finite() { t.floor() as i64 } else { 0 };
        let count = self.points.len();
        (
            &self.points[positive_modulo(index, count)],
            &self.points[positive_modulo(index + 1, count)],
        )
    }
}
