//! Cubic Bezier curves

use serde::{Deserialize, Serialize};

use super::{CurveError, DiscreteCurve};
use crate::config::Config;
use crate::foundation::math::Vec3;

/// Parameter step floor of the even discretization bisection
const MIN_BISECTION_STEP: f32 = 1e-3;

/// A Bezier anchor with independent (non mirrored) tangent handles
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BezierControlPoint {
    /// Point the curve passes through
    pub position: Vec3,
    /// Handle shaping the segment ending at this point
    pub handle_left: Vec3,
    /// Handle shaping the segment starting at this point
    pub handle_right: Vec3,
}

impl BezierControlPoint {
    /// Create a control point
    pub fn new(position: Vec3, handle_left: Vec3, handle_right: Vec3) -> Self {
        Self { position, handle_left, handle_right }
    }

    /// A control point whose handles both sit on the point
    pub fn sharp(position: Vec3) -> Self {
        Self::new(position, position, position)
    }
}

/// Settings of [`BezierCurve::discretize_evenly`]
///
/// The bisection is capped: too few iterations under-converge on sharp
/// turns, more iterations cost time for little gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvenDiscretizationSettings {
    /// Bisection iterations per sample
    pub max_binary_search_iterations: u32,
    /// First parameter step tried from the previous sample
    pub binary_search_initial_step: f32,
    /// World distance wanted between two consecutive samples
    pub target_even_distance: f32,
    /// Tolerance on `target_even_distance`
    pub accepted_even_distance_delta: f32,
}

impl Default for EvenDiscretizationSettings {
    fn default() -> Self {
        Self {
            max_binary_search_iterations: 8,
            binary_search_initial_step: 0.2,
            target_even_distance: 2.0,
            accepted_even_distance_delta: 0.1,
        }
    }
}

impl Config for EvenDiscretizationSettings {}

impl EvenDiscretizationSettings {
    /// Reject settings the bisection cannot converge with
    pub fn validate(&self) -> Result<(), CurveError> {
        if self.max_binary_search_iterations == 0 {
            return Err(CurveError::InvalidSettings { name: "max_binary_search_iterations", value: 0.0 });
        }
        let positive = [
            ("binary_search_initial_step", self.binary_search_initial_step),
            ("target_even_distance", self.target_even_distance),
            ("accepted_even_distance_delta", self.accepted_even_distance_delta),
        ];
        match positive.into_iter().find(|(_, value)| !(value.is_finite() && *value > 0.0)) {
            Some((name, value)) => Err(CurveError::InvalidSettings { name, value }),
            None => Ok(()),
        }
    }
}

/// A piecewise cubic Bezier curve
///
/// The curve parameter runs over `[0, N-1]` for `N` control points, segment
/// `i` covering `[i, i+1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    control_points: Vec<BezierControlPoint>,
    is_loop: bool,
}

impl BezierCurve {
    /// Create a curve, the loop flag is derived from the end points
    pub fn new(control_points: Vec<BezierControlPoint>) -> Result<Self, CurveError> {
        let (Some(first), Some(last)) = (control_points.first(), control_points.last()) else {
            return Err(CurveError::Empty);
        };
        let is_loop = control_points.len() > 1 && first.position == last.position;
        Ok(Self { control_points, is_loop })
    }

    /// Control points in curve order
    pub fn control_points(&self) -> &[BezierControlPoint] {
        &self.control_points
    }

    /// Whether the first and last control points coincide
    pub fn is_loop(&self) -> bool {
        self.is_loop
    }

    /// Upper bound of the curve parameter
    pub fn max_parameter(&self) -> f32 {
        (self.control_points.len() - 1) as f32
    }

    /// Point at parameter `t`, clamped to the end points outside `[0, N-1]`
    pub fn sample_point(&self, t: f32) -> Vec3 {
        let (first, last) = (&self.control_points[0], &self.control_points[self.control_points.len() - 1]);
        if t.is_nan() || t <= 0.0 {
            return first.position;
        }
        if t >= self.max_parameter() {
            return last.position;
        }

        // 0 < t < N-1 so the segment index is in range
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let segment = t as usize;
        Self::interpolate(
            &self.control_points[segment],
            &self.control_points[segment + 1],
            t - segment as f32,
        )
    }

    /// Cubic Bernstein interpolation of one segment, `t` in `[0, 1]`
    pub fn interpolate(c0: &BezierControlPoint, c1: &BezierControlPoint, t: f32) -> Vec3 {
        let q = 1.0 - t;
        c0.position * (q * q * q)
            + c0.handle_right * (3.0 * t * q * q)
            + c1.handle_left * (3.0 * t * t * q)
            + c1.position * (t * t * t)
    }

    /// Sample every `delta` parameter units over `[0, N)`
    pub fn discretize(&self, delta: f32) -> Result<DiscreteCurve, CurveError> {
        if delta.is_nan() || delta <= 0.0 {
            return Err(CurveError::InvalidStep(delta));
        }

        let end = self.control_points.len() as f32;
        let mut points = Vec::new();
        let mut t = 0.0;
        while t < end {
            points.push(self.sample_point(t));
            t += delta;
        }
        DiscreteCurve::new(points)
    }

    /// Resample the curve so consecutive points are about
    /// `target_even_distance` apart.
    ///
    /// The result starts on the first control point and ends on the last
    /// one, the final spacing may be shorter than the target.
    pub fn discretize_evenly(&self, settings: &EvenDiscretizationSettings) -> Result<DiscreteCurve, CurveError> {
        settings.validate()?;
        let mut points = vec![self.sample_point(0.0)];
        let mut previous = points[0];
        let mut t = 0.0;
        while t < self.max_parameter() {
            let (next, next_t) = self.next_even_sample(&previous, t, settings)?;
            points.push(next);
            previous = next;
            t = next_t;
        }
        Ok(DiscreteCurve::from_points_unchecked(points))
    }

    /// Bisect the parameter after `t` for the point lying
    /// `target_even_distance` away from `previous`.
    ///
    /// Returns the point and its parameter, which must be greater than `t`.
    pub(crate) fn next_even_sample(
        &self,
        previous: &Vec3,
        t: f32,
        settings: &EvenDiscretizationSettings,
    ) -> Result<(Vec3, f32), CurveError> {
        let step = settings.binary_search_initial_step.max(MIN_BISECTION_STEP);
        let mut lower = t;
        let mut upper = t + step * 2.0;
        let mut candidate = t + step;
        let mut sampled = (self.sample_point(candidate), candidate);

        for _ in 0..settings.max_binary_search_iterations {
            sampled = (self.sample_point(candidate), candidate);
            let distance = (sampled.0 - previous).norm();
            if (distance - settings.target_even_distance).abs() < settings.accepted_even_distance_delta {
                break;
            }
            if distance < settings.target_even_distance {
                lower = candidate;
                candidate = (candidate + upper) * 0.5;
            } else {
                upper = candidate;
                candidate = (candidate + lower) * 0.5;
            }
        }
        if sampled.1 <= t {
            return Err(CurveError::Stalled(t));
        }
        Ok(sampled)
    }
}
