//! Parametric curves
//!
//! Cubic Bezier curves describe tracks and their flat text file format,
//! discrete curves are their resampled form used for tangent queries and by
//! the post-race auto-pilot.

mod bezier;
mod discrete;
mod io;
mod track;

pub use bezier::{BezierControlPoint, BezierCurve, EvenDiscretizationSettings};
pub use discrete::DiscreteCurve;
pub use track::{AnchorPoint, AttractionPoint, TrackPath};

/// Curve construction, sampling and file errors
#[derive(thiserror::Error, Debug)]
pub enum CurveError {
    /// File could not be read or written
    #[error("Curve file error: {0}")]
    Io(#[from] std::io::Error),

    /// A token of a curve file is not a number
    #[error("Invalid number '{token}' at value #{position} of curve file")]
    Parse {
        /// Offending token
        token: String,
        /// Index of the token among all values of the file
        position: usize,
    },

    /// The number of values is not a multiple of nine
    #[error("Curve file ends with an incomplete control point ({values} trailing values)")]
    IncompleteControlPoint {
        /// Values left after the last complete control point
        values: usize,
    },

    /// A curve needs at least one point
    #[error("Curve has no point")]
    Empty,

    /// Uniform sampling needs a strictly positive parameter step
    #[error("Invalid sampling step {0}")]
    InvalidStep(f32),

    /// Even discretization setting out of range
    #[error("Invalid even discretization setting {name} = {value}")]
    InvalidSettings {
        /// Setting name
        name: &'static str,
        /// Rejected value
        value: f32,
    },

    /// Even discretization no longer advances along the curve
    #[error("Even discretization stalled at parameter {0}")]
    Stalled(f32),
}
