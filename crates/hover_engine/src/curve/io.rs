//! Flat text format of Bezier curves
//!
//! Each control point is nine whitespace separated numbers: position,
//! left handle then right handle. Writing uses one control point per line.

use std::fmt::Write as _;
use std::path::Path;

use super::{BezierControlPoint, BezierCurve, CurveError};
use crate::foundation::math::Vec3;

const VALUES_PER_CONTROL_POINT: usize = 9;

impl BezierCurve {
    /// Read a curve from a text file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CurveError> {
        let path = path.as_ref();
        let curve = Self::from_text(&std::fs::read_to_string(path)?)?;
        log::info!(
            "Loaded bezier curve from {} ({} control points, loop: {})",
            path.display(),
            curve.control_points().len(),
            curve.is_loop()
        );
        Ok(curve)
    }

    /// Write the curve to a text file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), CurveError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_text())?;
        log::info!("Saved bezier curve to {}", path.display());
        Ok(())
    }

    /// Parse the text format
    pub fn from_text(text: &str) -> Result<Self, CurveError> {
        let values = text
            .split_whitespace()
            .enumerate()
            .map(|(position, token)| {
                token.parse::<f32>().map_err(|_| CurveError::Parse {
                    token: token.to_owned(),
                    position,
                })
            })
            .collect::<Result<Vec<f32>, _>>()?;

        let trailing = values.len() % VALUES_PER_CONTROL_POINT;
        if trailing != 0 {
            return Err(CurveError::IncompleteControlPoint { values: trailing });
        }

        let control_points = values
            .chunks_exact(VALUES_PER_CONTROL_POINT)
            .map(|v| {
                BezierControlPoint::new(
                    Vec3::new(v[0], v[1], v[2]),
                    Vec3::new(v[3], v[4], v[5]),
                    Vec3::new(v[6], v[7], v[8]),
                )
            })
            .collect();
        Self::new(control_points)
    }

    /// Render the text format
    ///
    /// Numbers use the shortest representation that parses back to the same
    /// `f32`.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for point in self.control_points() {
            let [p, l, r] = [point.position, point.handle_left, point.handle_right];
            // writing into a String cannot fail
            let _ = writeln!(
                text,
                "{} {} {} {} {} {} {} {} {}",
                p.x, p.y, p.z, l.x, l.y, l.z, r.x, r.y, r.z
            );
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("hover_engine_curve_{}_{name}", std::process::id()))
    }

    fn looping_curve() -> BezierCurve {
        let start = BezierControlPoint::new(
            Vec3::new(0.1, -2.5, 3.0),
            Vec3::new(-1.0 / 3.0, 0.0, 1e-7),
            Vec3::new(12345.678, 0.5, -0.25),
        );
        BezierCurve::new(vec![
            start,
            BezierControlPoint::new(Vec3::new(20.0, 1.0, 0.0), Vec3::new(18.0, 1.0, 0.0), Vec3::new(22.0, 1.0, 0.0)),
            start,
        ])
        .unwrap()
    }

    #[test]
    fn test_file_roundtrip_preserves_points_and_loop() {
        let path = temp_path("loop.txt");
        let curve = looping_curve();
        curve.write_to_file(&path).unwrap();
        let loaded = BezierCurve::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(loaded.is_loop());
        assert_eq!(loaded.control_points().len(), 3);
        for (a, b) in loaded.control_points().iter().zip(curve.control_points()) {
            assert_relative_eq!(a.position, b.position, epsilon = 1e-5);
            assert_relative_eq!(a.handle_left, b.handle_left, epsilon = 1e-5);
            assert_relative_eq!(a.handle_right, b.handle_right, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_parse_accepts_any_whitespace() {
        let curve = BezierCurve::from_text("0 0 0\t1 1 1\n2 2 2   3 3 3 4 4 4\n\n5 5 5\n").unwrap();
        assert_eq!(curve.control_points().len(), 2);
        assert!(!curve.is_loop());
        assert_eq!(curve.control_points()[1].handle_right, Vec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_parse_rejects_bad_token() {
        let result = BezierCurve::from_text("0 0 0 1 1 x 2 2 2");
        assert!(matches!(result, Err(CurveError::Parse { ref token, position: 5 }) if token == "x"));
    }

    #[test]
    fn test_parse_rejects_incomplete_point() {
        let result = BezierCurve::from_text("0 0 0 1 1 1 2 2 2 3 3");
        assert!(matches!(result, Err(CurveError::IncompleteControlPoint { values: 2 })));
    }

    #[test]
    fn test_parse_rejects_empty_file() {
        assert!(matches!(BezierCurve::from_text(" \n"), Err(CurveError::Empty)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = BezierCurve::load_from_file(temp_path("does_not_exist.txt"));
        assert!(matches!(result, Err(CurveError::Io(_))));
    }
}
