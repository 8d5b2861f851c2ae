//! Curve traits and implementations.

mod bezier;
mod bspline;
mod parametric;
mod power;

use spl_math::Point3;

pub(crate) use bezier::all_bernstein;
pub use bezier::BezierCurve;
pub use bspline::{BSplineCurve, NurbsCurve};
pub use parametric::{ParametricCurve2, ParametricCurve3};
pub use power::PowerBasisCurve;

/// Trait for parametric curves in 3D space.
///
/// Evaluation clamps out-of-domain parameters to the nearest boundary; a
/// curve has no meaning outside its domain, so the endpoint value is
/// returned rather than an error.
pub trait Curve: Send + Sync {
    /// Evaluate the curve at parameter `t`.
    fn point_at(&self, t: f64) -> Point3;

    /// Return the parameter domain `(t_min, t_max)`.
    fn domain(&self) -> (f64, f64);

    /// Sample `count` equally spaced points across the domain, inclusive of
    /// both endpoints, in increasing parameter order.
    ///
    /// `count == 0` yields an empty vector and `count == 1` the domain start
    /// point, so every count is well-defined.
    fn sample_points(&self, count: usize) -> Vec<Point3> {
        let (lo, hi) = self.domain();
        match count {
            0 => Vec::new(),
            1 => vec![self.point_at(lo)],
            _ => (0..count)
                .map(|i| self.point_at(lo + (hi - lo) * i as f64 / (count - 1) as f64))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_math::{DVec3, Interval};

    #[test]
    fn test_sample_points_counts() {
        let curve = BezierCurve::new(vec![DVec3::ZERO, DVec3::X]).unwrap();

        assert!(curve.sample_points(0).is_empty());

        let one = curve.sample_points(1);
        assert_eq!(one.len(), 1);
        assert!((one[0] - DVec3::ZERO).length() < 1e-12);

        let many = curve.sample_points(5);
        assert_eq!(many.len(), 5);
        assert!((many[0] - DVec3::ZERO).length() < 1e-12);
        assert!((many[4] - DVec3::X).length() < 1e-12);
        // Increasing parameter order
        for w in many.windows(2) {
            assert!(w[1].x > w[0].x);
        }
    }

    #[test]
    fn test_sample_points_respect_interval() {
        let curve = BezierCurve::with_interval(
            vec![DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0)],
            Interval::new(0.0, 4.0).unwrap(),
        )
        .unwrap();

        let pts = curve.sample_points(3);
        assert!((pts[1] - DVec3::X).length() < 1e-12);
    }
}
