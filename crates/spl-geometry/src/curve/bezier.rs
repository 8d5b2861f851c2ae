//! Bezier curves: Bernstein-polynomial and De Casteljau evaluation.

use serde::{Deserialize, Serialize};
use spl_core::{Result, SplError};
use spl_math::{DVec3, Interval, Point3, Vector3};

use super::Curve;

/// Bernstein basis values B_{0,degree}(s) .. B_{degree,degree}(s).
pub(crate) fn all_bernstein(degree: usize, s: f64) -> Vec<f64> {
    let mut b = vec![0.0; degree + 1];
    b[0] = 1.0;
    let s1 = 1.0 - s;

    for j in 1..=degree {
        let mut saved = 0.0;
        for k in 0..j {
            let temp = b[k];
            b[k] = saved + s1 * temp;
            saved = s * temp;
        }
        b[j] = saved;
    }

    b
}

/// A Bezier curve of degree `control_points.len() - 1`, evaluated over an
/// external interval mapped onto the Bernstein domain `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BezierCurve {
    pub control_points: Vec<Point3>,
    pub interval: Interval,
}

impl BezierCurve {
    pub fn new(control_points: Vec<Point3>) -> Result<Self> {
        Self::with_interval(control_points, Interval::UNIT)
    }

    pub fn with_interval(control_points: Vec<Point3>, interval: Interval) -> Result<Self> {
        if control_points.is_empty() {
            return Err(SplError::Geometry(
                "Bezier curve requires at least one control point".into(),
            ));
        }
        Ok(Self {
            control_points,
            interval,
        })
    }

    pub fn degree(&self) -> usize {
        self.control_points.len() - 1
    }

    fn local(&self, t: f64) -> f64 {
        self.interval.normalize(self.interval.clamp(t))
    }

    /// Evaluate by repeated linear interpolation (De Casteljau corner
    /// cutting). Agrees with the Bernstein evaluation of [`Curve::point_at`].
    pub fn point_by_de_casteljau(&self, t: f64) -> Point3 {
        let s = self.local(t);
        let mut q = self.control_points.clone();
        for j in 1..q.len() {
            for i in 0..(q.len() - j) {
                q[i] = q[i].lerp(q[i + 1], s);
            }
        }
        q[0]
    }

    /// Evaluate the curve and its derivatives up to `order` at `t`.
    ///
    /// Uses iterated forward differencing of the control polygon; the k-th
    /// derivative picks up a chain-rule factor for the interval remap.
    pub fn derivatives(&self, t: f64, order: usize) -> Vec<Vector3> {
        let s = self.local(t);
        let scale = 1.0 / self.interval.length();

        let mut result = Vec::with_capacity(order + 1);
        let mut points = self.control_points.clone();
        let mut factor = 1.0;
        let mut degree = self.degree();

        for _ in 0..=order {
            if points.is_empty() {
                result.push(DVec3::ZERO);
                continue;
            }
            let basis = all_bernstein(points.len() - 1, s);
            let mut d = DVec3::ZERO;
            for (b, p) in basis.iter().zip(&points) {
                d += *b * *p;
            }
            result.push(factor * d);

            // Difference the control polygon for the next order
            factor *= degree as f64 * scale;
            points = points.windows(2).map(|w| w[1] - w[0]).collect();
            degree = degree.saturating_sub(1);
        }

        result
    }

    pub fn tangent_at(&self, t: f64) -> Vector3 {
        self.derivatives(t, 1)[1]
    }
}

impl Curve for BezierCurve {
    fn point_at(&self, t: f64) -> Point3 {
        let basis = all_bernstein(self.degree(), self.local(t));
        let mut point = DVec3::ZERO;
        for (b, p) in basis.iter().zip(&self.control_points) {
            point += *b * *p;
        }
        point
    }

    fn domain(&self) -> (f64, f64) {
        (self.interval.lo, self.interval.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cubic() -> BezierCurve {
        BezierCurve::new(vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_all_bernstein_partition_of_unity() {
        for degree in 1..=5 {
            for step in 0..=10 {
                let s = step as f64 / 10.0;
                let b = all_bernstein(degree, s);
                let sum: f64 = b.iter().sum();
                assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_endpoint_interpolation() {
        let curve = cubic();
        assert!((curve.point_at(0.0) - DVec3::ZERO).length() < 1e-12);
        assert!((curve.point_at(1.0) - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn test_bernstein_agrees_with_de_casteljau() {
        let curve = cubic();
        for step in 0..=20 {
            let t = step as f64 / 20.0;
            let a = curve.point_at(t);
            let b = curve.point_by_de_casteljau(t);
            assert!(
                (a - b).length() < 1e-12,
                "Bernstein vs De Casteljau mismatch at t={}",
                t
            );
        }
    }

    #[test]
    fn test_midpoint_of_symmetric_cubic() {
        // De Casteljau midpoint of {(0,0),(0,1),(1,1),(1,0)} at t = 0.5
        let p = cubic().point_at(0.5);
        assert_relative_eq!(p.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_derivatives_of_line() {
        let curve = BezierCurve::with_interval(
            vec![DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0)],
            Interval::new(0.0, 2.0).unwrap(),
        )
        .unwrap();

        // Arc-length parameterized line: unit tangent everywhere
        let ders = curve.derivatives(1.3, 2);
        assert!((ders[1] - DVec3::X).length() < 1e-12);
        assert_eq!(ders[2], DVec3::ZERO);
    }

    #[test]
    fn test_quadratic_derivative_closed_form() {
        // C(s) = (1-s)^2 P0 + 2s(1-s) P1 + s^2 P2 over [0,1]
        let p0 = DVec3::new(0.0, 0.0, 0.0);
        let p1 = DVec3::new(0.5, 1.0, 0.0);
        let p2 = DVec3::new(1.0, 0.0, 0.0);
        let curve = BezierCurve::new(vec![p0, p1, p2]).unwrap();

        let s = 0.3;
        let expected = 2.0 * ((1.0 - s) * (p1 - p0) + s * (p2 - p1));
        let ders = curve.derivatives(s, 1);
        assert!((ders[1] - expected).length() < 1e-12);
    }
}
