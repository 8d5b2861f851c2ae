//! Function-defined (parametric) curves from caller-supplied closures.

use spl_math::{Interval, Point2, Point3};

use super::Curve;

/// A 3D curve defined by an arbitrary parameter-to-point function over an
/// interval.
pub struct ParametricCurve3 {
    f: Box<dyn Fn(f64) -> Point3 + Send + Sync>,
    pub interval: Interval,
}

impl ParametricCurve3 {
    pub fn new<F>(f: F, interval: Interval) -> Self
    where
        F: Fn(f64) -> Point3 + Send + Sync + 'static,
    {
        Self {
            f: Box::new(f),
            interval,
        }
    }
}

impl Curve for ParametricCurve3 {
    fn point_at(&self, t: f64) -> Point3 {
        (self.f)(self.interval.clamp(t))
    }

    fn domain(&self) -> (f64, f64) {
        (self.interval.lo, self.interval.hi)
    }
}

/// A planar curve defined by an arbitrary parameter-to-point function;
/// implements [`Curve`] by embedding the plane at `z = 0`.
pub struct ParametricCurve2 {
    f: Box<dyn Fn(f64) -> Point2 + Send + Sync>,
    pub interval: Interval,
}

impl ParametricCurve2 {
    pub fn new<F>(f: F, interval: Interval) -> Self
    where
        F: Fn(f64) -> Point2 + Send + Sync + 'static,
    {
        Self {
            f: Box::new(f),
            interval,
        }
    }

    /// Evaluate in the plane without the 3D embedding.
    pub fn point2_at(&self, t: f64) -> Point2 {
        (self.f)(self.interval.clamp(t))
    }
}

impl Curve for ParametricCurve2 {
    fn point_at(&self, t: f64) -> Point3 {
        self.point2_at(t).extend(0.0)
    }

    fn domain(&self) -> (f64, f64) {
        (self.interval.lo, self.interval.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_math::{DVec2, DVec3};
    use std::f64::consts::PI;

    #[test]
    fn test_helix() {
        let helix = ParametricCurve3::new(
            |t| DVec3::new(t.cos(), t.sin(), t / PI),
            Interval::new(0.0, 2.0 * PI).unwrap(),
        );

        let p = helix.point_at(PI);
        assert!((p - DVec3::new(-1.0, 0.0, 1.0)).length() < 1e-12);

        // Clamped beyond the domain
        let q = helix.point_at(10.0 * PI);
        assert!((q - helix.point_at(2.0 * PI)).length() < 1e-12);
    }

    #[test]
    fn test_planar_circle_sampling() {
        let circle = ParametricCurve2::new(
            |t| DVec2::new(t.cos(), t.sin()),
            Interval::new(0.0, 2.0 * PI).unwrap(),
        );

        let pts = circle.sample_points(9);
        assert_eq!(pts.len(), 9);
        for p in &pts {
            assert!((p.length() - 1.0).abs() < 1e-12);
            assert_eq!(p.z, 0.0);
        }
    }
}
