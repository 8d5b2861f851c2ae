//! Function-defined (parametric) surfaces from caller-supplied closures.

use spl_math::{Interval, Point3, Vector3};

use super::Surface;

/// A surface defined by an arbitrary `(u, v)`-to-point function over a pair
/// of intervals.
///
/// The closure carries no derivative information, so [`Surface::normal_at`]
/// falls back to central finite differences.
pub struct ParametricSurface {
    f: Box<dyn Fn(f64, f64) -> Point3 + Send + Sync>,
    pub interval_u: Interval,
    pub interval_v: Interval,
}

impl ParametricSurface {
    pub fn new<F>(f: F, interval_u: Interval, interval_v: Interval) -> Self
    where
        F: Fn(f64, f64) -> Point3 + Send + Sync + 'static,
    {
        Self {
            f: Box::new(f),
            interval_u,
            interval_v,
        }
    }
}

impl Surface for ParametricSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        (self.f)(self.interval_u.clamp(u), self.interval_v.clamp(v))
    }

    fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        let u = self.interval_u.clamp(u);
        let v = self.interval_v.clamp(v);
        let hu = self.interval_u.length() * 1e-6;
        let hv = self.interval_v.length() * 1e-6;

        // One-sided steps at the boundary, central everywhere else
        let u0 = self.interval_u.clamp(u - hu);
        let u1 = self.interval_u.clamp(u + hu);
        let v0 = self.interval_v.clamp(v - hv);
        let v1 = self.interval_v.clamp(v + hv);

        let du = ((self.f)(u1, v) - (self.f)(u0, v)) / (u1 - u0);
        let dv = ((self.f)(u, v1) - (self.f)(u, v0)) / (v1 - v0);

        let n = du.cross(dv);
        let len = n.length();
        if len < 1e-15 {
            Vector3::Z
        } else {
            n / len
        }
    }

    fn domain_u(&self) -> (f64, f64) {
        (self.interval_u.lo, self.interval_u.hi)
    }

    fn domain_v(&self) -> (f64, f64) {
        (self.interval_v.lo, self.interval_v.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_math::DVec3;
    use std::f64::consts::PI;

    #[test]
    fn test_unit_sphere() {
        let sphere = ParametricSurface::new(
            |theta, phi| {
                DVec3::new(
                    phi.sin() * theta.cos(),
                    phi.sin() * theta.sin(),
                    phi.cos(),
                )
            },
            Interval::new(0.0, 2.0 * PI).unwrap(),
            Interval::new(0.0, PI).unwrap(),
        );

        let grid = sphere.sample_grid(8, 8);
        for p in &grid {
            assert!((p.length() - 1.0).abs() < 1e-12);
        }

        // Sphere normals are radial
        let n = sphere.normal_at(1.0, 1.2);
        let p = sphere.point_at(1.0, 1.2);
        assert!(
            (n - p).length() < 1e-4 || (n + p).length() < 1e-4,
            "sphere normal {:?} not radial at {:?}",
            n,
            p
        );
    }

    #[test]
    fn test_plane_normal() {
        let plane = ParametricSurface::new(
            |u, v| DVec3::new(u, v, 0.0),
            Interval::UNIT,
            Interval::UNIT,
        );

        let n = plane.normal_at(0.5, 0.5);
        assert!((n - DVec3::Z).length() < 1e-9);

        // Clamping applies per direction
        let p = plane.point_at(2.0, -1.0);
        assert!((p - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-12);
    }
}
