//! Tensor-product Bezier surface patches.

use serde::{Deserialize, Serialize};
use spl_core::{Result, SplError};
use spl_math::{DVec3, Interval, Point3, Vector3};

use super::Surface;

/// A Bezier patch: a `(degree_u + 1) x (degree_v + 1)` control grid
/// evaluated with Bernstein polynomials in both directions. No knot-vector
/// logic is involved, which is what makes these the target of surface
/// decomposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BezierSurface {
    pub control_points: Vec<Vec<Point3>>,
    pub interval_u: Interval,
    pub interval_v: Interval,
}

impl BezierSurface {
    pub fn new(control_points: Vec<Vec<Point3>>) -> Result<Self> {
        Self::with_intervals(control_points, Interval::UNIT, Interval::UNIT)
    }

    pub fn with_intervals(
        control_points: Vec<Vec<Point3>>,
        interval_u: Interval,
        interval_v: Interval,
    ) -> Result<Self> {
        if control_points.is_empty() || control_points[0].is_empty() {
            return Err(SplError::Geometry(
                "Bezier surface requires a non-empty control grid".into(),
            ));
        }
        let cols = control_points[0].len();
        if control_points.iter().any(|row| row.len() != cols) {
            return Err(SplError::Geometry(
                "Bezier surface control grid must be rectangular".into(),
            ));
        }
        Ok(Self {
            control_points,
            interval_u,
            interval_v,
        })
    }

    pub fn degree_u(&self) -> usize {
        self.control_points.len() - 1
    }

    pub fn degree_v(&self) -> usize {
        self.control_points[0].len() - 1
    }

    fn locals(&self, u: f64, v: f64) -> (f64, f64) {
        (
            self.interval_u.normalize(self.interval_u.clamp(u)),
            self.interval_v.normalize(self.interval_v.clamp(v)),
        )
    }

    /// First partial derivatives `(S_u, S_v)`, via forward differencing of
    /// the control grid in each direction.
    pub fn partial_derivatives(&self, u: f64, v: f64) -> (Vector3, Vector3) {
        let (s, t) = self.locals(u, v);
        let p = self.degree_u();
        let q = self.degree_v();

        let bu = crate::curve::all_bernstein(p, s);
        let bv = crate::curve::all_bernstein(q, t);

        let mut du = DVec3::ZERO;
        if p > 0 {
            let bu1 = crate::curve::all_bernstein(p - 1, s);
            for (i, &bi) in bu1.iter().enumerate() {
                for (j, &bj) in bv.iter().enumerate() {
                    du += bi * bj * (self.control_points[i + 1][j] - self.control_points[i][j]);
                }
            }
            du *= p as f64 / self.interval_u.length();
        }

        let mut dv = DVec3::ZERO;
        if q > 0 {
            let bv1 = crate::curve::all_bernstein(q - 1, t);
            for (i, &bi) in bu.iter().enumerate() {
                for (j, &bj) in bv1.iter().enumerate() {
                    dv += bi * bj * (self.control_points[i][j + 1] - self.control_points[i][j]);
                }
            }
            dv *= q as f64 / self.interval_v.length();
        }

        (du, dv)
    }
}

impl Surface for BezierSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        let (s, t) = self.locals(u, v);
        let bu = crate::curve::all_bernstein(self.degree_u(), s);
        let bv = crate::curve::all_bernstein(self.degree_v(), t);

        let mut point = DVec3::ZERO;
        for (i, &bi) in bu.iter().enumerate() {
            for (j, &bj) in bv.iter().enumerate() {
                point += bi * bj * self.control_points[i][j];
            }
        }
        point
    }

    fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        let (du, dv) = self.partial_derivatives(u, v);
        let n = du.cross(dv);
        let len = n.length();
        if len < 1e-15 {
            DVec3::Z
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

    fn bilinear() -> BezierSurface {
        BezierSurface::new(vec![
            vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0)],
            vec![DVec3::new(0.0, 1.0, 0.0), DVec3::new(1.0, 1.0, 0.0)],
        ])
        .unwrap()
    }

    #[test]
    fn test_corners_interpolate() {
        let surf = bilinear();
        assert!((surf.point_at(0.0, 0.0) - DVec3::new(0.0, 0.0, 0.0)).length() < 1e-12);
        assert!((surf.point_at(1.0, 0.0) - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-12);
        assert!((surf.point_at(0.0, 1.0) - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-12);
        assert!((surf.point_at(1.0, 1.0) - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_center_and_normal() {
        let surf = bilinear();
        let p = surf.point_at(0.5, 0.5);
        assert!((p - DVec3::new(0.5, 0.5, 0.0)).length() < 1e-12);

        let n = surf.normal_at(0.5, 0.5);
        assert!(
            (n - DVec3::Z).length() < 1e-12 || (n + DVec3::Z).length() < 1e-12,
            "Normal of flat patch should be +/-Z, got {:?}",
            n
        );
    }

    #[test]
    fn test_biquadratic_partials() {
        // Paraboloid-like patch z = 4 s t (1-s)(1-t) peaks at the center
        let surf = BezierSurface::new(vec![
            vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 0.5, 0.0), DVec3::new(0.0, 1.0, 0.0)],
            vec![DVec3::new(0.5, 0.0, 0.0), DVec3::new(0.5, 0.5, 1.0), DVec3::new(0.5, 1.0, 0.0)],
            vec![DVec3::new(1.0, 0.0, 0.0), DVec3::new(1.0, 0.5, 0.0), DVec3::new(1.0, 1.0, 0.0)],
        ])
        .unwrap();

        // At the apex both partials are horizontal
        let (du, dv) = surf.partial_derivatives(0.5, 0.5);
        assert!(du.z.abs() < 1e-12);
        assert!(dv.z.abs() < 1e-12);

        let n = surf.normal_at(0.5, 0.5);
        assert!((n.z.abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_ragged_grid() {
        let result = BezierSurface::new(vec![
            vec![DVec3::ZERO, DVec3::X],
            vec![DVec3::Y],
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_interval_remap() {
        let surf = BezierSurface::with_intervals(
            vec![
                vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0)],
                vec![DVec3::new(0.0, 1.0, 0.0), DVec3::new(1.0, 1.0, 0.0)],
            ],
            Interval::new(2.0, 4.0).unwrap(),
            Interval::new(-1.0, 1.0).unwrap(),
        )
        .unwrap();

        let p = surf.point_at(3.0, 0.0);
        assert!((p - DVec3::new(0.5, 0.5, 0.0)).length() < 1e-12);
    }
}
