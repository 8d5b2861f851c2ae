//! Surface traits and implementations.

mod bezier;
mod bspline;
mod parametric;

use spl_math::{Point3, Vector3};

pub use bezier::BezierSurface;
pub use bspline::{BSplineSurface, NurbsSurface};
pub use parametric::ParametricSurface;

/// Trait for parametric surfaces in 3D space.
///
/// Out-of-domain parameters clamp to the nearest boundary in each direction
/// independently.
pub trait Surface: Send + Sync {
    /// Evaluate the surface at parameters `(u, v)`.
    fn point_at(&self, u: f64, v: f64) -> Point3;

    /// Evaluate the unit surface normal at parameters `(u, v)`.
    fn normal_at(&self, u: f64, v: f64) -> Vector3;

    /// Return the u-parameter domain `(u_min, u_max)`.
    fn domain_u(&self) -> (f64, f64);

    /// Return the v-parameter domain `(v_min, v_max)`.
    fn domain_v(&self) -> (f64, f64);

    /// Sample a `count_u x count_v` grid of points, row-major over `u` then
    /// `v`: the point at `(u_i, v_j)` lands at index `i * count_v + j`.
    ///
    /// Counts follow the curve convention: 0 yields nothing in that
    /// direction, 1 yields the domain start.
    fn sample_grid(&self, count_u: usize, count_v: usize) -> Vec<Point3> {
        let (u_min, u_max) = self.domain_u();
        let (v_min, v_max) = self.domain_v();

        let params = |lo: f64, hi: f64, count: usize| -> Vec<f64> {
            match count {
                0 => Vec::new(),
                1 => vec![lo],
                _ => (0..count)
                    .map(|i| lo + (hi - lo) * i as f64 / (count - 1) as f64)
                    .collect(),
            }
        };

        let us = params(u_min, u_max, count_u);
        let vs = params(v_min, v_max, count_v);

        let mut points = Vec::with_capacity(us.len() * vs.len());
        for &u in &us {
            for &v in &vs {
                points.push(self.point_at(u, v));
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_math::DVec3;

    #[test]
    fn test_sample_grid_row_major_order() {
        let surf = BezierSurface::new(vec![
            vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0)],
            vec![DVec3::new(1.0, 0.0, 0.0), DVec3::new(1.0, 1.0, 0.0)],
        ])
        .unwrap();

        let grid = surf.sample_grid(3, 2);
        assert_eq!(grid.len(), 6);
        // Row-major: u varies slowest
        assert!((grid[0] - DVec3::new(0.0, 0.0, 0.0)).length() < 1e-12);
        assert!((grid[1] - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-12);
        assert!((grid[2] - DVec3::new(0.5, 0.0, 0.0)).length() < 1e-12);
        assert!((grid[5] - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_sample_grid_degenerate_counts() {
        let surf = BezierSurface::new(vec![
            vec![DVec3::ZERO, DVec3::Y],
            vec![DVec3::X, DVec3::new(1.0, 1.0, 0.0)],
        ])
        .unwrap();

        assert!(surf.sample_grid(0, 5).is_empty());
        assert!(surf.sample_grid(5, 0).is_empty());
        let line = surf.sample_grid(1, 3);
        assert_eq!(line.len(), 3);
        // u pinned at the domain start
        assert!((line[0] - DVec3::ZERO).length() < 1e-12);
        assert!((line[2] - DVec3::Y).length() < 1e-12);
    }
}
