//! B-spline and NURBS tensor-product surfaces.

use serde::{Deserialize, Serialize};
use spl_core::{Result, SplError};
use spl_math::{DVec4, Interval, Point3, Vector3};

use super::{BezierSurface, Surface};
use crate::nurbs::{decompose, eval, knot, refine, Direction};

fn validate_grid(control_points: &[Vec<Point3>]) -> Result<()> {
    if control_points.is_empty() || control_points[0].is_empty() {
        return Err(SplError::Geometry(
            "Surface requires a non-empty control grid".into(),
        ));
    }
    let cols = control_points[0].len();
    if control_points.iter().any(|row| row.len() != cols) {
        return Err(SplError::Geometry(
            "Surface control grid must be rectangular".into(),
        ));
    }
    Ok(())
}

fn validate_knots(direction: &str, degree: usize, knots: &[f64], n_ctrl: usize) -> Result<()> {
    if knots.len() != n_ctrl + degree + 1 {
        return Err(SplError::KnotVector(format!(
            "{} knot vector length must be n + p + 1, got {} knots for {} control points with degree {}",
            direction,
            knots.len(),
            n_ctrl,
            degree
        )));
    }
    Ok(())
}

/// A B-spline surface over a rectangular control grid indexed `[u][v]`.
///
/// Like the curves, the surface carries external parameter intervals in both
/// directions that remap affinely onto the knot domains. By default both
/// intervals are the respective knot domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BSplineSurface {
    pub degree_u: usize,
    pub degree_v: usize,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub control_points: Vec<Vec<Point3>>,
    pub interval_u: Interval,
    pub interval_v: Interval,
}

impl BSplineSurface {
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        control_points: Vec<Vec<Point3>>,
    ) -> Result<Self> {
        validate_grid(&control_points)?;
        validate_knots("U", degree_u, &knots_u, control_points.len())?;
        validate_knots("V", degree_v, &knots_v, control_points[0].len())?;

        let (u_lo, u_hi) = knot::domain(degree_u, &knots_u);
        let (v_lo, v_hi) = knot::domain(degree_v, &knots_v);
        let interval_u = Interval::new(u_lo, u_hi)?;
        let interval_v = Interval::new(v_lo, v_hi)?;

        Ok(Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
            interval_u,
            interval_v,
        })
    }

    pub fn with_intervals(mut self, interval_u: Interval, interval_v: Interval) -> Self {
        self.interval_u = interval_u;
        self.interval_v = interval_v;
        self
    }

    fn knot_interval_u(&self) -> Interval {
        let (lo, hi) = knot::domain(self.degree_u, &self.knots_u);
        Interval { lo, hi }
    }

    fn knot_interval_v(&self) -> Interval {
        let (lo, hi) = knot::domain(self.degree_v, &self.knots_v);
        Interval { lo, hi }
    }

    fn knot_params(&self, u: f64, v: f64) -> (f64, f64) {
        (
            self.interval_u.map_to(&self.knot_interval_u(), u),
            self.interval_v.map_to(&self.knot_interval_v(), v),
        )
    }

    fn knot_param(&self, direction: Direction, t: f64) -> f64 {
        match direction {
            Direction::U => self.interval_u.map_to(&self.knot_interval_u(), t),
            Direction::V => self.interval_v.map_to(&self.knot_interval_v(), t),
        }
    }

    /// Evaluate the surface and its partial derivatives up to total `order`.
    ///
    /// Returns `skl` where `skl[k][l]` is the derivative of order `k` in `u`
    /// and `l` in `v`, with respect to the external parameters.
    pub fn derivatives(&self, u: f64, v: f64, order: usize) -> Vec<Vec<Vector3>> {
        let (su, sv) = self.knot_params(u, v);
        let mut skl = eval::surface_derivatives(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            su,
            sv,
            order,
        );

        // Chain rule for the interval remap in each direction
        let scale_u = self.interval_u.derivative_scale(&self.knot_interval_u());
        let scale_v = self.interval_v.derivative_scale(&self.knot_interval_v());
        for (k, row) in skl.iter_mut().enumerate() {
            for (l, d) in row.iter_mut().enumerate() {
                *d *= scale_u.powi(k as i32) * scale_v.powi(l as i32);
            }
        }

        skl
    }

    /// Return a new surface with `t` inserted `times` times into the knot
    /// vector of the given direction. The shape is unchanged.
    pub fn knot_insertion(&self, direction: Direction, t: f64, times: usize) -> Self {
        let s = self.knot_param(direction, t);
        let lifted = lift_grid(&self.control_points);
        let (degree, knots) = match direction {
            Direction::U => (self.degree_u, &self.knots_u),
            Direction::V => (self.degree_v, &self.knots_v),
        };
        let (new_knots, grid) =
            refine::surface_knot_insertion(direction, degree, knots, &lifted, s, times);
        self.rebuilt(direction, new_knots, project_grid(&grid))
    }

    /// Return a new surface with a sorted batch of external-domain
    /// parameters inserted as knots in one direction.
    pub fn refine_knots(&self, direction: Direction, params: &[f64]) -> Self {
        let inserts: Vec<f64> = params
            .iter()
            .map(|&t| self.knot_param(direction, t))
            .collect();
        let lifted = lift_grid(&self.control_points);
        let (degree, knots) = match direction {
            Direction::U => (self.degree_u, &self.knots_u),
            Direction::V => (self.degree_v, &self.knots_v),
        };
        let (new_knots, grid) =
            refine::refine_surface_knots(direction, degree, knots, &lifted, &inserts);
        self.rebuilt(direction, new_knots, project_grid(&grid))
    }

    fn rebuilt(
        &self,
        direction: Direction,
        new_knots: Vec<f64>,
        control_points: Vec<Vec<Point3>>,
    ) -> Self {
        let mut out = Self {
            degree_u: self.degree_u,
            degree_v: self.degree_v,
            knots_u: self.knots_u.clone(),
            knots_v: self.knots_v.clone(),
            control_points,
            interval_u: self.interval_u,
            interval_v: self.interval_v,
        };
        match direction {
            Direction::U => out.knots_u = new_knots,
            Direction::V => out.knots_v = new_knots,
        }
        out
    }

    /// Decompose into a grid of Bezier patches, one per knot-span pair.
    /// Patch `[i][j]` covers the i-th u-span and j-th v-span; its intervals
    /// are the matching sub-ranges of the external intervals, so patches
    /// evaluate at global parameters.
    pub fn decompose(&self) -> Vec<Vec<BezierSurface>> {
        let lifted = lift_grid(&self.control_points);
        let iv_u = self.knot_interval_u();
        let iv_v = self.knot_interval_v();

        decompose::decompose_surface(Direction::U, self.degree_u, &self.knots_u, &lifted)
            .into_iter()
            .map(|strip| {
                let (u_lo, u_hi) = strip.span;
                let interval_u = Interval {
                    lo: iv_u.map_to(&self.interval_u, u_lo),
                    hi: iv_u.map_to(&self.interval_u, u_hi),
                };
                decompose::decompose_surface(
                    Direction::V,
                    self.degree_v,
                    &self.knots_v,
                    &strip.control_points,
                )
                .into_iter()
                .map(|patch| {
                    let (v_lo, v_hi) = patch.span;
                    BezierSurface {
                        control_points: project_grid(&patch.control_points),
                        interval_u,
                        interval_v: Interval {
                            lo: iv_v.map_to(&self.interval_v, v_lo),
                            hi: iv_v.map_to(&self.interval_v, v_hi),
                        },
                    }
                })
                .collect()
            })
            .collect()
    }
}

impl Surface for BSplineSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        let (su, sv) = self.knot_params(u, v);
        eval::surface_point(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            su,
            sv,
        )
    }

    fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        let skl = self.derivatives(u, v, 1);
        let n = skl[1][0].cross(skl[0][1]);
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

/// A NURBS surface: a B-spline surface with per-control-point weights.
///
/// Refinement and decomposition operate on the homogeneous control grid
/// `(w * P, w)` so the rational shape survives every knot operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NurbsSurface {
    pub degree_u: usize,
    pub degree_v: usize,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub control_points: Vec<Vec<Point3>>,
    pub weights: Vec<Vec<f64>>,
    pub interval_u: Interval,
    pub interval_v: Interval,
}

impl NurbsSurface {
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        control_points: Vec<Vec<Point3>>,
        weights: Vec<Vec<f64>>,
    ) -> Result<Self> {
        validate_grid(&control_points)?;
        validate_knots("U", degree_u, &knots_u, control_points.len())?;
        validate_knots("V", degree_v, &knots_v, control_points[0].len())?;

        if weights.len() != control_points.len()
            || weights
                .iter()
                .zip(&control_points)
                .any(|(wr, cr)| wr.len() != cr.len())
        {
            return Err(SplError::Geometry(
                "Weight grid must match the control grid".into(),
            ));
        }
        if weights.iter().flatten().any(|&w| w <= 0.0) {
            return Err(SplError::Geometry("All weights must be positive".into()));
        }

        let (u_lo, u_hi) = knot::domain(degree_u, &knots_u);
        let (v_lo, v_hi) = knot::domain(degree_v, &knots_v);
        let interval_u = Interval::new(u_lo, u_hi)?;
        let interval_v = Interval::new(v_lo, v_hi)?;

        Ok(Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
            weights,
            interval_u,
            interval_v,
        })
    }

    pub fn with_intervals(mut self, interval_u: Interval, interval_v: Interval) -> Self {
        self.interval_u = interval_u;
        self.interval_v = interval_v;
        self
    }

    fn knot_interval_u(&self) -> Interval {
        let (lo, hi) = knot::domain(self.degree_u, &self.knots_u);
        Interval { lo, hi }
    }

    fn knot_interval_v(&self) -> Interval {
        let (lo, hi) = knot::domain(self.degree_v, &self.knots_v);
        Interval { lo, hi }
    }

    fn knot_params(&self, u: f64, v: f64) -> (f64, f64) {
        (
            self.interval_u.map_to(&self.knot_interval_u(), u),
            self.interval_v.map_to(&self.knot_interval_v(), v),
        )
    }

    fn knot_param(&self, direction: Direction, t: f64) -> f64 {
        match direction {
            Direction::U => self.interval_u.map_to(&self.knot_interval_u(), t),
            Direction::V => self.interval_v.map_to(&self.knot_interval_v(), t),
        }
    }

    /// Homogeneous control grid `(w * P, w)`.
    pub fn homogeneous_control_points(&self) -> Vec<Vec<DVec4>> {
        self.control_points
            .iter()
            .zip(&self.weights)
            .map(|(pr, wr)| {
                pr.iter()
                    .zip(wr)
                    .map(|(p, &w)| (*p * w).extend(w))
                    .collect()
            })
            .collect()
    }

    fn from_homogeneous(
        &self,
        direction: Direction,
        new_knots: Vec<f64>,
        grid: Vec<Vec<DVec4>>,
    ) -> Self {
        let weights: Vec<Vec<f64>> = grid
            .iter()
            .map(|row| row.iter().map(|q| q.w).collect())
            .collect();
        let control_points: Vec<Vec<Point3>> = grid
            .iter()
            .map(|row| row.iter().map(|q| q.truncate() / q.w).collect())
            .collect();

        let mut out = Self {
            degree_u: self.degree_u,
            degree_v: self.degree_v,
            knots_u: self.knots_u.clone(),
            knots_v: self.knots_v.clone(),
            control_points,
            weights,
            interval_u: self.interval_u,
            interval_v: self.interval_v,
        };
        match direction {
            Direction::U => out.knots_u = new_knots,
            Direction::V => out.knots_v = new_knots,
        }
        out
    }

    /// Evaluate the surface and its rational partial derivatives up to total
    /// `order`, with respect to the external parameters.
    pub fn derivatives(&self, u: f64, v: f64, order: usize) -> Vec<Vec<Vector3>> {
        let (su, sv) = self.knot_params(u, v);
        let mut skl = eval::nurbs_surface_derivatives(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            &self.weights,
            su,
            sv,
            order,
        );

        let scale_u = self.interval_u.derivative_scale(&self.knot_interval_u());
        let scale_v = self.interval_v.derivative_scale(&self.knot_interval_v());
        for (k, row) in skl.iter_mut().enumerate() {
            for (l, d) in row.iter_mut().enumerate() {
                *d *= scale_u.powi(k as i32) * scale_v.powi(l as i32);
            }
        }

        skl
    }

    /// Return a new surface with `t` inserted `times` times into the knot
    /// vector of the given direction.
    pub fn knot_insertion(&self, direction: Direction, t: f64, times: usize) -> Self {
        let s = self.knot_param(direction, t);
        let (degree, knots) = match direction {
            Direction::U => (self.degree_u, &self.knots_u),
            Direction::V => (self.degree_v, &self.knots_v),
        };
        let (new_knots, grid) = refine::surface_knot_insertion(
            direction,
            degree,
            knots,
            &self.homogeneous_control_points(),
            s,
            times,
        );
        self.from_homogeneous(direction, new_knots, grid)
    }

    /// Return a new surface with a sorted batch of parameters inserted as
    /// knots in one direction.
    pub fn refine_knots(&self, direction: Direction, params: &[f64]) -> Self {
        let inserts: Vec<f64> = params
            .iter()
            .map(|&t| self.knot_param(direction, t))
            .collect();
        let (degree, knots) = match direction {
            Direction::U => (self.degree_u, &self.knots_u),
            Direction::V => (self.degree_v, &self.knots_v),
        };
        let (new_knots, grid) = refine::refine_surface_knots(
            direction,
            degree,
            knots,
            &self.homogeneous_control_points(),
            &inserts,
        );
        self.from_homogeneous(direction, new_knots, grid)
    }

    /// Decompose into a grid of rational Bezier patches, expressed as
    /// single-span NURBS surfaces. Patch intervals are the matching
    /// sub-ranges of the external intervals, so patches evaluate at global
    /// parameters.
    pub fn decompose(&self) -> Vec<Vec<NurbsSurface>> {
        let p = self.degree_u;
        let q = self.degree_v;
        let grid = self.homogeneous_control_points();
        let iv_u = self.knot_interval_u();
        let iv_v = self.knot_interval_v();

        decompose::decompose_surface(Direction::U, p, &self.knots_u, &grid)
            .into_iter()
            .map(|strip| {
                let (u_lo, u_hi) = strip.span;
                let interval_u = Interval {
                    lo: iv_u.map_to(&self.interval_u, u_lo),
                    hi: iv_u.map_to(&self.interval_u, u_hi),
                };
                let mut knots_u = vec![u_lo; p + 1];
                knots_u.extend(std::iter::repeat(u_hi).take(p + 1));

                decompose::decompose_surface(
                    Direction::V,
                    q,
                    &self.knots_v,
                    &strip.control_points,
                )
                .into_iter()
                .map(|patch| {
                    let (v_lo, v_hi) = patch.span;
                    let mut knots_v = vec![v_lo; q + 1];
                    knots_v.extend(std::iter::repeat(v_hi).take(q + 1));

                    let weights: Vec<Vec<f64>> = patch
                        .control_points
                        .iter()
                        .map(|row| row.iter().map(|c| c.w).collect())
                        .collect();
                    let control_points: Vec<Vec<Point3>> = patch
                        .control_points
                        .iter()
                        .map(|row| row.iter().map(|c| c.truncate() / c.w).collect())
                        .collect();

                    NurbsSurface {
                        degree_u: p,
                        degree_v: q,
                        knots_u: knots_u.clone(),
                        knots_v,
                        control_points,
                        weights,
                        interval_u,
                        interval_v: Interval {
                            lo: iv_v.map_to(&self.interval_v, v_lo),
                            hi: iv_v.map_to(&self.interval_v, v_hi),
                        },
                    }
                })
                .collect()
            })
            .collect()
    }
}

impl Surface for NurbsSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        let (su, sv) = self.knot_params(u, v);
        eval::nurbs_surface_point(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            &self.weights,
            su,
            sv,
        )
    }

    fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        let skl = self.derivatives(u, v, 1);
        let n = skl[1][0].cross(skl[0][1]);
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

fn lift_grid(grid: &[Vec<Point3>]) -> Vec<Vec<DVec4>> {
    grid.iter()
        .map(|row| row.iter().map(|p| p.extend(1.0)).collect())
        .collect()
}

fn project_grid(grid: &[Vec<DVec4>]) -> Vec<Vec<Point3>> {
    grid.iter()
        .map(|row| row.iter().map(|q| q.truncate() / q.w).collect())
        .collect()
}
