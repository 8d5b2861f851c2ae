//! B-spline and NURBS curve implementations.

use serde::{Deserialize, Serialize};
use spl_core::{Result, SplError, Tolerance};
use spl_math::{DVec4, Interval, Point3, Vector3};

use super::{BezierCurve, Curve};
use crate::nurbs::{decompose, eval, knot, refine};

fn validate_knots(degree: usize, knots: &[f64], n_ctrl: usize) -> Result<()> {
    if knots.len() != n_ctrl + degree + 1 {
        return Err(SplError::KnotVector(format!(
            "Knot vector length must be n + p + 1, got {} knots for {} control points with degree {}",
            knots.len(),
            n_ctrl,
            degree
        )));
    }
    Ok(())
}

/// A B-spline curve defined by degree, knot vector, and control points.
///
/// The curve carries an external parameter interval remapped affinely onto
/// the knot vector's native domain, so a curve with integer knot spans can
/// still be driven over `[0, 1]`. By default the interval is the knot
/// domain itself and the remap is the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BSplineCurve {
    pub degree: usize,
    pub knots: Vec<f64>,
    pub control_points: Vec<Point3>,
    pub interval: Interval,
}

impl BSplineCurve {
    pub fn new(degree: usize, knots: Vec<f64>, control_points: Vec<Point3>) -> Result<Self> {
        validate_knots(degree, &knots, control_points.len())?;
        let (lo, hi) = knot::domain(degree, &knots);
        let interval = Interval::new(lo, hi)?;
        Ok(Self {
            degree,
            knots,
            control_points,
            interval,
        })
    }

    pub fn with_interval(
        degree: usize,
        knots: Vec<f64>,
        control_points: Vec<Point3>,
        interval: Interval,
    ) -> Result<Self> {
        validate_knots(degree, &knots, control_points.len())?;
        Ok(Self {
            degree,
            knots,
            control_points,
            interval,
        })
    }

    fn knot_interval(&self) -> Interval {
        let (lo, hi) = knot::domain(self.degree, &self.knots);
        Interval { lo, hi }
    }

    /// Map an external parameter into the knot domain (clamping first).
    fn knot_param(&self, t: f64) -> f64 {
        self.interval.map_to(&self.knot_interval(), t)
    }

    pub fn tangent_at(&self, t: f64) -> Vector3 {
        self.derivatives(t, 1)[1]
    }

    /// Evaluate the curve and its derivatives up to `order` at `t`.
    ///
    /// Entry k is the k-th derivative with respect to the external
    /// parameter; orders above the degree are zero.
    pub fn derivatives(&self, t: f64, order: usize) -> Vec<Vector3> {
        let u = self.knot_param(t);
        let mut ders =
            eval::curve_derivatives(self.degree, &self.knots, &self.control_points, u, order);

        // Chain rule for the interval remap
        let scale = self.interval.derivative_scale(&self.knot_interval());
        let mut factor = scale;
        for d in ders.iter_mut().skip(1) {
            *d *= factor;
            factor *= scale;
        }

        ders
    }

    /// Return a new curve with `t` inserted into the knot vector `times`
    /// times (capped at `degree - multiplicity`). The shape is unchanged.
    pub fn knot_insertion(&self, t: f64, times: usize) -> Self {
        let u = self.knot_param(t);
        let lifted = lift(&self.control_points);
        let (knots, ctrl) = refine::curve_knot_insertion(self.degree, &self.knots, &lifted, u, times);
        Self {
            degree: self.degree,
            knots,
            control_points: project(&ctrl),
            interval: self.interval,
        }
    }

    /// Return a new curve with a sorted batch of external-domain parameters
    /// inserted as knots in one pass.
    pub fn refine_knots(&self, params: &[f64]) -> Self {
        let inserts: Vec<f64> = params.iter().map(|&t| self.knot_param(t)).collect();
        let lifted = lift(&self.control_points);
        let (knots, ctrl) = refine::refine_knot_vector(self.degree, &self.knots, &lifted, &inserts);
        Self {
            degree: self.degree,
            knots,
            control_points: project(&ctrl),
            interval: self.interval,
        }
    }

    /// Evaluate a point by corner cutting instead of De Boor; an
    /// independent cross-check of [`Curve::point_at`].
    pub fn point_by_corner_cut(&self, t: f64) -> Point3 {
        let u = self.knot_param(t);
        let lifted = lift(&self.control_points);
        let p = refine::curve_point_by_corner_cut(self.degree, &self.knots, &lifted, u);
        p.truncate() / p.w
    }

    /// Decompose into Bezier segments, one per knot span. Each segment's
    /// interval is the corresponding sub-range of the external interval, so
    /// evaluating a segment at a global parameter reproduces this curve.
    pub fn decompose(&self) -> Vec<BezierCurve> {
        let lifted = lift(&self.control_points);
        let knot_iv = self.knot_interval();
        decompose::decompose_curve(self.degree, &self.knots, &lifted)
            .into_iter()
            .map(|seg| {
                let (lo, hi) = seg.span;
                BezierCurve {
                    control_points: project(&seg.control_points),
                    interval: Interval {
                        lo: knot_iv.map_to(&self.interval, lo),
                        hi: knot_iv.map_to(&self.interval, hi),
                    },
                }
            })
            .collect()
    }

    /// Knot multiplicity of the external-domain parameter `t`.
    pub fn multiplicity(&self, t: f64) -> usize {
        knot::multiplicity(&self.knots, self.knot_param(t), Tolerance::default_precision())
    }
}

impl Curve for BSplineCurve {
    fn point_at(&self, t: f64) -> Point3 {
        eval::curve_point(self.degree, &self.knots, &self.control_points, self.knot_param(t))
    }

    fn domain(&self) -> (f64, f64) {
        (self.interval.lo, self.interval.hi)
    }
}

/// A NURBS (Non-Uniform Rational B-Spline) curve.
///
/// Extends `BSplineCurve` with per-control-point weights; evaluation runs in
/// homogeneous coordinates and projects by the accumulated weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NurbsCurve {
    pub degree: usize,
    pub knots: Vec<f64>,
    pub control_points: Vec<Point3>,
    pub weights: Vec<f64>,
    pub interval: Interval,
}

impl NurbsCurve {
    pub fn new(
        degree: usize,
        knots: Vec<f64>,
        control_points: Vec<Point3>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        validate_knots(degree, &knots, control_points.len())?;
        if weights.len() != control_points.len() {
            return Err(SplError::Geometry(format!(
                "Must have as many weights as control points: {} != {}",
                weights.len(),
                control_points.len()
            )));
        }
        if weights.iter().any(|&w| w <= 0.0) {
            return Err(SplError::Geometry("All weights must be positive".into()));
        }
        let (lo, hi) = knot::domain(degree, &knots);
        let interval = Interval::new(lo, hi)?;
        Ok(Self {
            degree,
            knots,
            control_points,
            weights,
            interval,
        })
    }

    pub fn with_interval(
        degree: usize,
        knots: Vec<f64>,
        control_points: Vec<Point3>,
        weights: Vec<f64>,
        interval: Interval,
    ) -> Result<Self> {
        let mut curve = Self::new(degree, knots, control_points, weights)?;
        curve.interval = interval;
        Ok(curve)
    }

    fn knot_interval(&self) -> Interval {
        let (lo, hi) = knot::domain(self.degree, &self.knots);
        Interval { lo, hi }
    }

    fn knot_param(&self, t: f64) -> f64 {
        self.interval.map_to(&self.knot_interval(), t)
    }

    /// Homogeneous control points `(w * P, w)`.
    pub fn homogeneous_control_points(&self) -> Vec<DVec4> {
        self.control_points
            .iter()
            .zip(&self.weights)
            .map(|(p, &w)| (*p * w).extend(w))
            .collect()
    }

    fn from_homogeneous(&self, knots: Vec<f64>, ctrl: Vec<DVec4>) -> Self {
        let weights: Vec<f64> = ctrl.iter().map(|p| p.w).collect();
        let control_points: Vec<Point3> = ctrl.iter().map(|p| p.truncate() / p.w).collect();
        Self {
            degree: self.degree,
            knots,
            control_points,
            weights,
            interval: self.interval,
        }
    }

    pub fn tangent_at(&self, t: f64) -> Vector3 {
        self.derivatives(t, 1)[1]
    }

    /// Evaluate the curve and its derivatives up to `order` at `t`, via the
    /// rational quotient rule.
    pub fn derivatives(&self, t: f64, order: usize) -> Vec<Vector3> {
        let u = self.knot_param(t);
        let mut ders = eval::nurbs_curve_derivatives(
            self.degree,
            &self.knots,
            &self.control_points,
            &self.weights,
            u,
            order,
        );

        let scale = self.interval.derivative_scale(&self.knot_interval());
        let mut factor = scale;
        for d in ders.iter_mut().skip(1) {
            *d *= factor;
            factor *= scale;
        }

        ders
    }

    /// Return a new curve with `t` inserted `times` times. Insertion runs on
    /// the homogeneous control points so the rational shape is preserved.
    pub fn knot_insertion(&self, t: f64, times: usize) -> Self {
        let u = self.knot_param(t);
        let (knots, ctrl) = refine::curve_knot_insertion(
            self.degree,
            &self.knots,
            &self.homogeneous_control_points(),
            u,
            times,
        );
        self.from_homogeneous(knots, ctrl)
    }

    /// Return a new curve with a sorted batch of parameters inserted as
    /// knots in one pass.
    pub fn refine_knots(&self, params: &[f64]) -> Self {
        let inserts: Vec<f64> = params.iter().map(|&t| self.knot_param(t)).collect();
        let (knots, ctrl) = refine::refine_knot_vector(
            self.degree,
            &self.knots,
            &self.homogeneous_control_points(),
            &inserts,
        );
        self.from_homogeneous(knots, ctrl)
    }

    /// Corner-cutting point evaluation; cross-check of [`Curve::point_at`].
    pub fn point_by_corner_cut(&self, t: f64) -> Point3 {
        let u = self.knot_param(t);
        let p = refine::curve_point_by_corner_cut(
            self.degree,
            &self.knots,
            &self.homogeneous_control_points(),
            u,
        );
        p.truncate() / p.w
    }

    /// Decompose into rational Bezier segments, expressed as single-span
    /// NURBS curves. Each segment's interval is the corresponding sub-range
    /// of the external interval, so segments evaluate at global parameters.
    pub fn decompose(&self) -> Vec<NurbsCurve> {
        let p = self.degree;
        let knot_iv = self.knot_interval();
        decompose::decompose_curve(p, &self.knots, &self.homogeneous_control_points())
            .into_iter()
            .map(|seg| {
                let (lo, hi) = seg.span;
                let mut knots = vec![lo; p + 1];
                knots.extend(std::iter::repeat(hi).take(p + 1));
                let weights: Vec<f64> = seg.control_points.iter().map(|q| q.w).collect();
                let control_points: Vec<Point3> =
                    seg.control_points.iter().map(|q| q.truncate() / q.w).collect();
                NurbsCurve {
                    degree: p,
                    knots,
                    control_points,
                    weights,
                    interval: Interval {
                        lo: knot_iv.map_to(&self.interval, lo),
                        hi: knot_iv.map_to(&self.interval, hi),
                    },
                }
            })
            .collect()
    }

    pub fn multiplicity(&self, t: f64) -> usize {
        knot::multiplicity(&self.knots, self.knot_param(t), Tolerance::default_precision())
    }
}

impl Curve for NurbsCurve {
    fn point_at(&self, t: f64) -> Point3 {
        eval::nurbs_curve_point(
            self.degree,
            &self.knots,
            &self.control_points,
            &self.weights,
            self.knot_param(t),
        )
    }

    fn domain(&self) -> (f64, f64) {
        (self.interval.lo, self.interval.hi)
    }
}

fn lift(points: &[Point3]) -> Vec<DVec4> {
    points.iter().map(|p| p.extend(1.0)).collect()
}

fn project(points: &[DVec4]) -> Vec<Point3> {
    points.iter().map(|p| p.truncate() / p.w).collect()
}
