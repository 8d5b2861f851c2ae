//! Bezier decomposition by knot refinement to full multiplicity.
//!
//! Raising every interior knot to multiplicity `degree + 1` makes each span
//! an independent polynomial segment; slicing the refined control net then
//! yields one Bezier segment/patch per span, each evaluable without any
//! knot-vector logic.

use spl_core::Tolerance;
use spl_math::DVec4;

use super::refine::{refine_knot_vector, refine_surface_knots, Direction};

/// A Bezier segment of a decomposed curve: its global parameter span and its
/// `degree + 1` homogeneous control points.
#[derive(Debug, Clone)]
pub struct BezierSegment {
    pub span: (f64, f64),
    pub control_points: Vec<DVec4>,
}

/// A Bezier strip of a decomposed surface: the global span in the decomposed
/// direction and the sub-grid of homogeneous control points.
#[derive(Debug, Clone)]
pub struct BezierStrip {
    pub span: (f64, f64),
    pub control_points: Vec<Vec<DVec4>>,
}

/// The knots that must be inserted to bring every interior knot of a clamped
/// knot vector to multiplicity `degree + 1`.
fn saturation_inserts(degree: usize, knots: &[f64]) -> Vec<f64> {
    let tol = Tolerance::default_precision();
    let full = degree + 1;
    let (lo, hi) = super::knot::domain(degree, knots);

    let mut inserts = Vec::new();
    let mut prev = f64::NAN;
    for &k in knots {
        if k <= lo || k >= hi || tol.linear_eq(k, prev) {
            continue;
        }
        prev = k;
        let mult = super::knot::multiplicity(knots, k, tol);
        inserts.extend(std::iter::repeat(k).take(full - mult));
    }
    inserts
}

/// Decompose a clamped curve into Bezier segments, one per knot span.
///
/// The segments jointly represent the same shape as the input: evaluating
/// segment `i` over its span reproduces the original curve there.
pub fn decompose_curve(
    degree: usize,
    knots: &[f64],
    control_points: &[DVec4],
) -> Vec<BezierSegment> {
    let inserts = saturation_inserts(degree, knots);
    let (knots, ctrl) = refine_knot_vector(degree, knots, control_points, &inserts);

    let full = degree + 1;
    let count = knots.len() / full - 1;

    (0..count)
        .map(|i| {
            let start = i * full;
            BezierSegment {
                span: (knots[start + degree], knots[start + full]),
                control_points: ctrl[start..start + full].to_vec(),
            }
        })
        .collect()
}

/// Decompose a surface into Bezier strips along one parametric direction.
///
/// `degree` and `knots` are those of the decomposed direction; the other
/// direction's control structure is untouched.
pub fn decompose_surface(
    direction: Direction,
    degree: usize,
    knots: &[f64],
    grid: &[Vec<DVec4>],
) -> Vec<BezierStrip> {
    let inserts = saturation_inserts(degree, knots);
    let (knots, refined) = refine_surface_knots(direction, degree, knots, grid, &inserts);

    let full = degree + 1;
    let count = knots.len() / full - 1;

    (0..count)
        .map(|i| {
            let start = i * full;
            let span = (knots[start + degree], knots[start + full]);
            let control_points = match direction {
                Direction::U => refined[start..start + full].to_vec(),
                Direction::V => refined
                    .iter()
                    .map(|row| row[start..start + full].to_vec())
                    .collect(),
            };
            BezierStrip {
                span,
                control_points,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nurbs::eval;
    use spl_math::DVec3;

    fn lift(points: &[DVec3]) -> Vec<DVec4> {
        points.iter().map(|p| p.extend(1.0)).collect()
    }

    fn project_all(points: &[DVec4]) -> Vec<DVec3> {
        points.iter().map(|p| p.truncate() / p.w).collect()
    }

    #[test]
    fn test_decompose_single_span_is_identity() {
        let knots = vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let cps = lift(&[
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
        ]);

        let segments = decompose_curve(3, &knots, &cps);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].span, (0.0, 1.0));
        assert_eq!(segments[0].control_points, cps);
    }

    #[test]
    fn test_decompose_curve_coverage() {
        let degree = 3;
        let knots = vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 3.0, 4.0, 4.0, 4.0, 4.0];
        let cps: Vec<DVec3> = (0..8)
            .map(|i| DVec3::new(i as f64, ((i * i) % 5) as f64, ((i * 3) % 4) as f64))
            .collect();
        let lifted = lift(&cps);

        let segments = decompose_curve(degree, &knots, &lifted);
        assert_eq!(segments.len(), 4);

        // Each segment, evaluated over its own span with Bezier-style clamped
        // knots, reproduces the original curve.
        let bezier_knots = vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        for seg in &segments {
            let (lo, hi) = seg.span;
            let seg_cps = project_all(&seg.control_points);
            for step in 0..=10 {
                let t = lo + (hi - lo) * step as f64 / 10.0;
                let local = (t - lo) / (hi - lo);
                let p = eval::curve_point(degree, &bezier_knots, &seg_cps, local);
                let q = eval::curve_point(degree, &knots, &cps, t);
                assert!(
                    (p - q).length() < 1e-9,
                    "segment [{},{}] diverges at t={}",
                    lo,
                    hi,
                    t
                );
            }
        }
    }

    #[test]
    fn test_decompose_spans_tile_the_domain() {
        let degree = 2;
        let knots = vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0];
        let cps = lift(&[
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(2.0, 1.0, 0.0),
            DVec3::new(3.0, 1.0, 1.0),
            DVec3::new(4.0, 0.0, 0.0),
        ]);

        let segments = decompose_curve(degree, &knots, &cps);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].span, (0.0, 1.0));
        assert_eq!(segments[1].span, (1.0, 2.0));
        assert_eq!(segments[2].span, (2.0, 3.0));

        // Adjacent segments share their boundary control point
        for pair in segments.windows(2) {
            let last = *pair[0].control_points.last().unwrap();
            let first = pair[1].control_points[0];
            assert!((last - first).length() < 1e-12);
        }
    }

    #[test]
    fn test_decompose_surface_u_strips() {
        let degree_u = 2;
        let knots_u = vec![0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0];
        // 4 rows (u) x 2 columns (v)
        let grid: Vec<Vec<DVec4>> = (0..4)
            .map(|i| {
                (0..2)
                    .map(|j| DVec4::new(i as f64, j as f64, ((i + j) % 3) as f64, 1.0))
                    .collect()
            })
            .collect();

        let strips = decompose_surface(Direction::U, degree_u, &knots_u, &grid);
        assert_eq!(strips.len(), 2);
        for strip in &strips {
            assert_eq!(strip.control_points.len(), degree_u + 1);
            assert_eq!(strip.control_points[0].len(), 2);
        }
        assert_eq!(strips[0].span, (0.0, 1.0));
        assert_eq!(strips[1].span, (1.0, 2.0));
    }
}
