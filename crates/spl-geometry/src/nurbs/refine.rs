//! Shape-preserving knot insertion and refinement.
//!
//! All routines operate on homogeneous control points (`DVec4` with the
//! weight in `w`); non-rational callers lift with `w = 1`, which is
//! preserved under the affine corner-cutting blends. Every function returns
//! new knot vectors and control nets; nothing is mutated in place.

use serde::{Deserialize, Serialize};
use spl_core::Tolerance;
use spl_math::DVec4;

use super::knot::{find_span, multiplicity};

/// Parametric direction of a surface operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    U,
    V,
}

/// Insert the knot `t` into a curve `times` times (Boehm insertion).
///
/// The repeat count is capped at `degree - multiplicity(t)` so the knot
/// never exceeds full multiplicity; inserting an already-saturated knot
/// returns the input unchanged. The represented curve is identical before
/// and after.
pub fn curve_knot_insertion(
    degree: usize,
    knots: &[f64],
    control_points: &[DVec4],
    t: f64,
    times: usize,
) -> (Vec<f64>, Vec<DVec4>) {
    let p = degree;
    let n = control_points.len() - 1;
    let tol = Tolerance::default_precision();

    let s = multiplicity(knots, t, tol);
    let r = times.min(p.saturating_sub(s));
    if r == 0 {
        return (knots.to_vec(), control_points.to_vec());
    }

    let k = find_span(p, knots, n, t);
    let m = n + p + 1;

    let mut new_knots = vec![0.0; m + r + 1];
    new_knots[..=k].copy_from_slice(&knots[..=k]);
    for i in 1..=r {
        new_knots[k + i] = t;
    }
    for i in (k + 1)..=m {
        new_knots[i + r] = knots[i];
    }

    let mut new_ctrl = vec![DVec4::ZERO; n + r + 1];
    new_ctrl[..=(k - p)].copy_from_slice(&control_points[..=(k - p)]);
    for i in (k - s)..=n {
        new_ctrl[i + r] = control_points[i];
    }

    // Corner-cutting working row over the affected window
    let mut rw: Vec<DVec4> = control_points[(k - p)..=(k - s)].to_vec();

    for j in 1..=r {
        let l = k - p + j;
        for i in 0..=(p - j - s) {
            let alpha = (t - knots[l + i]) / (knots[i + k + 1] - knots[l + i]);
            rw[i] = alpha * rw[i + 1] + (1.0 - alpha) * rw[i];
        }
        new_ctrl[l] = rw[0];
        new_ctrl[k + r - j - s] = rw[p - j - s];
    }

    // Remaining interior points of the final working row
    let l = k - p + r;
    for i in (l + 1)..(k - s) {
        new_ctrl[i] = rw[i - l];
    }

    (new_knots, new_ctrl)
}

/// Evaluate a curve point by corner cutting: insert `t` until its
/// multiplicity reaches the degree, at which point the parameter becomes an
/// interpolated control point. Independent cross-check of De Boor
/// evaluation. Assumes a clamped knot vector.
pub fn curve_point_by_corner_cut(
    degree: usize,
    knots: &[f64],
    control_points: &[DVec4],
    t: f64,
) -> DVec4 {
    let p = degree;
    let n = control_points.len() - 1;
    let tol = Tolerance::default_precision();

    // Domain endpoints are already interpolated control points
    if t <= knots[p] {
        return control_points[0];
    }
    if t >= knots[n + 1] {
        return control_points[n];
    }

    let k = find_span(p, knots, n, t);
    let s = multiplicity(knots, t, tol);
    let r = p - s;
    if r == 0 {
        return control_points[k - p];
    }

    let mut rw: Vec<DVec4> = control_points[(k - p)..=(k - s)].to_vec();
    for j in 1..=r {
        for i in 0..=(r - j) {
            let lo = knots[k - p + j + i];
            let alpha = (t - lo) / (knots[i + k + 1] - lo);
            rw[i] = alpha * rw[i + 1] + (1.0 - alpha) * rw[i];
        }
    }

    rw[0]
}

/// Drop insert values whose knot would exceed full multiplicity.
///
/// Same cap as [`curve_knot_insertion`], generalized over a sorted batch:
/// each distinct value gets at most `degree - multiplicity` slots, so the
/// clamped domain endpoints (multiplicity `degree + 1`) contribute nothing.
fn bounded_inserts(degree: usize, knots: &[f64], inserts: &[f64]) -> Vec<f64> {
    let tol = Tolerance::default_precision();
    let mut bounded = Vec::with_capacity(inserts.len());
    let mut prev: Option<f64> = None;
    let mut room = 0;

    for &t in inserts {
        if !prev.is_some_and(|p| tol.linear_eq(p, t)) {
            prev = Some(t);
            room = degree.saturating_sub(multiplicity(knots, t, tol));
        }
        if room > 0 {
            bounded.push(t);
            room -= 1;
        }
    }

    bounded
}

/// Insert a sorted batch of knots into a curve in one refinement pass.
///
/// More efficient than repeated single insertion; the blending math is the
/// same corner-cutting generalized over the batch. `inserts` must be
/// non-decreasing and lie inside the knot domain. Values that would raise a
/// knot past multiplicity `degree` are dropped, so a saturated or
/// boundary-valued batch degrades to the identity instead of producing an
/// invalid knot vector.
pub fn refine_knot_vector(
    degree: usize,
    knots: &[f64],
    control_points: &[DVec4],
    inserts: &[f64],
) -> (Vec<f64>, Vec<DVec4>) {
    let inserts = bounded_inserts(degree, knots, inserts);
    if inserts.is_empty() {
        return (knots.to_vec(), control_points.to_vec());
    }

    let p = degree;
    let n = control_points.len() - 1;
    let m = n + p + 1;
    let r = inserts.len() - 1;

    let a = find_span(p, knots, n, inserts[0]);
    let b = find_span(p, knots, n, inserts[r]) + 1;

    let mut new_ctrl = vec![DVec4::ZERO; n + r + 2];
    let mut new_knots = vec![0.0; m + r + 2];

    new_ctrl[..=(a - p)].copy_from_slice(&control_points[..=(a - p)]);
    for i in (b - 1)..=n {
        new_ctrl[i + r + 1] = control_points[i];
    }
    new_knots[..=a].copy_from_slice(&knots[..=a]);
    for i in (b + p)..=m {
        new_knots[i + r + 1] = knots[i];
    }

    let mut i = b + p - 1;
    let mut k = b + p + r;

    for j in (0..=r).rev() {
        while inserts[j] <= knots[i] && i > a {
            new_ctrl[k - p - 1] = control_points[i - p - 1];
            new_knots[k] = knots[i];
            k -= 1;
            i -= 1;
        }

        new_ctrl[k - p - 1] = new_ctrl[k - p];
        for l in 1..=p {
            let ind = k - p + l;
            let mut alpha = new_knots[k + l] - inserts[j];
            if alpha.abs() < f64::EPSILON {
                new_ctrl[ind - 1] = new_ctrl[ind];
            } else {
                alpha /= new_knots[k + l] - knots[i - p + l];
                new_ctrl[ind - 1] = alpha * new_ctrl[ind - 1] + (1.0 - alpha) * new_ctrl[ind];
            }
        }

        new_knots[k] = inserts[j];
        k -= 1;
    }

    (new_knots, new_ctrl)
}

/// Directional knot insertion for a surface control grid.
///
/// Only the rows or columns orthogonal to the insertion direction are
/// touched; the blending ratios depend on the knot vector alone, so every
/// row/column is refined with identical alphas.
pub fn surface_knot_insertion(
    direction: Direction,
    degree: usize,
    knots: &[f64],
    grid: &[Vec<DVec4>],
    t: f64,
    times: usize,
) -> (Vec<f64>, Vec<Vec<DVec4>>) {
    apply_rows(direction, grid, |row| {
        curve_knot_insertion(degree, knots, row, t, times)
    })
}

/// Directional batch refinement for a surface control grid.
pub fn refine_surface_knots(
    direction: Direction,
    degree: usize,
    knots: &[f64],
    grid: &[Vec<DVec4>],
    inserts: &[f64],
) -> (Vec<f64>, Vec<Vec<DVec4>>) {
    apply_rows(direction, grid, |row| {
        refine_knot_vector(degree, knots, row, inserts)
    })
}

/// Transpose a `[u][v]` control grid.
pub fn transpose_grid(grid: &[Vec<DVec4>]) -> Vec<Vec<DVec4>> {
    let rows = grid.len();
    let cols = grid[0].len();
    (0..cols)
        .map(|j| (0..rows).map(|i| grid[i][j]).collect())
        .collect()
}

/// Run a curve refinement over every u-column (`Direction::U`) or v-row
/// (`Direction::V`) of the grid, reassembling the refined grid.
fn apply_rows<F>(direction: Direction, grid: &[Vec<DVec4>], op: F) -> (Vec<f64>, Vec<Vec<DVec4>>)
where
    F: Fn(&[DVec4]) -> (Vec<f64>, Vec<DVec4>),
{
    match direction {
        Direction::V => {
            let mut new_knots = Vec::new();
            let refined: Vec<Vec<DVec4>> = grid
                .iter()
                .map(|row| {
                    let (knots, ctrl) = op(row);
                    new_knots = knots;
                    ctrl
                })
                .collect();
            (new_knots, refined)
        }
        Direction::U => {
            let transposed = transpose_grid(grid);
            let (new_knots, refined) = apply_rows(Direction::V, &transposed, op);
            (new_knots, transpose_grid(&refined))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nurbs::eval;
    use spl_math::DVec3;

    fn lift(points: &[DVec3]) -> Vec<DVec4> {
        points.iter().map(|p| p.extend(1.0)).collect()
    }

    fn project(p: DVec4) -> DVec3 {
        p.truncate() / p.w
    }

    fn cubic_curve() -> (usize, Vec<f64>, Vec<DVec3>) {
        (
            3,
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0, 3.0],
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 2.0, 0.0),
                DVec3::new(2.0, 2.0, 1.0),
                DVec3::new(3.0, 0.0, 0.0),
                DVec3::new(4.0, 1.0, -1.0),
                DVec3::new(5.0, 0.0, 0.0),
            ],
        )
    }

    fn assert_same_shape(
        degree: usize,
        knots_a: &[f64],
        cps_a: &[DVec3],
        knots_b: &[f64],
        cps_b: &[DVec4],
    ) {
        let projected: Vec<DVec3> = cps_b.iter().map(|&p| project(p)).collect();
        for step in 0..=50 {
            let t = knots_a[degree]
                + (knots_a[knots_a.len() - degree - 1] - knots_a[degree]) * step as f64 / 50.0;
            let p = eval::curve_point(degree, knots_a, cps_a, t);
            let q = eval::curve_point(degree, knots_b, &projected, t);
            assert!(
                (p - q).length() < 1e-9,
                "shape changed at t={}: {:?} vs {:?}",
                t,
                p,
                q
            );
        }
    }

    #[test]
    fn test_single_insertion_preserves_shape() {
        let (degree, knots, cps) = cubic_curve();
        let (nk, nc) = curve_knot_insertion(degree, &knots, &lift(&cps), 1.5, 1);

        assert_eq!(nk.len(), knots.len() + 1);
        assert_eq!(nc.len(), cps.len() + 1);
        assert_same_shape(degree, &knots, &cps, &nk, &nc);
    }

    #[test]
    fn test_full_multiplicity_insertion() {
        let (degree, knots, cps) = cubic_curve();
        let (nk, nc) = curve_knot_insertion(degree, &knots, &lift(&cps), 1.5, 3);

        let tol = Tolerance::default_precision();
        assert_eq!(multiplicity(&nk, 1.5, tol), 3);
        assert_same_shape(degree, &knots, &cps, &nk, &nc);
    }

    #[test]
    fn test_insertion_count_is_capped() {
        let (degree, knots, cps) = cubic_curve();
        // Knot 1.0 already has multiplicity 1; only 2 more insertions are legal
        let (nk, nc) = curve_knot_insertion(degree, &knots, &lift(&cps), 1.0, 7);

        let tol = Tolerance::default_precision();
        assert_eq!(multiplicity(&nk, 1.0, tol), 3);
        assert_eq!(nk.len(), knots.len() + 2);
        assert_same_shape(degree, &knots, &cps, &nk, &nc);
    }

    #[test]
    fn test_insertion_at_saturated_knot_is_identity() {
        let degree = 2;
        let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        let cps = lift(&[
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(2.0, 1.0, 0.0),
            DVec3::new(3.0, 0.0, 0.0),
            DVec3::new(4.0, 0.0, 0.0),
        ]);

        let (nk, nc) = curve_knot_insertion(degree, &knots, &cps, 1.0, 2);
        assert_eq!(nk, knots);
        assert_eq!(nc, cps);
    }

    #[test]
    fn test_corner_cut_agrees_with_de_boor() {
        let (degree, knots, cps) = cubic_curve();
        let lifted = lift(&cps);

        for step in 0..=60 {
            let t = 3.0 * step as f64 / 60.0;
            let cut = project(curve_point_by_corner_cut(degree, &knots, &lifted, t));
            let de_boor = eval::curve_point(degree, &knots, &cps, t);
            assert!(
                (cut - de_boor).length() < 1e-10,
                "corner cut mismatch at t={}",
                t
            );
        }
    }

    #[test]
    fn test_corner_cut_rational() {
        // Quarter circle: corner cutting must agree with rational De Boor
        let w = 1.0_f64 / 2.0_f64.sqrt();
        let degree = 2;
        let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let cps = vec![
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let weights = vec![1.0, w, 1.0];
        let homogeneous: Vec<DVec4> = cps
            .iter()
            .zip(&weights)
            .map(|(p, &w)| (*p * w).extend(w))
            .collect();

        for step in 0..=20 {
            let t = step as f64 / 20.0;
            let cut = project(curve_point_by_corner_cut(degree, &knots, &homogeneous, t));
            let direct = eval::nurbs_curve_point(degree, &knots, &cps, &weights, t);
            assert!((cut - direct).length() < 1e-10);
        }
    }

    #[test]
    fn test_refine_batch_preserves_shape() {
        let (degree, knots, cps) = cubic_curve();
        let inserts = vec![0.25, 0.5, 1.5, 1.5, 2.75];
        let (nk, nc) = refine_knot_vector(degree, &knots, &lift(&cps), &inserts);

        assert_eq!(nk.len(), knots.len() + inserts.len());
        assert_eq!(nc.len(), cps.len() + inserts.len());
        assert_same_shape(degree, &knots, &cps, &nk, &nc);

        // Refined knot vector is still non-decreasing
        for w in nk.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn test_refine_drops_saturated_inserts() {
        let (degree, knots, cps) = cubic_curve();
        let lifted = lift(&cps);

        // Domain endpoints are already at full multiplicity
        let (nk, nc) = refine_knot_vector(degree, &knots, &lifted, &[0.0, 0.0, 3.0]);
        assert_eq!(nk, knots);
        assert_eq!(nc, lifted);

        // Interior knot 1.0 has multiplicity 1; only two more slots exist
        let (nk, nc) = refine_knot_vector(degree, &knots, &lifted, &[1.0, 1.0, 1.0, 1.0]);
        let tol = Tolerance::default_precision();
        assert_eq!(multiplicity(&nk, 1.0, tol), 3);
        assert_eq!(nk.len(), knots.len() + 2);
        assert_same_shape(degree, &knots, &cps, &nk, &nc);
    }

    #[test]
    fn test_refine_matches_repeated_single_insertion() {
        let (degree, knots, cps) = cubic_curve();
        let lifted = lift(&cps);

        let (rk, rc) = refine_knot_vector(degree, &knots, &lifted, &[0.5, 1.5]);

        let (sk1, sc1) = curve_knot_insertion(degree, &knots, &lifted, 0.5, 1);
        let (sk2, sc2) = curve_knot_insertion(degree, &sk1, &sc1, 1.5, 1);

        assert_eq!(rk, sk2);
        for (a, b) in rc.iter().zip(&sc2) {
            assert!((*a - *b).length() < 1e-12);
        }
    }

    #[test]
    fn test_surface_insertion_u_only_touches_u() {
        let degree_u = 1;
        let knots_u = vec![0.0, 0.0, 1.0, 2.0, 2.0];
        let grid: Vec<Vec<DVec4>> = (0..3)
            .map(|i| {
                (0..2)
                    .map(|j| DVec4::new(i as f64, j as f64, (i * j) as f64, 1.0))
                    .collect()
            })
            .collect();

        let (nk, ng) = surface_knot_insertion(Direction::U, degree_u, &knots_u, &grid, 0.5, 1);
        assert_eq!(nk.len(), knots_u.len() + 1);
        assert_eq!(ng.len(), grid.len() + 1);
        // v-direction row length unchanged
        assert_eq!(ng[0].len(), grid[0].len());
    }

    #[test]
    fn test_transpose_grid_round_trip() {
        let grid: Vec<Vec<DVec4>> = (0..2)
            .map(|i| {
                (0..4)
                    .map(|j| DVec4::new(i as f64, j as f64, 0.0, 1.0))
                    .collect()
            })
            .collect();
        let back = transpose_grid(&transpose_grid(&grid));
        assert_eq!(grid, back);
    }
}
