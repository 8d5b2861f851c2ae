//! De Boor evaluation for B-spline and NURBS curves and surfaces.
//!
//! Rational evaluation accumulates in homogeneous (weighted) coordinates and
//! projects by the accumulated weight at the end; derivatives of rational
//! entities compose the weighted-numerator and weight derivatives through
//! the generalized Leibniz quotient rule.

use spl_math::{DVec3, Point3, Vector3};

use super::knot::{basis_functions, binomial_coefficients, ders_basis_functions, find_span};

/// Evaluate a B-spline curve point at parameter `t` using the De Boor algorithm.
pub fn curve_point(degree: usize, knots: &[f64], control_points: &[Point3], t: f64) -> Point3 {
    let n = control_points.len() - 1;
    let span = find_span(degree, knots, n, t);
    let basis = basis_functions(degree, knots, span, t);

    let mut point = DVec3::ZERO;
    for (i, &b) in basis.iter().enumerate() {
        point += b * control_points[span - degree + i];
    }

    point
}

/// Evaluate a B-spline curve and its derivatives up to `order` at `t`.
///
/// Returns `order + 1` vectors; entry 0 is the point itself. Derivatives of
/// order above the degree are identically zero.
pub fn curve_derivatives(
    degree: usize,
    knots: &[f64],
    control_points: &[Point3],
    t: f64,
    order: usize,
) -> Vec<Vector3> {
    let n = control_points.len() - 1;
    let span = find_span(degree, knots, n, t);
    let ders = ders_basis_functions(degree, knots, span, t, order);

    let mut result = vec![DVec3::ZERO; order + 1];
    for (k, row) in ders.iter().enumerate() {
        for (i, &d) in row.iter().enumerate() {
            result[k] += d * control_points[span - degree + i];
        }
    }

    result
}

/// Compute the control points of the first-derivative (hodograph) curve.
///
/// The returned curve has degree `degree - 1` and the knot vector obtained
/// by dropping the first and last knots. Used as an independent oracle for
/// [`curve_derivatives`] in tests.
pub fn curve_derivative_control_points(
    degree: usize,
    knots: &[f64],
    control_points: &[Point3],
) -> (Vec<f64>, Vec<Point3>) {
    let p = degree as f64;
    let mut derived = Vec::with_capacity(control_points.len() - 1);
    for i in 0..control_points.len() - 1 {
        let span_width = knots[i + degree + 1] - knots[i + 1];
        let scale = if span_width.abs() < f64::EPSILON {
            0.0
        } else {
            p / span_width
        };
        derived.push(scale * (control_points[i + 1] - control_points[i]));
    }
    let trimmed = knots[1..knots.len() - 1].to_vec();
    (trimmed, derived)
}

/// Evaluate a rational B-spline (NURBS) curve point at parameter `t`.
pub fn nurbs_curve_point(
    degree: usize,
    knots: &[f64],
    control_points: &[Point3],
    weights: &[f64],
    t: f64,
) -> Point3 {
    let n = control_points.len() - 1;
    let span = find_span(degree, knots, n, t);
    let basis = basis_functions(degree, knots, span, t);

    let mut point = DVec3::ZERO;
    let mut w = 0.0;

    for (i, &b) in basis.iter().enumerate() {
        let idx = span - degree + i;
        let bw = b * weights[idx];
        point += bw * control_points[idx];
        w += bw;
    }

    if w.abs() < 1e-15 {
        point
    } else {
        point / w
    }
}

/// Evaluate a NURBS curve and its derivatives up to `order` at `t`.
///
/// Computes derivatives of the weighted numerator `A(t)` and the scalar
/// weight function `w(t)` independently, then peels off lower-order rational
/// derivatives via the quotient rule:
/// `C^(k) = (A^(k) - sum_{i=1..k} C(k,i) w^(i) C^(k-i)) / w`.
pub fn nurbs_curve_derivatives(
    degree: usize,
    knots: &[f64],
    control_points: &[Point3],
    weights: &[f64],
    t: f64,
    order: usize,
) -> Vec<Vector3> {
    let n = control_points.len() - 1;
    let span = find_span(degree, knots, n, t);
    let ders = ders_basis_functions(degree, knots, span, t, order);

    let mut a_ders = vec![DVec3::ZERO; order + 1];
    let mut w_ders = vec![0.0; order + 1];

    for (k, row) in ders.iter().enumerate() {
        for (i, &d) in row.iter().enumerate() {
            let idx = span - degree + i;
            let dw = d * weights[idx];
            a_ders[k] += dw * control_points[idx];
            w_ders[k] += dw;
        }
    }

    let bin = binomial_coefficients(order);
    let mut result = vec![DVec3::ZERO; order + 1];

    for k in 0..=order {
        let mut v = a_ders[k];
        for i in 1..=k {
            v -= bin[k][i] * w_ders[i] * result[k - i];
        }
        result[k] = if w_ders[0].abs() < 1e-15 {
            v
        } else {
            v / w_ders[0]
        };
    }

    result
}

/// Evaluate a B-spline surface point at parameters `(u, v)`.
pub fn surface_point(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<Point3>],
    u: f64,
    v: f64,
) -> Point3 {
    let n_u = control_points.len() - 1;
    let span_u = find_span(degree_u, knots_u, n_u, u);
    let basis_u = basis_functions(degree_u, knots_u, span_u, u);

    let n_v = control_points[0].len() - 1;
    let span_v = find_span(degree_v, knots_v, n_v, v);
    let basis_v = basis_functions(degree_v, knots_v, span_v, v);

    let mut point = DVec3::ZERO;
    for (i, &bu) in basis_u.iter().enumerate() {
        let u_idx = span_u - degree_u + i;
        for (j, &bv) in basis_v.iter().enumerate() {
            let v_idx = span_v - degree_v + j;
            point += bu * bv * control_points[u_idx][v_idx];
        }
    }

    point
}

/// Evaluate partial derivatives of a B-spline surface at `(u, v)`.
///
/// Returns the tensor-product table `skl` where `skl[k][l]` is the mixed
/// partial of order `k` in `u` and `l` in `v`; entries with `k + l > order`
/// are left zero, as are orders above the respective degrees.
pub fn surface_derivatives(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<Point3>],
    u: f64,
    v: f64,
    order: usize,
) -> Vec<Vec<Vector3>> {
    let n_u = control_points.len() - 1;
    let span_u = find_span(degree_u, knots_u, n_u, u);
    let ders_u = ders_basis_functions(degree_u, knots_u, span_u, u, order);

    let n_v = control_points[0].len() - 1;
    let span_v = find_span(degree_v, knots_v, n_v, v);
    let ders_v = ders_basis_functions(degree_v, knots_v, span_v, v, order);

    let mut skl = vec![vec![DVec3::ZERO; order + 1]; order + 1];
    let du = order.min(degree_u);

    for k in 0..=du {
        // Collapse the v direction first for this u-derivative order
        let mut temp = vec![DVec3::ZERO; degree_v + 1];
        for (j, t) in temp.iter_mut().enumerate() {
            let v_idx = span_v - degree_v + j;
            for (i, &dku) in ders_u[k].iter().enumerate() {
                *t += dku * control_points[span_u - degree_u + i][v_idx];
            }
        }

        let dv = (order - k).min(degree_v);
        for l in 0..=dv {
            for (j, &dlv) in ders_v[l].iter().enumerate() {
                skl[k][l] += dlv * temp[j];
            }
        }
    }

    skl
}

/// Evaluate a NURBS surface point at parameters `(u, v)`.
#[allow(clippy::too_many_arguments)]
pub fn nurbs_surface_point(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<Point3>],
    weights: &[Vec<f64>],
    u: f64,
    v: f64,
) -> Point3 {
    let n_u = control_points.len() - 1;
    let span_u = find_span(degree_u, knots_u, n_u, u);
    let basis_u = basis_functions(degree_u, knots_u, span_u, u);

    let n_v = control_points[0].len() - 1;
    let span_v = find_span(degree_v, knots_v, n_v, v);
    let basis_v = basis_functions(degree_v, knots_v, span_v, v);

    let mut point = DVec3::ZERO;
    let mut w = 0.0;

    for (i, &bu) in basis_u.iter().enumerate() {
        let u_idx = span_u - degree_u + i;
        for (j, &bv) in basis_v.iter().enumerate() {
            let v_idx = span_v - degree_v + j;
            let bw = bu * bv * weights[u_idx][v_idx];
            point += bw * control_points[u_idx][v_idx];
            w += bw;
        }
    }

    if w.abs() < 1e-15 {
        point
    } else {
        point / w
    }
}

/// Evaluate a NURBS surface and its partial derivatives up to total
/// `order` at `(u, v)`.
///
/// Derivatives of the quotient `A(u,v) / w(u,v)` follow the generalized
/// Leibniz rule: lower-order rational derivatives are subtracted with
/// binomial weights in both parametric directions before dividing by `w`.
#[allow(clippy::too_many_arguments)]
pub fn nurbs_surface_derivatives(
    degree_u: usize,
    degree_v: usize,
    knots_u: &[f64],
    knots_v: &[f64],
    control_points: &[Vec<Point3>],
    weights: &[Vec<f64>],
    u: f64,
    v: f64,
    order: usize,
) -> Vec<Vec<Vector3>> {
    let n_u = control_points.len() - 1;
    let span_u = find_span(degree_u, knots_u, n_u, u);
    let ders_u = ders_basis_functions(degree_u, knots_u, span_u, u, order);

    let n_v = control_points[0].len() - 1;
    let span_v = find_span(degree_v, knots_v, n_v, v);
    let ders_v = ders_basis_functions(degree_v, knots_v, span_v, v, order);

    // Derivative tables of the weighted numerator A and the weight w
    let mut a_ders = vec![vec![DVec3::ZERO; order + 1]; order + 1];
    let mut w_ders = vec![vec![0.0; order + 1]; order + 1];

    for k in 0..=order.min(degree_u) {
        for l in 0..=(order - k).min(degree_v) {
            for (i, &dku) in ders_u[k].iter().enumerate() {
                let u_idx = span_u - degree_u + i;
                for (j, &dlv) in ders_v[l].iter().enumerate() {
                    let v_idx = span_v - degree_v + j;
                    let dw = dku * dlv * weights[u_idx][v_idx];
                    a_ders[k][l] += dw * control_points[u_idx][v_idx];
                    w_ders[k][l] += dw;
                }
            }
        }
    }

    let bin = binomial_coefficients(order);
    let w0 = w_ders[0][0];
    let mut skl = vec![vec![DVec3::ZERO; order + 1]; order + 1];

    for k in 0..=order {
        for l in 0..=(order - k) {
            let mut v_acc = a_ders[k][l];

            for j in 1..=l {
                v_acc -= bin[l][j] * w_ders[0][j] * skl[k][l - j];
            }
            for i in 1..=k {
                v_acc -= bin[k][i] * w_ders[i][0] * skl[k - i][l];
                let mut v2 = DVec3::ZERO;
                for j in 1..=l {
                    v2 += bin[l][j] * w_ders[i][j] * skl[k - i][l - j];
                }
                v_acc -= bin[k][i] * v2;
            }

            skl[k][l] = if w0.abs() < 1e-15 { v_acc } else { v_acc / w0 };
        }
    }

    skl
}
