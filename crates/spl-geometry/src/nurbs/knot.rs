//! Knot vector utilities for B-spline/NURBS evaluation.
//!
//! All functions here are total over well-formed inputs (knot vector length
//! consistent with degree and control-point count); length validation happens
//! at the curve/surface constructors, never here. Integer-valued "knot index"
//! vectors are represented as integer-valued `f64` knots, so one
//! implementation serves both knot families.

use spl_core::Tolerance;

/// Find the knot span index for parameter `t` in the knot vector.
///
/// Returns the index `i` such that `knots[i] <= t < knots[i+1]`,
/// with special handling for the boundaries.
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector
/// * `n` - Number of control points minus 1
/// * `t` - Parameter value
pub fn find_span(degree: usize, knots: &[f64], n: usize, t: f64) -> usize {
    // Special case: t at upper boundary
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }

    // Binary search
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;

    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }

    mid
}

/// The native parameter domain of a clamped knot vector,
/// `(knots[degree], knots[len - degree - 1])`.
pub fn domain(degree: usize, knots: &[f64]) -> (f64, f64) {
    (knots[degree], knots[knots.len() - degree - 1])
}

/// Count the multiplicity of knot value `t` within `tol`.
pub fn multiplicity(knots: &[f64], t: f64, tol: Tolerance) -> usize {
    knots.iter().filter(|&&k| tol.linear_eq(k, t)).count()
}

/// Build a clamped knot vector with integer-valued interior knots for
/// `count` control points of the given degree: `degree + 1` zeros, interior
/// knots `1, 2, ...`, and `degree + 1` copies of the end value.
///
/// Requires `count > degree`; a valid clamped curve has at least
/// `degree + 1` control points.
pub fn clamped_uniform_knots(count: usize, degree: usize) -> Vec<f64> {
    debug_assert!(
        count > degree,
        "clamped knot vector needs at least degree + 1 control points"
    );
    let n_interior = count - degree - 1;
    let end = (n_interior + 1) as f64;
    let mut knots = Vec::with_capacity(count + degree + 1);
    knots.extend(std::iter::repeat(0.0).take(degree + 1));
    knots.extend((1..=n_interior).map(|i| i as f64));
    knots.extend(std::iter::repeat(end).take(degree + 1));
    knots
}

/// Compute the non-vanishing basis functions at parameter `t`.
///
/// Returns a vector of `degree + 1` basis function values N_{span-degree,degree}(t)
/// through N_{span,degree}(t). The values sum to 1 (partition of unity) for
/// any `t` in the domain; repeated knots never produce a division by zero
/// because the `right[r+1] + left[j-r]` denominator is a full knot-window
/// width, positive inside a valid span.
pub fn basis_functions(degree: usize, knots: &[f64], span: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];

    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;

        for r in 0..j {
            let temp = n[r] / (right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }

        n[j] = saved;
    }

    n
}

/// Compute the non-vanishing basis functions and their derivatives up to
/// `max_order` at parameter `t`.
///
/// Returns a table `ders` of `max_order + 1` rows by `degree + 1` columns,
/// where `ders[k][j]` is the k-th derivative of N_{span-degree+j,degree}(t).
/// Rows beyond the degree are identically zero.
pub fn ders_basis_functions(
    degree: usize,
    knots: &[f64],
    span: usize,
    t: f64,
    max_order: usize,
) -> Vec<Vec<f64>> {
    let p = degree;
    let n = max_order.min(p);

    // Two-triangle table: upper triangle holds basis function values,
    // lower triangle the knot-difference denominators.
    let mut ndu = vec![vec![0.0; p + 1]; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    ndu[0][0] = 1.0;

    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;

        for r in 0..j {
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = ndu[r][j - 1] / ndu[j][r];

            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    let mut ders = vec![vec![0.0; p + 1]; max_order + 1];
    for j in 0..=p {
        ders[0][j] = ndu[j][p];
    }

    // Two alternating rows of derivative coefficients.
    let mut a = vec![vec![0.0; p + 1]; 2];

    for r in 0..=p {
        let mut s1 = 0usize;
        let mut s2 = 1usize;
        a[0][0] = 1.0;

        for k in 1..=n {
            let mut d = 0.0;
            let rk = r as isize - k as isize;
            let pk = (p - k) as isize;

            if r >= k {
                a[s2][0] = a[s1][0] / ndu[(pk + 1) as usize][rk as usize];
                d = a[s2][0] * ndu[rk as usize][pk as usize];
            }

            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r as isize - 1 <= pk { k - 1 } else { p - r };

            for j in j1..=j2 {
                a[s2][j] =
                    (a[s1][j] - a[s1][j - 1]) / ndu[(pk + 1) as usize][(rk + j as isize) as usize];
                d += a[s2][j] * ndu[(rk + j as isize) as usize][pk as usize];
            }

            if r as isize <= pk {
                a[s2][k] = -a[s1][k - 1] / ndu[(pk + 1) as usize][r];
                d += a[s2][k] * ndu[r][pk as usize];
            }

            ders[k][r] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    // Multiply through by the falling-factorial degree factors.
    let mut factor = p as f64;
    for k in 1..=n {
        for val in ders[k].iter_mut() {
            *val *= factor;
        }
        factor *= (p - k) as f64;
    }

    ders
}

/// Evaluate the single basis function N_{i,degree}(t) without computing the
/// full non-vanishing vector.
pub fn one_basis_function(degree: usize, knots: &[f64], i: usize, t: f64) -> f64 {
    let p = degree;
    let m = knots.len() - 1;

    // Endpoint special cases: the first and last functions interpolate.
    if (i == 0 && t == knots[0]) || (i == m - p - 1 && t == knots[m]) {
        return 1.0;
    }
    // Local support
    if t < knots[i] || t >= knots[i + p + 1] {
        return 0.0;
    }

    // Degree-zero seed row
    let mut n = vec![0.0; p + 1];
    for (j, val) in n.iter_mut().enumerate() {
        if t >= knots[i + j] && t < knots[i + j + 1] {
            *val = 1.0;
        }
    }

    // Triangular recurrence up the degrees
    for k in 1..=p {
        let mut saved = if n[0] == 0.0 {
            0.0
        } else {
            (t - knots[i]) * n[0] / (knots[i + k] - knots[i])
        };

        for j in 0..(p - k + 1) {
            let uleft = knots[i + j + 1];
            let uright = knots[i + j + k + 1];

            if n[j + 1] == 0.0 {
                n[j] = saved;
                saved = 0.0;
            } else {
                let temp = n[j + 1] / (uright - uleft);
                n[j] = saved + (uright - t) * temp;
                saved = (t - uleft) * temp;
            }
        }
    }

    n[0]
}

/// Evaluate a single basis function N_{i,degree}(t) together with its
/// derivatives up to `max_order`. Agrees with the corresponding column of
/// [`ders_basis_functions`].
pub fn ders_one_basis_function(
    degree: usize,
    knots: &[f64],
    i: usize,
    t: f64,
    max_order: usize,
) -> Vec<f64> {
    let p = degree;
    let mut ders = vec![0.0; max_order + 1];

    // Local support: everything vanishes outside [knots[i], knots[i+p+1])
    if t < knots[i] || t >= knots[i + p + 1] {
        return ders;
    }

    // Full triangular table of basis functions of all degrees 0..=p
    let mut table = vec![vec![0.0; p + 1]; p + 1];
    for (j, row) in table.iter_mut().enumerate() {
        if t >= knots[i + j] && t < knots[i + j + 1] {
            row[0] = 1.0;
        }
    }

    for k in 1..=p {
        let mut saved = if table[0][k - 1] == 0.0 {
            0.0
        } else {
            (t - knots[i]) * table[0][k - 1] / (knots[i + k] - knots[i])
        };

        for j in 0..(p - k + 1) {
            let uleft = knots[i + j + 1];
            let uright = knots[i + j + k + 1];

            if table[j + 1][k - 1] == 0.0 {
                table[j][k] = saved;
                saved = 0.0;
            } else {
                let temp = table[j + 1][k - 1] / (uright - uleft);
                table[j][k] = saved + (uright - t) * temp;
                saved = (t - uleft) * temp;
            }
        }
    }

    ders[0] = table[0][p];

    // Work down the table for each derivative order; orders beyond the
    // degree stay zero.
    let n = max_order.min(p);
    let mut nd = vec![0.0; n + 1];

    for k in 1..=n {
        for (j, val) in nd.iter_mut().enumerate().take(k + 1) {
            *val = table[j][p - k];
        }

        for jj in 1..=k {
            let mut saved = if nd[0] == 0.0 {
                0.0
            } else {
                nd[0] / (knots[i + p - k + jj] - knots[i])
            };

            for j in 0..(k - jj + 1) {
                let uleft = knots[i + j + 1];
                let uright = knots[i + j + p - k + jj + 1];
                let deg = (p - k + jj) as f64;

                if nd[j + 1] == 0.0 {
                    nd[j] = deg * saved;
                    saved = 0.0;
                } else {
                    let temp = nd[j + 1] / (uright - uleft);
                    nd[j] = deg * (saved - temp);
                    saved = temp;
                }
            }
        }

        ders[k] = nd[0];
    }

    ders
}

/// Pascal's triangle of binomial coefficients up to row `n`:
/// `table[i][j] == C(i, j)` for `j <= i`.
pub fn binomial_coefficients(n: usize) -> Vec<Vec<f64>> {
    let mut table = vec![vec![0.0; n + 1]; n + 1];
    for i in 0..=n {
        table[i][0] = 1.0;
        for j in 1..=i {
            table[i][j] = table[i - 1][j - 1] + if j <= i - 1 { table[i - 1][j] } else { 0.0 };
        }
    }
    table
}
