//! Buffer-level fill primitives.
//!
//! Every repair strategy bottoms out here: a column is an owned
//! `Vec<Option<f64>>` (or `Vec<Option<T>>` for the positional fills)
//! aligned with a shared timestamp axis in epoch milliseconds. Values are
//! interpolated in timestamp space, not index space, so irregular spacing
//! is handled correctly.

/// Number of known (non-null) values in a buffer.
pub fn known_count(ys: &[Option<f64>]) -> usize {
    ys.iter().filter(|v| v.is_some()).count()
}

/// Linear interpolation between known neighbours, in timestamp space.
///
/// Interior nulls are interpolated between the bracketing known points.
/// Leading nulls take the first known value, trailing nulls hold the last
/// known value. A buffer with no known values is left untouched.
pub fn linear_fill(xs: &[i64], ys: &mut [Option<f64>]) {
    debug_assert_eq!(xs.len(), ys.len());

    let known: Vec<usize> = (0..ys.len()).filter(|&i| ys[i].is_some()).collect();
    if known.is_empty() {
        return;
    }

    let first = known[0];
    let last = *known.last().unwrap();
    for i in 0..first {
        ys[i] = ys[first];
    }
    for i in (last + 1)..ys.len() {
        ys[i] = ys[last];
    }

    for pair in known.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let (x0, y0) = (xs[lo] as f64, ys[lo].unwrap());
        let (x1, y1) = (xs[hi] as f64, ys[hi].unwrap());
        let span = x1 - x0;
        for i in (lo + 1)..hi {
            let t = if span == 0.0 {
                0.0
            } else {
                (xs[i] as f64 - x0) / span
            };
            ys[i] = Some(y0 + t * (y1 - y0));
        }
    }
}

/// Natural cubic-spline interpolation through the known points.
///
/// Returns `false` without touching the buffer when fewer than 4 known
/// points exist; the spline is not defined below that and the caller is
/// expected to fall back to [`linear_fill`]. Nulls outside the known range
/// take the boundary value, matching the linear edge behaviour.
pub fn cubic_fill(xs: &[i64], ys: &mut [Option<f64>]) -> bool {
    debug_assert_eq!(xs.len(), ys.len());

    let known: Vec<usize> = (0..ys.len()).filter(|&i| ys[i].is_some()).collect();
    if known.len() < 4 {
        return false;
    }

    let xk: Vec<f64> = known.iter().map(|&i| xs[i] as f64).collect();
    let yk: Vec<f64> = known.iter().map(|&i| ys[i].unwrap()).collect();
    let m = natural_spline_second_derivatives(&xk, &yk);

    let first = known[0];
    let last = *known.last().unwrap();
    for i in 0..first {
        ys[i] = ys[first];
    }
    for i in (last + 1)..ys.len() {
        ys[i] = ys[last];
    }

    let mut seg = 0usize;
    for i in (first + 1)..last {
        if ys[i].is_some() {
            continue;
        }
        let x = xs[i] as f64;
        while seg + 2 < xk.len() && xk[seg + 1] < x {
            seg += 1;
        }
        let h = xk[seg + 1] - xk[seg];
        if h == 0.0 {
            ys[i] = Some(yk[seg]);
            continue;
        }
        let a = (xk[seg + 1] - x) / h;
        let b = (x - xk[seg]) / h;
        let value = a * yk[seg]
            + b * yk[seg + 1]
            + ((a * a * a - a) * m[seg] + (b * b * b - b) * m[seg + 1]) * h * h / 6.0;
        ys[i] = Some(value);
    }
    true
}

/// Second derivatives of the natural cubic spline (Thomas algorithm on the
/// tridiagonal system; natural boundary conditions M[0] = M[n-1] = 0).
fn natural_spline_second_derivatives(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    let mut sub = vec![0.0; n];
    let mut diag = vec![0.0; n];
    let mut sup = vec![0.0; n];
    let mut rhs = vec![0.0; n];

    for i in 1..n - 1 {
        let h0 = x[i] - x[i - 1];
        let h1 = x[i + 1] - x[i];
        sub[i] = h0;
        diag[i] = 2.0 * (h0 + h1);
        sup[i] = h1;
        rhs[i] = 6.0 * ((y[i + 1] - y[i]) / h1 - (y[i] - y[i - 1]) / h0);
    }

    // Forward sweep over the interior rows.
    for i in 2..n - 1 {
        let w = sub[i] / diag[i - 1];
        diag[i] -= w * sup[i - 1];
        rhs[i] -= w * rhs[i - 1];
    }

    // Back substitution.
    m[n - 2] = rhs[n - 2] / diag[n - 2];
    for i in (1..n - 2).rev() {
        m[i] = (rhs[i] - sup[i] * m[i + 1]) / diag[i];
    }
    m
}

/// Replace nulls with the nearest preceding known value, optionally
/// bounded to `limit` positions.
pub fn forward_fill<T: Clone>(vals: &mut [Option<T>], limit: Option<usize>) {
    let mut last: Option<T> = None;
    let mut distance = 0usize;
    for v in vals.iter_mut() {
        match v {
            Some(value) => {
                last = Some(value.clone());
                distance = 0;
            }
            None => {
                distance += 1;
                if limit.map_or(true, |l| distance <= l) {
                    *v = last.clone();
                }
            }
        }
    }
}

/// Replace nulls with the nearest following known value, optionally
/// bounded to `limit` positions.
pub fn backward_fill<T: Clone>(vals: &mut [Option<T>], limit: Option<usize>) {
    let mut next: Option<T> = None;
    let mut distance = 0usize;
    for v in vals.iter_mut().rev() {
        match v {
            Some(value) => {
                next = Some(value.clone());
                distance = 0;
            }
            None => {
                distance += 1;
                if limit.map_or(true, |l| distance <= l) {
                    *v = next.clone();
                }
            }
        }
    }
}

/// Fill nulls with a centered rolling mean of the *original* known values.
///
/// The heuristic forecast strategy: no model, just local averaging. Nulls
/// whose window contains no known value stay null. Fills never cascade
/// because the mean is taken over a snapshot of the input buffer.
pub fn rolling_mean_fill(ys: &mut [Option<f64>], window: usize) {
    if window == 0 {
        return;
    }
    let snapshot: Vec<Option<f64>> = ys.to_vec();
    let half = window / 2;
    for i in 0..ys.len() {
        if ys[i].is_some() {
            continue;
        }
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(snapshot.len());
        let mut sum = 0.0;
        let mut count = 0usize;
        for v in snapshot[lo..hi].iter().flatten() {
            sum += v;
            count += 1;
        }
        if count > 0 {
            ys[i] = Some(sum / count as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: i64 = 3_600_000;

    fn axis(n: usize) -> Vec<i64> {
        (0..n as i64).map(|i| i * H).collect()
    }

    #[test]
    fn linear_interior_midpoint() {
        let xs = axis(3);
        let mut ys = vec![Some(10.0), None, Some(20.0)];
        linear_fill(&xs, &mut ys);
        assert_eq!(ys, vec![Some(10.0), Some(15.0), Some(20.0)]);
    }

    #[test]
    fn linear_respects_irregular_spacing() {
        // Known at t=0 and t=4h, hole at t=1h: value is 1/4 of the way.
        let xs = vec![0, H, 4 * H];
        let mut ys = vec![Some(0.0), None, Some(8.0)];
        linear_fill(&xs, &mut ys);
        assert_eq!(ys[1], Some(2.0));
    }

    #[test]
    fn linear_edges_hold_boundary_values() {
        let xs = axis(5);
        let mut ys = vec![None, Some(3.0), None, Some(5.0), None];
        linear_fill(&xs, &mut ys);
        assert_eq!(ys, vec![Some(3.0), Some(3.0), Some(4.0), Some(5.0), Some(5.0)]);
    }

    #[test]
    fn linear_all_null_untouched() {
        let xs = axis(3);
        let mut ys: Vec<Option<f64>> = vec![None, None, None];
        linear_fill(&xs, &mut ys);
        assert!(ys.iter().all(|v| v.is_none()));
    }

    #[test]
    fn cubic_requires_four_known_points() {
        let xs = axis(4);
        let mut ys = vec![Some(1.0), None, Some(2.0), Some(3.0)];
        assert!(!cubic_fill(&xs, &mut ys));
        assert_eq!(ys[1], None);
    }

    #[test]
    fn cubic_reproduces_a_line() {
        // A spline through collinear points is that line.
        let xs = axis(7);
        let mut ys = vec![
            Some(0.0),
            Some(1.0),
            None,
            Some(3.0),
            None,
            Some(5.0),
            Some(6.0),
        ];
        assert!(cubic_fill(&xs, &mut ys));
        assert!((ys[2].unwrap() - 2.0).abs() < 1e-9);
        assert!((ys[4].unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn cubic_is_smooth_on_a_parabola() {
        let xs = axis(9);
        let truth: Vec<f64> = (0..9).map(|i| (i as f64) * (i as f64)).collect();
        let mut ys: Vec<Option<f64>> = truth.iter().map(|&v| Some(v)).collect();
        ys[4] = None;
        assert!(cubic_fill(&xs, &mut ys));
        // Natural spline through a parabola is close but not exact at the
        // boundaries; mid-series it should be within a tight tolerance.
        assert!((ys[4].unwrap() - truth[4]).abs() < 0.2);
    }

    #[test]
    fn forward_fill_with_and_without_limit() {
        let mut vals = vec![Some(1), None, None, None, Some(5)];
        forward_fill(&mut vals, Some(2));
        assert_eq!(vals, vec![Some(1), Some(1), Some(1), None, Some(5)]);

        let mut vals = vec![None, Some(2), None];
        forward_fill(&mut vals, None);
        assert_eq!(vals, vec![None, Some(2), Some(2)]);
    }

    #[test]
    fn backward_fill_mirrors_forward() {
        let mut vals = vec![None, None, Some(3), None];
        backward_fill(&mut vals, Some(1));
        assert_eq!(vals, vec![None, Some(3), Some(3), None]);
    }

    #[test]
    fn rolling_mean_uses_snapshot() {
        let mut ys = vec![Some(1.0), None, None, Some(4.0)];
        rolling_mean_fill(&mut ys, 4);
        // Both holes average over the same two known values.
        assert_eq!(ys[1], Some(2.5));
        assert_eq!(ys[2], Some(2.5));
    }

    #[test]
    fn rolling_mean_leaves_isolated_nulls() {
        let mut ys: Vec<Option<f64>> = vec![None, None, None];
        rolling_mean_fill(&mut ys, 2);
        assert!(ys.iter().all(|v| v.is_none()));
    }
}
