// File: crates/tsagg-core/src/downsample.rs
// Summary: Point-selection kernels (Min-Max buckets, LTTB) over XY slices.
//
// Both kernels return the *positions* of the selected points in increasing
// order; callers turn them into series with `Series::take`.

/// Min-Max decimation: first and last point, plus the argmin and argmax of
/// each of `(n_out - 2) / 2` equal-width buckets over the interior.
/// Returns at most `n_out` positions (all positions when `n_out >= n`).
pub fn minmax_indices(points: &[(f64, f64)], n_out: usize) -> Vec<usize> {
    let n = points.len();
    if n_out >= n { return (0..n).collect(); }
    if n_out == 0 { return Vec::new(); }
    if n_out == 1 { return vec![0]; }

    let buckets = (n_out - 2) / 2;
    let mut out = Vec::with_capacity(n_out);
    out.push(0);
    if buckets > 0 {
        let interior = n - 2;
        for b in 0..buckets {
            let start = 1 + b * interior / buckets;
            let end = 1 + (b + 1) * interior / buckets;
            let Some((lo, hi)) = bucket_extrema(points, start, end) else { continue };
            if lo == hi {
                out.push(lo);
            } else {
                out.push(lo.min(hi));
                out.push(lo.max(hi));
            }
        }
    }
    out.push(n - 1);
    out
}

// argmin/argmax over [start, end), earliest position on ties; NaN values are skipped
fn bucket_extrema(points: &[(f64, f64)], start: usize, end: usize) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for k in start..end {
        let y = points[k].1;
        if y.is_nan() { continue; }
        best = Some(match best {
            None => (k, k),
            Some((lo, hi)) => (
                if y < points[lo].1 { k } else { lo },
                if y > points[hi].1 { k } else { hi },
            ),
        });
    }
    best
}

/// Largest-Triangle-Three-Buckets selection.
/// Returns exactly `threshold` positions when `3 <= threshold < n`.
pub fn lttb_indices(points: &[(f64, f64)], threshold: usize) -> Vec<usize> {
    let n = points.len();
    if threshold == 0 || n == 0 { return Vec::new(); }
    if threshold >= n || n <= 2 { return (0..n).collect(); }
    if threshold == 1 { return vec![0]; }
    if threshold == 2 { return vec![0, n - 1]; }

    let bucket_size = (n - 2) as f64 / (threshold - 2) as f64;
    let mut sampled = Vec::with_capacity(threshold);
    // Always include first
    sampled.push(0);

    let mut a = 0usize; // index of the point selected from the previous bucket

    for i in 0..(threshold - 2) {
        let start = (1.0 + (i as f64) * bucket_size).floor() as usize;
        let end = ((1.0 + ((i + 1) as f64) * bucket_size).floor() as usize).min(n - 1);

        // Average of the next bucket; the last bucket averages the final point.
        let next_end = ((1.0 + ((i + 2) as f64) * bucket_size).floor() as usize).min(n);
        let rs = end.min(n - 1);
        let re = next_end.max(rs + 1);
        let count = (re - rs) as f64;
        let (sum_x, sum_y) = points[rs..re]
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
        let (avg_x, avg_y) = (sum_x / count, sum_y / count);

        // Point in the current bucket maximising the triangle area with the
        // previous selection (a) and the next bucket average.
        let (a_x, a_y) = points[a];
        let mut max_area = -1.0f64;
        let mut max_idx = start;
        for k in start..end.max(start + 1) {
            let (x, y) = points[k];
            let area = ((a_x - x) * (avg_y - a_y) - (a_x - avg_x) * (y - a_y)).abs();
            if area > max_area {
                max_area = area;
                max_idx = k;
            }
        }
        sampled.push(max_idx);
        a = max_idx;
    }

    // Always include last
    sampled.push(n - 1);
    sampled
}
