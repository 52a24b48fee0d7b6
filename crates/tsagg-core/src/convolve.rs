// File: crates/tsagg-core/src/convolve.rs
// Summary: Box filters over 2-D planes with reflective edges (separable and direct forms).
//
// Reflect mode mirrors about the edge including the edge sample:
// `d c b a | a b c d | d c b a`.

use ndarray::{Array2, ArrayView2, Axis, Zip};

use crate::error::{Error, Result};

/// Map an out-of-range index back into `0..n` by reflection.
#[inline]
pub fn reflect_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    (if m < n { m } else { period - 1 - m }) as usize
}

pub(crate) fn check_window(window: usize) -> Result<()> {
    if window == 0 || window % 2 == 0 {
        return Err(Error::config(format!("window must be a positive odd size, got {window}")));
    }
    Ok(())
}

/// Sum over a centred window of `window` samples along `axis`.
pub fn box_sum_1d(input: ArrayView2<f64>, window: usize, axis: Axis) -> Result<Array2<f64>> {
    check_window(window)?;
    let half = (window / 2) as isize;
    let mut out = Array2::<f64>::zeros(input.raw_dim());
    Zip::from(input.lanes(axis))
        .and(out.lanes_mut(axis))
        .for_each(|src, mut dst| {
            let n = src.len();
            for j in 0..n {
                let mut acc = 0.0;
                for k in -half..=half {
                    acc += src[reflect_index(j as isize + k, n)];
                }
                dst[j] = acc;
            }
        });
    Ok(out)
}

/// Box sum with a `window x window` all-ones kernel as two 1-D passes
/// (rows then columns).
pub fn box_sum_separable(input: ArrayView2<f64>, window: usize) -> Result<Array2<f64>> {
    let rows = box_sum_1d(input, window, Axis(0))?;
    box_sum_1d(rows.view(), window, Axis(1))
}

/// Direct 2-D box sum; reference for the separable form.
pub fn box_sum_direct(input: ArrayView2<f64>, window: usize) -> Result<Array2<f64>> {
    check_window(window)?;
    let (rows, cols) = input.dim();
    let half = (window / 2) as isize;
    let out = Array2::from_shape_fn((rows, cols), |(i, j)| {
        let mut acc = 0.0;
        for ki in -half..=half {
            let ii = reflect_index(i as isize + ki, rows);
            for kj in -half..=half {
                acc += input[[ii, reflect_index(j as isize + kj, cols)]];
            }
        }
        acc
    });
    Ok(out)
}

/// Local mean over a `window x window` neighbourhood.
pub fn uniform_filter(input: ArrayView2<f64>, window: usize) -> Result<Array2<f64>> {
    let area = (window * window) as f64;
    let mut sum = box_sum_separable(input, window)?;
    sum.mapv_inplace(|v| v / area);
    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn reflect_matches_mirror_layout() {
        // d c b a | a b c d | d c b a
        let got: Vec<usize> = (-4..8).map(|i| reflect_index(i, 4)).collect();
        assert_eq!(got, vec![3, 2, 1, 0, 0, 1, 2, 3, 3, 2, 1, 0]);
        // windows wider than the plane keep folding
        assert_eq!(reflect_index(-9, 2), 0);
        assert_eq!(reflect_index(-3, 2), 1);
        assert_eq!(reflect_index(5, 1), 0);
    }

    #[test]
    fn even_window_rejected() {
        let a = Array2::<f64>::zeros((3, 3));
        assert!(box_sum_1d(a.view(), 4, Axis(0)).is_err());
        assert!(box_sum_direct(a.view(), 0).is_err());
    }

    #[test]
    fn one_dimensional_sum() {
        let a = array![[1.0, 2.0, 3.0]];
        let s = box_sum_1d(a.view(), 3, Axis(1)).unwrap();
        // reflect: [1] 1 2 3 [3]
        assert_eq!(s, array![[4.0, 6.0, 8.0]]);
    }

    #[test]
    fn uniform_filter_of_constant_is_constant() {
        let a = Array2::from_elem((6, 9), 7.0);
        let m = uniform_filter(a.view(), 5).unwrap();
        assert!(m.iter().all(|&v| (v - 7.0).abs() < 1e-12));
    }
}
