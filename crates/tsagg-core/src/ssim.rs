// File: crates/tsagg-core/src/ssim.rs
// Summary: Windowed structural similarity (uniform window, sample covariance) returning the full map.

use ndarray::{Array2, ArrayView2, Zip};

use crate::convolve::{check_window, uniform_filter};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SsimParams {
    /// Side of the square uniform window; odd.
    pub window: usize,
    /// Dynamic range of the intensities (255 for 8-bit).
    pub data_range: f64,
    pub k1: f64,
    pub k2: f64,
}

impl Default for SsimParams {
    fn default() -> Self {
        Self { window: 11, data_range: 255.0, k1: 0.01, k2: 0.03 }
    }
}

/// Per-pixel SSIM of `a` against `b` (same shape).
///
/// Local statistics use a `window x window` mean filter with reflective
/// edges; variances and covariance are scaled by `N / (N - 1)`.
pub fn ssim_map(a: ArrayView2<f64>, b: ArrayView2<f64>, params: &SsimParams) -> Result<Array2<f64>> {
    check_window(params.window)?;
    if a.dim() != b.dim() {
        return Err(Error::ShapeMismatch { left: a.shape().to_vec(), right: b.shape().to_vec() });
    }
    let (rows, cols) = a.dim();
    if rows < params.window || cols < params.window {
        return Err(Error::config(format!(
            "window {} exceeds image extent {}x{}",
            params.window, rows, cols
        )));
    }
    let np = (params.window * params.window) as f64;
    let cov_norm = if np > 1.0 { np / (np - 1.0) } else { 1.0 };

    let ux = uniform_filter(a, params.window)?;
    let uy = uniform_filter(b, params.window)?;
    let uxx = uniform_filter((&a * &a).view(), params.window)?;
    let uyy = uniform_filter((&b * &b).view(), params.window)?;
    let uxy = uniform_filter((&a * &b).view(), params.window)?;

    let c1 = (params.k1 * params.data_range).powi(2);
    let c2 = (params.k2 * params.data_range).powi(2);

    let mut out = Array2::<f64>::zeros((rows, cols));
    Zip::from(&mut out)
        .and(&ux)
        .and(&uy)
        .and(&uxx)
        .and(&uyy)
        .and(&uxy)
        .for_each(|s, &mx, &my, &mxx, &myy, &mxy| {
            let vx = cov_norm * (mxx - mx * mx);
            let vy = cov_norm * (myy - my * my);
            let vxy = cov_norm * (mxy - mx * my);
            let num = (2.0 * mx * my + c1) * (2.0 * vxy + c2);
            let den = (mx * mx + my * my + c1) * (vx + vy + c2);
            *s = num / den;
        });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(i, j)| if (i / 3 + j / 3) % 2 == 0 { 255.0 } else { 0.0 })
    }

    #[test]
    fn identical_planes_score_one() {
        let a = checker(20, 30);
        let s = ssim_map(a.view(), a.view(), &SsimParams::default()).unwrap();
        assert!(s.iter().all(|&v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn inverted_plane_scores_low() {
        let a = checker(20, 30);
        let b = a.mapv(|v| 255.0 - v);
        let s = ssim_map(a.view(), b.view(), &SsimParams::default()).unwrap();
        let mean = s.mean().unwrap();
        assert!(mean < 0.0, "mean ssim {mean}");
    }

    #[test]
    fn too_small_for_window() {
        let a = Array2::<f64>::zeros((5, 40));
        let err = ssim_map(a.view(), a.view(), &SsimParams::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }
}
