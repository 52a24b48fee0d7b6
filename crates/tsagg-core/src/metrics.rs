// File: crates/tsagg-core/src/metrics.rs
// Summary: Fidelity scoring of an aggregated rendering against its reference rendering.
//
// Everything is computed on a single channel. The relevance mask keeps the
// pixels near either drawn line; each mean is reported globally and
// restricted to the mask.

use log::debug;
use ndarray::{Array2, ArrayView2, Zip};

use crate::convolve::box_sum_separable;
use crate::error::{Error, Result};
use crate::raster::{channel, Raster};
use crate::ssim::{ssim_map, SsimParams};

pub const DEFAULT_MASK_WINDOW: usize = 11;
pub const DEFAULT_PIXEL_ERROR_MARGINS: [u8; 7] = [0, 10, 20, 30, 50, 75, 100];
pub const DEFAULT_ILLUMINATION_THRESHOLDS: [u8; 4] = [0, 10, 20, 50];

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreConfig {
    /// Dilation window of the relevance mask; odd.
    pub mask_window: usize,
    pub ssim: SsimParams,
    /// A pixel counts as an error at margin `m` when `|agg - ref| > m`.
    pub pixel_error_margins: Vec<u8>,
    /// A pixel flips at threshold `t` when `agg > t` differs from `ref > t`.
    pub illumination_thresholds: Vec<u8>,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            mask_window: DEFAULT_MASK_WINDOW,
            ssim: SsimParams::default(),
            pixel_error_margins: DEFAULT_PIXEL_ERROR_MARGINS.to_vec(),
            illumination_thresholds: DEFAULT_ILLUMINATION_THRESHOLDS.to_vec(),
        }
    }
}

/// Scalar summary of one comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricRecord {
    pub dssim: f64,
    pub dssim_masked: f64,
    pub ssim: f64,
    pub ssim_masked: f64,
    pub mse: f64,
    pub mse_masked: f64,
    pub mae: f64,
    pub mae_masked: f64,
    pub conv_mask_size: usize,
    /// `(margin, count)` in configuration order.
    pub pixel_errors: Vec<(u8, usize)>,
    /// `(threshold, count)` in configuration order.
    pub illumination_errors: Vec<(u8, usize)>,
}

impl MetricRecord {
    /// Named metrics in table column order.
    pub fn entries(&self) -> Vec<(String, f64)> {
        let mut out = vec![
            ("DSSIM".to_string(), self.dssim),
            ("DSSIM_masked".to_string(), self.dssim_masked),
            ("SSIM".to_string(), self.ssim),
            ("SSIM_masked".to_string(), self.ssim_masked),
            ("MSE".to_string(), self.mse),
            ("MSE_masked".to_string(), self.mse_masked),
            ("MAE".to_string(), self.mae),
            ("MAE_masked".to_string(), self.mae_masked),
            ("conv_mask_size".to_string(), self.conv_mask_size as f64),
        ];
        for &(m, count) in &self.pixel_errors {
            let name = if m == 0 { "pixel_errors".to_string() } else { format!("pixel_errors_margin_{m}") };
            out.push((name, count as f64));
        }
        for &(t, count) in &self.illumination_errors {
            let name = if t == 0 {
                "illumination_error".to_string()
            } else {
                format!("illumination_error_margin_{t}")
            };
            out.push((name, count as f64));
        }
        out
    }

    /// Look a metric up by its table name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries().into_iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

fn check_same_shape(agg: &Raster, reference: &Raster) -> Result<()> {
    if agg.shape() != reference.shape() {
        return Err(Error::ShapeMismatch { left: agg.shape().to_vec(), right: reference.shape().to_vec() });
    }
    Ok(())
}

fn check_same_hw(a: &[usize], b: &[usize]) -> Result<()> {
    if a[..2] != b[..2] {
        return Err(Error::ShapeMismatch { left: a.to_vec(), right: b.to_vec() });
    }
    Ok(())
}

/// Nonzero-union of two planes dilated by a `window x window` box.
///
/// Two 1-D box sums (rows, then columns) stand in for the 2-D convolution;
/// this is exact because the all-ones kernel is separable.
pub fn or_conv_mask(a: ArrayView2<u8>, b: ArrayView2<u8>, window: usize) -> Result<Array2<bool>> {
    check_same_hw(a.shape(), b.shape())?;
    let joined = Zip::from(&a).and(&b).map_collect(|&x, &y| if x != 0 || y != 0 { 1.0 } else { 0.0 });
    let summed = box_sum_separable(joined.view(), window)?;
    Ok(summed.mapv(|v| v > 0.0))
}

/// Mask for one channel of two rasters.
pub fn relevance_mask(agg: &Raster, reference: &Raster, ch: usize, window: usize) -> Result<Array2<bool>> {
    check_same_hw(agg.shape(), reference.shape())?;
    or_conv_mask(channel(agg, ch)?, channel(reference, ch)?, window)
}

fn masked_mean(values: &Array2<f64>, mask: &Array2<bool>) -> f64 {
    let (sum, n) = Zip::from(values)
        .and(mask)
        .fold((0.0, 0usize), |(s, n), &v, &m| if m { (s + v, n + 1) } else { (s, n) });
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

fn mean(values: &Array2<f64>) -> f64 {
    values.mean().unwrap_or(f64::NAN)
}

#[derive(Clone, Debug, Default)]
pub struct Scorer {
    pub config: ScoreConfig,
}

impl Scorer {
    pub fn new(config: ScoreConfig) -> Self { Self { config } }

    /// Score `agg` against `reference` on channel `ch`, building the relevance
    /// mask from the same channel.
    pub fn score(&self, agg: &Raster, reference: &Raster, ch: usize) -> Result<MetricRecord> {
        check_same_shape(agg, reference)?;
        let mask = relevance_mask(agg, reference, ch, self.config.mask_window)?;
        self.score_with_mask(agg, reference, ch, &mask)
    }

    /// Score with a caller-provided mask (same height/width as the rasters).
    pub fn score_with_mask(
        &self,
        agg: &Raster,
        reference: &Raster,
        ch: usize,
        mask: &Array2<bool>,
    ) -> Result<MetricRecord> {
        check_same_shape(agg, reference)?;
        check_same_hw(agg.shape(), mask.shape())?;
        let a = channel(agg, ch)?;
        let r = channel(reference, ch)?;

        let af = a.mapv(f64::from);
        let rf = r.mapv(f64::from);
        let ssim = ssim_map(rf.view(), af.view(), &self.config.ssim)?;
        let dssim = ssim.mapv(|s| (1.0 - s) / 2.0);

        // signed integer differences: no 8-bit wrap-around, no rounding in the counts
        let diff = Zip::from(&a).and(&r).map_collect(|&x, &y| i32::from(x) - i32::from(y));
        let se = diff.mapv(|d| f64::from(d * d));
        let ae = diff.mapv(|d| d.abs());
        let ae_f = ae.mapv(f64::from);

        let pixel_errors = self
            .config
            .pixel_error_margins
            .iter()
            .map(|&m| (m, ae.iter().filter(|&&e| e > i32::from(m)).count()))
            .collect();
        let illumination_errors = self
            .config
            .illumination_thresholds
            .iter()
            .map(|&t| {
                let flips = Zip::from(&a)
                    .and(&r)
                    .fold(0usize, |n, &x, &y| n + usize::from((x > t) != (y > t)));
                (t, flips)
            })
            .collect();

        let conv_mask_size = mask.iter().filter(|&&m| m).count();
        debug!("scored channel {ch}: mask covers {conv_mask_size} of {} pixels", mask.len());

        Ok(MetricRecord {
            dssim: mean(&dssim),
            dssim_masked: masked_mean(&dssim, mask),
            ssim: mean(&ssim),
            ssim_masked: masked_mean(&ssim, mask),
            mse: mean(&se),
            mse_masked: masked_mean(&se, mask),
            mae: mean(&ae_f),
            mae_masked: masked_mean(&ae_f, mask),
            conv_mask_size,
            pixel_errors,
            illumination_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_follow_table_layout() {
        let rec = MetricRecord {
            dssim: 0.0,
            dssim_masked: 0.0,
            ssim: 1.0,
            ssim_masked: 1.0,
            mse: 0.0,
            mse_masked: 0.0,
            mae: 0.0,
            mae_masked: 0.0,
            conv_mask_size: 3,
            pixel_errors: vec![(0, 5), (10, 2)],
            illumination_errors: vec![(0, 4), (50, 1)],
        };
        let names: Vec<String> = rec.entries().into_iter().map(|(n, _)| n).collect();
        assert_eq!(&names[8..], &[
            "conv_mask_size",
            "pixel_errors",
            "pixel_errors_margin_10",
            "illumination_error",
            "illumination_error_margin_50",
        ]);
        assert_eq!(rec.get("pixel_errors"), Some(5.0));
        assert_eq!(rec.get("nope"), None);
    }

    #[test]
    fn masked_mean_of_empty_mask_is_nan() {
        let v = Array2::<f64>::ones((2, 2));
        let m = Array2::from_elem((2, 2), false);
        assert!(masked_mean(&v, &m).is_nan());
    }
}
