// File: crates/tsagg-core/src/gaps.rs
// Summary: Gap detection on the index and NaN marker placement after aggregation.

use std::str::FromStr;

use crate::error::{Error, Result};

/// Where the "no value" marker goes when a gap is detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GapMarker {
    /// First point after the gap.
    #[default]
    End,
    /// Last point before the gap.
    Begin,
    /// Both points enclosing the gap.
    Both,
}

impl FromStr for GapMarker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "end" => Ok(GapMarker::End),
            "begin" => Ok(GapMarker::Begin),
            "both" => Ok(GapMarker::Both),
            other => Err(Error::config(format!("unknown gap marker `{other}`"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GapConfig {
    pub interleave_gaps: bool,
    pub marker: GapMarker,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self { interleave_gaps: true, marker: GapMarker::End }
    }
}

impl GapConfig {
    pub const fn disabled() -> Self {
        Self { interleave_gaps: false, marker: GapMarker::End }
    }
}

/// A step is a gap when it exceeds this multiple of the typical step.
pub const GAP_FACTOR: f64 = 4.1;
const N_BLOCKS: usize = 128;

/// Typical step between consecutive index values.
///
/// Long indices are split into `N_BLOCKS` blocks; the estimate is the median
/// of the block means, which tolerates a few very large gaps.
pub fn typical_step(index: &[f64]) -> Option<f64> {
    if index.len() < 2 { return None; }
    let diffs: Vec<f64> = index.windows(2).map(|w| w[1] - w[0]).collect();

    let step = if diffs.len() > 5 * N_BLOCKS {
        let block = diffs.len() / N_BLOCKS;
        let means: Vec<f64> = diffs[..block * N_BLOCKS]
            .chunks(block)
            .map(|c| c.iter().sum::<f64>() / c.len() as f64)
            .collect();
        median(means)
    } else {
        median(diffs)
    };
    Some(step)
}

fn median(mut v: Vec<f64>) -> f64 {
    v.sort_by(|a, b| a.total_cmp(b));
    let n = v.len();
    if n % 2 == 1 { v[n / 2] } else { (v[n / 2 - 1] + v[n / 2]) * 0.5 }
}

/// Positions to replace with a NaN marker, or `None` when no gap is found.
pub fn gap_mask(index: &[f64], marker: GapMarker) -> Option<Vec<bool>> {
    let step = typical_step(index)?;
    // position 0 has no predecessor, so it never follows a gap
    let after: Vec<bool> = std::iter::once(false)
        .chain(index.windows(2).map(|w| w[1] - w[0] > GAP_FACTOR * step))
        .collect();
    if !after.iter().any(|&g| g) { return None; }

    let n = after.len();
    let before = |i: usize| i + 1 < n && after[i + 1];
    let mask = match marker {
        GapMarker::End => after,
        GapMarker::Begin => (0..n).map(before).collect(),
        GapMarker::Both => (0..n).map(|i| after[i] || before(i)).collect(),
    };
    Some(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gapped() -> Vec<f64> {
        // unit steps with one jump of 50 between positions 9 and 10
        (0..10).map(|i| i as f64).chain((0..10).map(|i| 59.0 + i as f64)).collect()
    }

    #[test]
    fn regular_index_has_no_gap() {
        let idx: Vec<f64> = (0..1_000).map(|i| i as f64 * 0.5).collect();
        assert!(gap_mask(&idx, GapMarker::Both).is_none());
    }

    #[test]
    fn marker_positions() {
        let idx = gapped();
        let end = gap_mask(&idx, GapMarker::End).unwrap();
        let begin = gap_mask(&idx, GapMarker::Begin).unwrap();
        let both = gap_mask(&idx, GapMarker::Both).unwrap();
        let on = |m: &[bool]| m.iter().enumerate().filter(|(_, &b)| b).map(|(i, _)| i).collect::<Vec<_>>();
        assert_eq!(on(&end), vec![10]);
        assert_eq!(on(&begin), vec![9]);
        assert_eq!(on(&both), vec![9, 10]);
    }

    #[test]
    fn block_median_on_long_index() {
        let mut idx: Vec<f64> = (0..2_000).map(|i| i as f64).collect();
        for v in idx.iter_mut().skip(1_000) { *v += 500.0; }
        let step = typical_step(&idx).unwrap();
        assert!((step - 1.0).abs() < 1e-9);
        let mask = gap_mask(&idx, GapMarker::End).unwrap();
        assert!(mask[1_000]);
        assert_eq!(mask.iter().filter(|&&b| b).count(), 1);
    }

    #[test]
    fn short_irregular_index_has_no_gap() {
        // steps 1 and 5: median 3, threshold 12.3
        assert!(gap_mask(&[0.0, 1.0, 6.0], GapMarker::End).is_none());
        assert_eq!(typical_step(&[0.0, 1.0, 6.0]), Some(3.0));
    }

    #[test]
    fn parses_markers() {
        assert_eq!("Both".parse::<GapMarker>().unwrap(), GapMarker::Both);
        assert!("middle".parse::<GapMarker>().is_err());
    }

    #[test]
    fn two_point_index_is_never_a_gap() {
        assert!(gap_mask(&[0.0, 1_000.0], GapMarker::Both).is_none());
    }
}
