// File: crates/tsagg-core/src/aggregator.rs
// Summary: Aggregation algorithms (closed set) and the shared aggregate + gap post-process.

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::downsample::{lttb_indices, minmax_indices};
use crate::error::{Error, Result};
use crate::gaps::{gap_mask, GapConfig};
use crate::series::Series;

/// Default intermediate reduction factor of the MinMax -> LTTB hybrid.
pub const DEFAULT_MINMAX_RATIO: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    MinMax,
    Lttb,
    /// MinMax down to `n_out * minmax_ratio`, then LTTB down to `n_out`.
    MinMaxLttb { minmax_ratio: usize },
}

impl Algorithm {
    pub const fn minmax_lttb() -> Self {
        Algorithm::MinMaxLttb { minmax_ratio: DEFAULT_MINMAX_RATIO }
    }

    /// Same algorithm with a different intermediate ratio; only the hybrid has one.
    pub fn with_minmax_ratio(self, minmax_ratio: usize) -> Self {
        match self {
            Algorithm::MinMaxLttb { .. } => Algorithm::MinMaxLttb { minmax_ratio },
            other => other,
        }
    }

    /// Name used in dataset/figure keys and result tables.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::MinMax => "MinMaxAggregator",
            Algorithm::Lttb => "LTTB",
            Algorithm::MinMaxLttb { .. } => "MinMaxLTTB",
        }
    }

    /// Positions of `points` kept for an output of at most `n_out` points.
    pub fn select(&self, points: &[(f64, f64)], n_out: usize) -> Result<Vec<usize>> {
        if n_out == 0 {
            return Err(Error::config("n_out must be positive"));
        }
        Ok(match *self {
            Algorithm::MinMax => minmax_indices(points, n_out),
            Algorithm::Lttb => lttb_indices(points, n_out),
            Algorithm::MinMaxLttb { minmax_ratio } => {
                if minmax_ratio == 0 {
                    return Err(Error::config("minmax_ratio must be positive"));
                }
                let coarse = minmax_indices(points, n_out.saturating_mul(minmax_ratio));
                debug!("minmax stage: {} -> {} points (target {})", points.len(), coarse.len(), n_out);
                if coarse.len() <= n_out {
                    return Ok(coarse);
                }
                let reduced: Vec<(f64, f64)> = coarse.iter().map(|&i| points[i]).collect();
                lttb_indices(&reduced, n_out).into_iter().map(|j| coarse[j]).collect()
            }
        })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "minmax" | "minmaxaggregator" => Ok(Algorithm::MinMax),
            "lttb" => Ok(Algorithm::Lttb),
            "minmaxlttb" | "minmax-lttb" => Ok(Algorithm::minmax_lttb()),
            other => Err(Error::config(format!("unknown aggregator `{other}`"))),
        }
    }
}

/// An algorithm plus the gap post-process every aggregator shares.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aggregator {
    pub algorithm: Algorithm,
    pub gaps: GapConfig,
}

impl Aggregator {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm, gaps: GapConfig::default() }
    }

    pub fn with_gaps(mut self, gaps: GapConfig) -> Self {
        self.gaps = gaps;
        self
    }

    pub fn name(&self) -> &'static str { self.algorithm.name() }

    /// Reduce `series` to at most `n_out` points.
    ///
    /// Series that already fit are returned as-is (gap markers still apply).
    pub fn aggregate(&self, series: &Series, n_out: usize) -> Result<Series> {
        if n_out == 0 {
            return Err(Error::config("n_out must be positive"));
        }
        let points = series.points()?;
        let reduced = if series.len() > n_out {
            let positions = self.algorithm.select(&points, n_out)?;
            debug!("{}: {} -> {} points", self.algorithm, series.len(), positions.len());
            series.take(&positions)
        } else {
            series.clone()
        };

        if !self.gaps.interleave_gaps {
            return Ok(reduced);
        }
        match gap_mask(reduced.index(), self.gaps.marker) {
            Some(mask) => {
                debug!("{}: marking {} gap point(s)", self.algorithm, mask.iter().filter(|&&m| m).count());
                reduced.with_nan_at(&mask)
            }
            None => Ok(reduced),
        }
    }
}
