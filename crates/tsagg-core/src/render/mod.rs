// File: crates/tsagg-core/src/render/mod.rs
// Summary: Line rendering to rasters through a closed set of backends.
// Notes:
// - Rasters are only comparable when rendered with the same canvas size and
//   the same axis limits; pass explicit `xlim`/`ylim` when comparing.

mod bitmap;
mod skia_cpu;

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::series::Series;
use crate::types::{DPI, HEIGHT, LINE_WIDTH_PX, WIDTH};

/// How consecutive points are joined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineShape {
    #[default]
    Linear,
    Spline,
    Hv,
    Vh,
    Hvh,
    Vhv,
}

impl LineShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineShape::Linear => "linear",
            LineShape::Spline => "spline",
            LineShape::Hv => "hv",
            LineShape::Vh => "vh",
            LineShape::Hvh => "hvh",
            LineShape::Vhv => "vhv",
        }
    }
}

impl fmt::Display for LineShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for LineShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "linear" => LineShape::Linear,
            "spline" => LineShape::Spline,
            "hv" => LineShape::Hv,
            "vh" => LineShape::Vh,
            "hvh" => LineShape::Hvh,
            "vhv" => LineShape::Vhv,
            other => return Err(Error::config(format!("unknown line shape `{other}`"))),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Density the pixel sizes are quoted at. Canvas and stroke are given in
    /// pixels, so it does not change the raster.
    pub dpi: f64,
    pub anti_alias: bool,
    pub line_width_px: f64,
    pub line_shape: LineShape,
    /// `None` derives the range from the data.
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            dpi: DPI,
            anti_alias: true,
            line_width_px: LINE_WIDTH_PX,
            line_shape: LineShape::Linear,
            xlim: None,
            ylim: None,
        }
    }
}

impl RenderConfig {
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.xlim = Some(limits.x);
        self.ylim = Some(limits.y);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::config(format!("canvas must be non-empty, got {}x{}", self.width, self.height)));
        }
        if !(self.dpi > 0.0) {
            return Err(Error::config(format!("dpi must be positive, got {}", self.dpi)));
        }
        if !(self.line_width_px > 0.0) {
            return Err(Error::config(format!("line width must be positive, got {}", self.line_width_px)));
        }
        for (name, lim) in [("xlim", self.xlim), ("ylim", self.ylim)] {
            if let Some((lo, hi)) = lim {
                if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                    return Err(Error::config(format!("{name} must be finite and increasing, got ({lo}, {hi})")));
                }
            }
        }
        Ok(())
    }
}

/// Data-space ranges mapped onto the full canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl Limits {
    /// x from the first to the last sample, y over the finite values.
    /// Degenerate spans are widened by 1.
    pub fn from_data(x: &[f64], y: &[f64]) -> Self {
        let (mut x_min, mut x_max) = match (x.first(), x.last()) {
            (Some(&a), Some(&b)) if a.is_finite() && b.is_finite() => (a, b),
            _ => (0.0, 1.0),
        };
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for &v in y.iter().filter(|v| v.is_finite()) {
            y_min = y_min.min(v);
            y_max = y_max.max(v);
        }
        if !y_min.is_finite() || !y_max.is_finite() {
            y_min = 0.0;
            y_max = 1.0;
        }
        if (x_max - x_min).abs() < 1e-9 { x_max = x_min + 1.0; }
        if (y_max - y_min).abs() < 1e-9 { y_max = y_min + 1.0; }
        if x_max < x_min { std::mem::swap(&mut x_min, &mut x_max); }
        Self { x: (x_min, x_max), y: (y_min, y_max) }
    }

    pub fn from_series(series: &Series) -> Result<Self> {
        let ys = series.values().to_f64()?;
        Ok(Self::from_data(series.index(), &ys))
    }

    fn resolve(cfg: &RenderConfig, x: &[f64], y: &[f64]) -> Self {
        let data = Self::from_data(x, y);
        Self { x: cfg.xlim.unwrap_or(data.x), y: cfg.ylim.unwrap_or(data.y) }
    }
}

const SPLINE_STEPS: usize = 8;

/// Polyline segments in data space: split at non-finite values and expanded
/// according to `shape`. Segments with fewer than two points are dropped.
pub fn shaped_segments(x: &[f64], y: &[f64], shape: LineShape) -> Vec<Vec<(f64, f64)>> {
    let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current = Vec::new();
    for (&xv, &yv) in x.iter().zip(y) {
        if xv.is_finite() && yv.is_finite() {
            current.push((xv, yv));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() { runs.push(current); }

    runs.into_iter()
        .filter(|r| r.len() >= 2)
        .map(|r| expand_shape(&r, shape))
        .collect()
}

fn expand_shape(run: &[(f64, f64)], shape: LineShape) -> Vec<(f64, f64)> {
    if shape == LineShape::Linear { return run.to_vec(); }
    let mut out = vec![run[0]];
    for (i, w) in run.windows(2).enumerate() {
        let ((x0, y0), (x1, y1)) = (w[0], w[1]);
        match shape {
            LineShape::Linear => out.push((x1, y1)),
            LineShape::Hv => out.extend([(x1, y0), (x1, y1)]),
            LineShape::Vh => out.extend([(x0, y1), (x1, y1)]),
            LineShape::Hvh => {
                let xm = (x0 + x1) * 0.5;
                out.extend([(xm, y0), (xm, y1), (x1, y1)]);
            }
            LineShape::Vhv => {
                let ym = (y0 + y1) * 0.5;
                out.extend([(x0, ym), (x1, ym), (x1, y1)]);
            }
            LineShape::Spline => {
                // Catmull-Rom through the run, end points duplicated
                let p0 = if i == 0 { w[0] } else { run[i - 1] };
                let p3 = run.get(i + 2).copied().unwrap_or(w[1]);
                for s in 1..=SPLINE_STEPS {
                    let t = s as f64 / SPLINE_STEPS as f64;
                    out.push(catmull_rom(p0, w[0], w[1], p3, t));
                }
            }
        }
    }
    out
}

fn catmull_rom(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), t: f64) -> (f64, f64) {
    let t2 = t * t;
    let t3 = t2 * t;
    let f = |a: f64, b: f64, c: f64, d: f64| {
        0.5 * ((2.0 * b) + (-a + c) * t + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2 + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };
    (f(p0.0, p1.0, p2.0, p3.0), f(p0.1, p1.1, p2.1, p3.1))
}

/// Rendering backends. In both, background pixels are 0 and ink is
/// nonzero in the backend's `signal_channel`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Skia CPU raster: RGBA, transparent background, black stroke; the line
    /// lives in the alpha channel. Honours `anti_alias` either way.
    Skia,
    /// Plotters bitmap: RGB, black background, white stroke. Its rasteriser
    /// has no aliased mode, so `anti_alias = false` is rejected.
    Plotters,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Skia => "skia",
            Backend::Plotters => "plotters",
        }
    }

    /// Channel that carries the drawn line for this backend's rasters.
    pub fn signal_channel(&self) -> usize {
        match self {
            Backend::Skia => 3,
            Backend::Plotters => 0,
        }
    }

    pub fn render(&self, x: &[f64], y: &[f64], cfg: &RenderConfig) -> Result<Raster> {
        cfg.validate()?;
        if x.len() != y.len() {
            return Err(Error::config(format!("x has {} values but y has {}", x.len(), y.len())));
        }
        if *self == Backend::Plotters && !cfg.anti_alias {
            return Err(Error::UnsupportedConfiguration {
                backend: self.name(),
                option: "anti_alias = false".to_string(),
            });
        }
        let limits = Limits::resolve(cfg, x, y);
        let segments = shaped_segments(x, y, cfg.line_shape);
        debug!(
            "{}: {} points in {} segment(s), limits {:?}",
            self.name(),
            x.len(),
            segments.len(),
            limits
        );
        match self {
            Backend::Skia => skia_cpu::render(&segments, &limits, cfg),
            Backend::Plotters => bitmap::render(&segments, &limits, cfg),
        }
    }

    pub fn render_series(&self, series: &Series, cfg: &RenderConfig) -> Result<Raster> {
        let ys = series.values().to_f64()?;
        self.render(series.index(), &ys, cfg)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "skia" => Ok(Backend::Skia),
            "plotters" => Ok(Backend::Plotters),
            other => Err(Error::config(format!("unknown backend `{other}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_splits_segments() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [0.0, 1.0, f64::NAN, 1.0, 2.0, 3.0];
        let segs = shaped_segments(&x, &y, LineShape::Linear);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0], vec![(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(segs[1].len(), 3);
    }

    #[test]
    fn isolated_point_is_dropped() {
        let segs = shaped_segments(&[0.0, 1.0, 2.0], &[1.0, f64::NAN, 2.0], LineShape::Linear);
        assert!(segs.is_empty());
    }

    #[test]
    fn step_shapes() {
        let x = [0.0, 2.0];
        let y = [0.0, 4.0];
        assert_eq!(shaped_segments(&x, &y, LineShape::Hv)[0], vec![(0.0, 0.0), (2.0, 0.0), (2.0, 4.0)]);
        assert_eq!(shaped_segments(&x, &y, LineShape::Vh)[0], vec![(0.0, 0.0), (0.0, 4.0), (2.0, 4.0)]);
        assert_eq!(
            shaped_segments(&x, &y, LineShape::Hvh)[0],
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 4.0), (2.0, 4.0)]
        );
        assert_eq!(
            shaped_segments(&x, &y, LineShape::Vhv)[0],
            vec![(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 4.0)]
        );
    }

    #[test]
    fn spline_passes_through_samples() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 3.0, 1.0];
        let seg = &shaped_segments(&x, &y, LineShape::Spline)[0];
        assert_eq!(seg.len(), 1 + 2 * SPLINE_STEPS);
        let at = seg[SPLINE_STEPS];
        assert!((at.0 - 1.0).abs() < 1e-12 && (at.1 - 3.0).abs() < 1e-12);
    }

    #[test]
    fn limits_from_data() {
        let l = Limits::from_data(&[2.0, 3.0, 9.0], &[f64::NAN, -1.0, 4.0]);
        assert_eq!(l.x, (2.0, 9.0));
        assert_eq!(l.y, (-1.0, 4.0));
        let flat = Limits::from_data(&[0.0, 1.0], &[5.0, 5.0]);
        assert_eq!(flat.y, (5.0, 6.0));
    }

    #[test]
    fn parse_names() {
        assert_eq!("Skia".parse::<Backend>().unwrap(), Backend::Skia);
        assert_eq!("vhv".parse::<LineShape>().unwrap(), LineShape::Vhv);
        assert!("svg".parse::<Backend>().is_err());
    }
}
