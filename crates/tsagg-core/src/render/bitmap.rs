// File: crates/tsagg-core/src/render/bitmap.rs
// Summary: Plotters in-memory bitmap backend (RGB), one LineSeries per contiguous segment.

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

use super::{Limits, RenderConfig};
use crate::error::{Error, Result};
use crate::raster::{from_raw, Raster};

fn draw_err<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> Error {
    Error::Render(e.to_string())
}

pub(super) fn render(segments: &[Vec<(f64, f64)>], limits: &Limits, cfg: &RenderConfig) -> Result<Raster> {
    let mut buf = vec![0u8; cfg.width as usize * cfg.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (cfg.width, cfg.height)).into_drawing_area();
        root.fill(&BLACK).map_err(draw_err)?;

        // no margins, no label areas: the coordinate range covers the canvas
        let mut chart = ChartBuilder::on(&root)
            .margin(0)
            .build_cartesian_2d(limits.x.0..limits.x.1, limits.y.0..limits.y.1)
            .map_err(draw_err)?;

        let style = ShapeStyle {
            color: WHITE.to_rgba(),
            filled: false,
            stroke_width: cfg.line_width_px.round().max(1.0) as u32,
        };
        for seg in segments {
            chart
                .draw_series(LineSeries::new(seg.iter().copied(), style))
                .map_err(draw_err)?;
        }
        root.present().map_err(draw_err)?;
    }
    from_raw(cfg.width, cfg.height, 3, buf)
}
