// File: crates/tsagg-core/src/render/skia_cpu.rs
// Summary: Headless Skia CPU raster backend; draws the line edge to edge and reads back RGBA pixels.

use skia_safe as skia;

use super::{Limits, RenderConfig};
use crate::error::{Error, Result};
use crate::raster::{from_raw, Raster};

pub(super) fn render(segments: &[Vec<(f64, f64)>], limits: &Limits, cfg: &RenderConfig) -> Result<Raster> {
    let (w, h) = (cfg.width as i32, cfg.height as i32);
    let surface_info = skia::ImageInfo::new((w, h), skia::ColorType::RGBA8888, skia::AlphaType::Premul, None);
    let mut surface = skia::surfaces::raster(&surface_info, None, None)
        .ok_or_else(|| Error::Render("failed to create raster surface".to_string()))?;

    {
        let canvas = surface.canvas();
        canvas.clear(skia::Color::TRANSPARENT);

        // The axes span the whole canvas: limits map to the pixel edges.
        let (x0, x1) = limits.x;
        let (y0, y1) = limits.y;
        let sx = |x: f64| -> f32 { ((x - x0) / (x1 - x0) * cfg.width as f64) as f32 };
        let sy = |y: f64| -> f32 { (cfg.height as f64 - (y - y0) / (y1 - y0) * cfg.height as f64) as f32 };

        let mut path = skia::Path::new();
        for seg in segments {
            let (fx, fy) = seg[0];
            path.move_to((sx(fx), sy(fy)));
            for &(x, y) in seg.iter().skip(1) {
                path.line_to((sx(x), sy(y)));
            }
        }

        let mut stroke = skia::Paint::default();
        stroke.set_anti_alias(cfg.anti_alias);
        stroke.set_style(skia::paint::Style::Stroke);
        stroke.set_stroke_width(cfg.line_width_px as f32);
        stroke.set_stroke_cap(skia::paint::Cap::Square);
        stroke.set_stroke_join(skia::paint::Join::Round);
        stroke.set_color(skia::Color::BLACK);

        canvas.draw_path(&path, &stroke);
    }

    let read_info = skia::ImageInfo::new((w, h), skia::ColorType::RGBA8888, skia::AlphaType::Unpremul, None);
    let row_bytes = cfg.width as usize * 4;
    let mut pixels = vec![0u8; row_bytes * cfg.height as usize];
    if !surface.read_pixels(&read_info, &mut pixels, row_bytes, (0, 0)) {
        return Err(Error::Render("failed to read back surface pixels".to_string()));
    }
    from_raw(cfg.width, cfg.height, 4, pixels)
}
