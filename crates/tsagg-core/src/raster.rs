// File: crates/tsagg-core/src/raster.rs
// Summary: Raster type (height x width x channel, u8) and PNG encode/decode via the image crate.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use log::info;
use ndarray::{Array3, ArrayView2, Axis};

use crate::error::{Error, Result};

/// Pixel buffer shaped `(height, width, channels)`.
pub type Raster = Array3<u8>;

/// One channel of `raster` as a 2-D view.
pub fn channel(raster: &Raster, channel: usize) -> Result<ArrayView2<'_, u8>> {
    let channels = raster.len_of(Axis(2));
    if channel >= channels {
        return Err(Error::InvalidChannel { channel, channels });
    }
    Ok(raster.index_axis(Axis(2), channel))
}

pub(crate) fn from_raw(width: u32, height: u32, channels: usize, raw: Vec<u8>) -> Result<Raster> {
    Array3::from_shape_vec((height as usize, width as usize, channels), raw)
        .map_err(|e| Error::Render(format!("pixel buffer has unexpected size: {e}")))
}

/// Encode as PNG bytes (3 channels -> RGB, 4 channels -> RGBA).
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>> {
    let (h, w, c) = raster.dim();
    let raw: Vec<u8> = raster.iter().copied().collect();
    let img = match c {
        3 => RgbImage::from_raw(w as u32, h as u32, raw).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(w as u32, h as u32, raw).map(DynamicImage::ImageRgba8),
        _ => None,
    }
    .ok_or_else(|| Error::config(format!("cannot encode a raster with {c} channel(s) as PNG")))?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Decode PNG bytes, keeping RGB as 3 channels and everything else as RGBA.
pub fn decode_png(bytes: &[u8]) -> Result<Raster> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    match img {
        DynamicImage::ImageRgb8(rgb) => {
            let (w, h) = rgb.dimensions();
            from_raw(w, h, 3, rgb.into_raw())
        }
        other => {
            let rgba = other.to_rgba8();
            let (w, h) = rgba.dimensions();
            from_raw(w, h, 4, rgba.into_raw())
        }
    }
}

pub fn save_png(raster: &Raster, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_png(raster)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    info!("wrote {}", path.display());
    Ok(())
}

pub fn load_png(path: impl AsRef<Path>) -> Result<Raster> {
    let bytes = std::fs::read(path)?;
    decode_png(&bytes)
}
