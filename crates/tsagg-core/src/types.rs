// File: crates/tsagg-core/src/types.rs
// Summary: Shared rendering defaults (canvas size, density, stroke).

/// Default canvas width in pixels.
pub const WIDTH: u32 = 800;
/// Default canvas height in pixels.
pub const HEIGHT: u32 = 250;
/// Default rendering density (dots per inch).
pub const DPI: f64 = 96.0;
/// Default stroke width in pixels.
pub const LINE_WIDTH_PX: f64 = 1.0;

