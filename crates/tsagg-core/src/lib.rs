// File: crates/tsagg-core/src/lib.rs
// Summary: Core library entry point; exports aggregation, rendering and scoring for the visual-fidelity benchmark.

pub mod error;
pub mod series;
pub mod types;
pub mod downsample;
pub mod gaps;
pub mod aggregator;
pub mod convolve;
pub mod ssim;
pub mod raster;
pub mod metrics;
pub mod render;
pub mod paths;
pub mod store;

pub use error::{Error, Result};
pub use series::{Series, Values};
pub use gaps::{GapConfig, GapMarker};
pub use aggregator::{Aggregator, Algorithm, DEFAULT_MINMAX_RATIO};
pub use downsample::{lttb_indices, minmax_indices};
pub use raster::Raster;
pub use metrics::{MetricRecord, ScoreConfig, Scorer};
pub use render::{Backend, LineShape, Limits, RenderConfig};
pub use paths::PathConfig;
pub use store::{DataKey, FigureKey, MetricTable, ResultKey, SeriesKind};
