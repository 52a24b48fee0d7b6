// File: crates/tsagg-core/src/error.rs
// Summary: Error taxonomy shared by aggregation, rendering, scoring and storage.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad parameters (non-positive output size, even window, unsorted index, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Series values that have no numeric encoding.
    #[error("unsupported value type `{0}`; expected float, int, uint, bool or category")]
    UnsupportedType(&'static str),

    /// Two rasters (or a raster and a mask) that cannot be compared pixel by pixel.
    #[error("shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("channel {channel} out of range for raster with {channels} channel(s)")]
    InvalidChannel { channel: usize, channels: usize },

    /// A backend that cannot honour a requested rendering option.
    #[error("{backend} backend does not support {option}")]
    UnsupportedConfiguration { backend: &'static str, option: String },

    #[error("unknown environment: hostname `{0}` has no path configuration")]
    UnknownEnvironment(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
