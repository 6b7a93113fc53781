// Copyright 2025-2026 CEMAXECUTER LLC

pub mod error;
pub mod fft;
pub mod heatmap;
pub mod samples;

pub use error::{ConfigError, WireError};
pub use heatmap::{GridConfig, HeatmapGrid, HeatmapTransform};
pub use samples::{ComplexSampleMatrix, SampleDecoder};
