// Copyright 2025-2026 CEMAXECUTER LLC

pub mod config;
pub mod pipeline;
pub mod stream;

pub use config::Config;
pub use stream::{DecodedFrame, FrameError, IngestOutput, PipelineStats, StreamPipeline};
