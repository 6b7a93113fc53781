// Copyright 2025-2026 CEMAXECUTER LLC

pub mod file;

use crossbeam::channel::Sender;
use thiserror::Error;

/// Default upper bound on a single read.
pub const DEFAULT_CHUNK_SIZE: usize = 65536;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("read error on {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Common trait for raw byte producers.
///
/// Chunks are sent in stream order, each exactly once, with no alignment to
/// frame boundaries.
pub trait ByteSource: Send {
    /// Stream chunks into the channel until end of input, `stop()`, a closed
    /// receiver, or an error.
    fn start(&mut self, tx: Sender<Vec<u8>>) -> Result<(), SourceError>;

    /// Signal the source to stop streaming.
    fn stop(&mut self);

    fn name(&self) -> &str;
}
