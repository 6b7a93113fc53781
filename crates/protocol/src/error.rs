// Copyright 2025-2026 CEMAXECUTER LLC

//! Per-frame decode errors. None of these are fatal to the stream.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The frame ended before a declared field or payload could be read.
    #[error("truncated frame: {field} needs {needed} bytes at offset {offset}, frame is {frame_len} bytes")]
    TruncatedFrame {
        field: &'static str,
        offset: usize,
        needed: usize,
        frame_len: usize,
    },

    /// Captured antenna sample block does not match the configured geometry.
    #[error("sample block size mismatch: expected {expected} bytes, got {got}")]
    SampleBlockSizeMismatch { expected: usize, got: usize },
}
