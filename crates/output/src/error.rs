// Copyright 2025-2026 CEMAXECUTER LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    /// The receiving side of an in-process channel is gone.
    #[error("subscriber disconnected")]
    Disconnected,
    #[error("zmq {context}: {message}")]
    Transport { context: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message truncated: need {needed} bytes, have {got}")]
    Truncated { needed: usize, got: usize },
    #[error("message has {extra} trailing bytes")]
    TrailingBytes { extra: usize },
}
