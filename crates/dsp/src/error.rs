// Copyright 2025-2026 CEMAXECUTER LLC

use thiserror::Error;

/// A transported sample block that cannot be turned back into a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("sample message is {got} bytes, geometry needs {expected}")]
    LengthMismatch { expected: usize, got: usize },
}

/// Heatmap configuration that cannot produce a grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("angle bins must be even and at least 2, got {0}")]
    AngleBins(usize),
    #[error("grid needs at least one point per axis, got {x} x {y}")]
    GridPoints { x: usize, y: usize },
    #[error("{name} must be positive and finite, got {value}")]
    Extent { name: &'static str, value: f64 },
}
