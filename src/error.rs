//! Configuration errors
//!
//! Raised only while building a roller. Runtime operations never fail: bad
//! lookups return `None` and rejected rolls return `false`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Amount of animation sources ({found}) must match the dice capacity ({expected})")]
    AnimationSourceCount { expected: usize, found: usize },

    #[error("Amount of rigid bodies ({found}) must match the dice capacity ({expected})")]
    BodyCount { expected: usize, found: usize },

    #[error("Amount of decorative dice ({found}) must match the dice capacity ({expected})")]
    DecorationCount { expected: usize, found: usize },

    #[error("Invalid force range {min}..{max}")]
    InvalidForceRange { min: f32, max: f32 },

    #[error("Animation speed must be positive, got {0}")]
    InvalidAnimationSpeed(f32),

    #[error("Die half extent must be positive, got {0}")]
    InvalidHalfExtent(f32),

    #[error("Settle timeout must be positive, got {0}")]
    InvalidSettleTimeout(f32),

    #[error("Face table is empty")]
    EmptyFaceTable,

    #[error("Face table has {0} faces, at most 255 can be labelled")]
    TooManyFaces(usize),

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}
