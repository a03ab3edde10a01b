use thiserror::Error;

use crate::types::ChunkDistance;

/// Rejected raw value for a branded scalar.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ScalarError {
    #[error("max active chunks must be at least 1")]
    ZeroMaxActiveChunks,

    #[error("chunk distance must be finite and non-negative, got {0}")]
    InvalidDistance(f32),
}

/// Invalid auto-management configuration.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error(
        "activation distance {} exceeds deactivation distance {}",
        .activation_distance.get(),
        .deactivation_distance.get()
    )]
    InvalidDistance {
        activation_distance: ChunkDistance,
        deactivation_distance: ChunkDistance,
    },

    #[error(transparent)]
    Scalar(#[from] ScalarError),
}

/// Errors raised while loading configuration from RON.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to parse config RON: {0}")]
    ParseError(String),

    #[error("Invalid config: {0}")]
    Invalid(#[from] ConfigError),
}
