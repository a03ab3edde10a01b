use strata_core::types::{ChunkId, MaxActiveChunks};
use thiserror::Error;

use crate::metrics::MemoryUsage;
use crate::state_machine::LifecycleStage;

/// Why a single activation was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActivationFailure {
    #[error("pool limit reached ({active_count} of {} chunks active)", .max_active.get())]
    PoolLimitReached {
        active_count: u32,
        max_active: MaxActiveChunks,
    },

    #[error("chunk is already active")]
    AlreadyActive,

    #[error("cannot activate a chunk that is {stage}")]
    LifecycleViolation { stage: LifecycleStage },
}

/// Why a single deactivation was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeactivationFailure {
    #[error("chunk is not active")]
    NotActive,

    #[error("cannot deactivate a chunk that is {stage}")]
    LifecycleViolation { stage: LifecycleStage },
}

/// Why a destruction step was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DestructionFailure {
    #[error("chunk is not tracked by the pool")]
    UnknownChunk,

    #[error("cannot advance destruction of a chunk that is {stage}")]
    LifecycleViolation { stage: LifecycleStage },
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to activate {id}: {cause}")]
pub struct ActivationError {
    pub id: ChunkId,
    pub cause: ActivationFailure,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to deactivate {id}: {cause}")]
pub struct DeactivationError {
    pub id: ChunkId,
    pub cause: DeactivationFailure,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("failed to destroy {id}: {cause}")]
pub struct DestructionError {
    pub id: ChunkId,
    pub cause: DestructionFailure,
}

/// Inconsistent inputs to a `PoolMetrics` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolMetricsError {
    #[error("chunk counts inconsistent: total {total} < active {active} + inactive {inactive}")]
    InvalidCounts { total: u32, active: u32, inactive: u32 },

    #[error("memory usage inconsistent: {invalid_usage:?}")]
    NegativeMemory { invalid_usage: MemoryUsage },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleStatsError {
    #[error("recorded {deactivations} deactivations but only {activations} activations")]
    InconsistentCounts { activations: u64, deactivations: u64 },
}
