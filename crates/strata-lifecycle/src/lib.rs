//! Chunk lifecycle pool: admission control over active chunks, a validated
//! per-chunk lifecycle state machine, and pool-wide statistics.

pub mod clock;
pub mod error;
pub mod limits;
pub mod metrics;
pub mod pool;
pub mod provider;
pub mod state_machine;
pub mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{
    ActivationError, ActivationFailure, DeactivationError, DeactivationFailure, DestructionError,
    DestructionFailure, LifecycleStatsError, PoolMetricsError,
};
pub use limits::SystemLoad;
pub use metrics::{MemoryUsage, PerformanceMetrics, PoolMetrics};
pub use pool::ChunkPool;
pub use provider::ChunkLifecycleProvider;
pub use state_machine::{DestructionReason, LifecycleStage, StageKind};
pub use stats::{LifecycleAccumulator, LifecycleStats};
