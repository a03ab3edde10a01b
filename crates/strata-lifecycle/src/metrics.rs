use serde::Serialize;
use strata_core::types::{ChunkLifetime, MemoryBytes, ResourceUsagePercent};

use crate::error::PoolMetricsError;

/// Estimated memory held by the pool's chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemoryUsage {
    pub total: MemoryBytes,
    pub active: MemoryBytes,
    pub cached: MemoryBytes,
}

impl MemoryUsage {
    /// Footprint of `total` tracked chunks at `per_chunk` bytes each, of
    /// which `active` are active and `cached` are neither active nor
    /// inactive. When the total saturates at `u64::MAX` the parts are
    /// clamped so that `active + cached <= total` still holds.
    pub fn estimate(per_chunk: MemoryBytes, total: u32, active: u32, cached: u32) -> Self {
        let total = per_chunk.times(total);
        let active = MemoryBytes(per_chunk.times(active).get().min(total.get()));
        let headroom = total.get() - active.get();
        let cached = MemoryBytes(per_chunk.times(cached).get().min(headroom));
        Self {
            total,
            active,
            cached,
        }
    }

    /// `(active + cached) / total`, zero for an empty pool.
    pub fn pressure(&self) -> ResourceUsagePercent {
        let used = self.active.saturating_add(self.cached);
        ResourceUsagePercent::ratio(used.get(), self.total.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PerformanceMetrics {
    pub average_activation_time: ChunkLifetime,
    pub average_deactivation_time: ChunkLifetime,
    pub memory_pressure: ResourceUsagePercent,
    pub cache_hit_rate: ResourceUsagePercent,
    pub error_rate: ResourceUsagePercent,
}

/// Consistency-checked snapshot of pool occupancy and memory.
///
/// Built only through [`PoolMetrics::new`]; every instance satisfies
/// `total >= active + inactive` for both chunk counts and memory, and its
/// memory pressure is derived from its own memory usage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolMetrics {
    total_chunks: u32,
    active_chunks: u32,
    inactive_chunks: u32,
    cached_chunks: u32,
    memory_usage: MemoryUsage,
    performance_metrics: PerformanceMetrics,
}

impl PoolMetrics {
    /// Validate and assemble a snapshot. Any caller-supplied
    /// `performance.memory_pressure` is discarded and recomputed from
    /// `memory_usage`.
    pub fn new(
        total_chunks: u32,
        active_chunks: u32,
        inactive_chunks: u32,
        memory_usage: MemoryUsage,
        performance: PerformanceMetrics,
    ) -> Result<Self, PoolMetricsError> {
        let accounted = u64::from(active_chunks) + u64::from(inactive_chunks);
        if u64::from(total_chunks) < accounted {
            return Err(PoolMetricsError::InvalidCounts {
                total: total_chunks,
                active: active_chunks,
                inactive: inactive_chunks,
            });
        }

        let used = u128::from(memory_usage.active.get()) + u128::from(memory_usage.cached.get());
        if u128::from(memory_usage.total.get()) < used {
            return Err(PoolMetricsError::NegativeMemory {
                invalid_usage: memory_usage,
            });
        }

        Ok(Self {
            total_chunks,
            active_chunks,
            inactive_chunks,
            cached_chunks: total_chunks - active_chunks - inactive_chunks,
            memory_usage,
            performance_metrics: PerformanceMetrics {
                memory_pressure: memory_usage.pressure(),
                ..performance
            },
        })
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    pub fn active_chunks(&self) -> u32 {
        self.active_chunks
    }

    pub fn inactive_chunks(&self) -> u32 {
        self.inactive_chunks
    }

    /// Tracked chunks that are neither active nor inactive
    /// (registered-only or awaiting destruction).
    pub fn cached_chunks(&self) -> u32 {
        self.cached_chunks
    }

    pub fn memory_usage(&self) -> MemoryUsage {
        self.memory_usage
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        self.performance_metrics
    }

    pub fn memory_pressure(&self) -> ResourceUsagePercent {
        self.performance_metrics.memory_pressure
    }
}
