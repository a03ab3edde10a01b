use std::collections::HashMap;

use parking_lot::{Mutex, MutexGuard};
use strata_core::config::{AutoManagementConfig, ChunkManagerConfig};
use strata_core::error::ConfigError;
use strata_core::types::{ChunkId, ChunkLifetime, Timestamp};

use crate::clock::{Clock, SystemClock};
use crate::error::{
    ActivationError, ActivationFailure, DeactivationError, DeactivationFailure, DestructionError,
    DestructionFailure, PoolMetricsError,
};
use crate::metrics::{MemoryUsage, PerformanceMetrics, PoolMetrics};
use crate::state_machine::{
    activate_stage, create_initialized_stage, deactivate_stage, destroy_stage,
    mark_pending_destruction, update_idle_duration, DestructionReason, LifecycleStage,
};
use crate::stats::{LifecycleAccumulator, LifecycleStats};

/// Everything the pool mutates, guarded by a single lock.
struct PoolState {
    lifecycle: HashMap<ChunkId, LifecycleStage>,
    stats: LifecycleAccumulator,
    manager_config: ChunkManagerConfig,
    auto_config: AutoManagementConfig,
}

/// Occupancy tallies over live (non-destroyed) entries.
#[derive(Debug, Clone, Copy, Default)]
struct StageCounts {
    total: u32,
    active: u32,
    inactive: u32,
}

impl PoolState {
    fn active_count(&self) -> u32 {
        self.lifecycle.values().filter(|s| s.is_active()).count() as u32
    }

    fn counts(&self) -> StageCounts {
        let mut counts = StageCounts::default();
        for stage in self.lifecycle.values() {
            match stage {
                LifecycleStage::Destroyed { .. } => continue,
                LifecycleStage::Active { .. } => counts.active += 1,
                LifecycleStage::Inactive { .. } => counts.inactive += 1,
                LifecycleStage::Initialized { .. }
                | LifecycleStage::PendingDestruction { .. } => {}
            }
            counts.total += 1;
        }
        counts
    }

    fn activate(&mut self, id: ChunkId, now: Timestamp) -> Result<(), ActivationFailure> {
        let active_count = self.active_count();
        let max_active = self.auto_config.max_active_chunks();
        if active_count >= max_active.get() {
            return Err(ActivationFailure::PoolLimitReached {
                active_count,
                max_active,
            });
        }

        let current = self
            .lifecycle
            .get(&id)
            .cloned()
            .unwrap_or_else(|| create_initialized_stage(now));
        let cache_hit = matches!(current, LifecycleStage::Inactive { .. });
        let next = activate_stage(&current, now)?;

        self.lifecycle.insert(id, next);
        self.stats =
            self.stats
                .with_activation(self.manager_config.activation_cost, cache_hit, now);
        Ok(())
    }

    fn deactivate(&mut self, id: ChunkId, now: Timestamp) -> Result<(), DeactivationFailure> {
        let activated_at = match self.lifecycle.get(&id) {
            Some(LifecycleStage::Active { activated_at }) => *activated_at,
            _ => return Err(DeactivationFailure::NotActive),
        };
        let lifetime = now.since(activated_at);
        let next = deactivate_stage(&LifecycleStage::Active { activated_at }, now)?;

        self.lifecycle.insert(id, next);
        self.stats = self.stats.with_deactivation(
            lifetime,
            self.manager_config.deactivation_cost,
            now,
        );
        Ok(())
    }
}

/// Bounded set of active chunks with per-chunk lifecycle tracking.
///
/// All operations are short critical sections over one mutex, so the
/// active-count check in [`ChunkPool::activate`] and the insert that follows
/// it are atomic with respect to other callers. Timestamps are read while the
/// lock is held, so they never run backwards in lock order.
pub struct ChunkPool<C: Clock = SystemClock> {
    state: Mutex<PoolState>,
    clock: C,
}

impl Default for ChunkPool<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkPool<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(
            SystemClock,
            ChunkManagerConfig::default(),
            AutoManagementConfig::default(),
        )
    }

    pub fn with_config(
        manager_config: ChunkManagerConfig,
        auto_config: AutoManagementConfig,
    ) -> Self {
        Self::with_clock(SystemClock, manager_config, auto_config)
    }
}

impl<C: Clock> ChunkPool<C> {
    pub fn with_clock(
        clock: C,
        manager_config: ChunkManagerConfig,
        auto_config: AutoManagementConfig,
    ) -> Self {
        Self {
            state: Mutex::new(PoolState {
                lifecycle: HashMap::new(),
                stats: LifecycleAccumulator::default(),
                manager_config,
                auto_config,
            }),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Move `id` to `Active`, registering it first if unknown.
    /// Refused without any change when the pool is at its active-chunk cap.
    pub fn activate(&self, id: ChunkId) -> Result<(), ActivationError> {
        let mut state = self.lock();
        let now = self.clock.now();
        let result = state.activate(id, now);
        state.stats = state.stats.with_outcome(result.is_ok());
        drop(state);

        match result {
            Ok(()) => {
                log::debug!("Activated {id}");
                Ok(())
            }
            Err(cause) => {
                log::debug!("Rejected activation of {id}: {cause}");
                Err(ActivationError { id, cause })
            }
        }
    }

    /// Move an `Active` chunk to `Inactive`, recording how long it was active.
    pub fn deactivate(&self, id: ChunkId) -> Result<(), DeactivationError> {
        let mut state = self.lock();
        let now = self.clock.now();
        let result = state.deactivate(id, now);
        state.stats = state.stats.with_outcome(result.is_ok());
        drop(state);

        match result {
            Ok(()) => {
                log::debug!("Deactivated {id}");
                Ok(())
            }
            Err(cause) => {
                log::debug!("Rejected deactivation of {id}: {cause}");
                Err(DeactivationError { id, cause })
            }
        }
    }

    /// Schedule an `Inactive` chunk for removal.
    pub fn mark_for_destruction(
        &self,
        id: ChunkId,
        reason: DestructionReason,
    ) -> Result<(), DestructionError> {
        let mut state = self.lock();
        let now = self.clock.now();
        let current = state.lifecycle.get(&id).ok_or(DestructionError {
            id,
            cause: DestructionFailure::UnknownChunk,
        })?;
        let next = mark_pending_destruction(current, now, reason)
            .map_err(|cause| DestructionError { id, cause })?;
        state.lifecycle.insert(id, next);
        log::debug!("Marked {id} for destruction");
        Ok(())
    }

    /// Finish destroying a `PendingDestruction` chunk. The entry is kept as
    /// `Destroyed` or dropped, per `ChunkManagerConfig::retain_destroyed`.
    pub fn destroy(&self, id: ChunkId) -> Result<(), DestructionError> {
        let mut state = self.lock();
        let now = self.clock.now();
        let current = state.lifecycle.get(&id).ok_or(DestructionError {
            id,
            cause: DestructionFailure::UnknownChunk,
        })?;
        let next = destroy_stage(current, now).map_err(|cause| DestructionError { id, cause })?;
        if state.manager_config.retain_destroyed {
            state.lifecycle.insert(id, next);
        } else {
            state.lifecycle.remove(&id);
        }
        log::debug!("Destroyed {id}");
        Ok(())
    }

    /// Drop all retained `Destroyed` entries. Returns how many were removed.
    pub fn purge_destroyed(&self) -> usize {
        let mut state = self.lock();
        let before = state.lifecycle.len();
        state.lifecycle.retain(|_, stage| !stage.is_destroyed());
        before - state.lifecycle.len()
    }

    /// Recompute `idle_for` on every `Inactive` chunk from the current time.
    pub fn refresh_idle(&self) {
        let mut state = self.lock();
        let now = self.clock.now();
        for stage in state.lifecycle.values_mut() {
            if let LifecycleStage::Inactive { deactivated_at, .. } = *stage {
                *stage = update_idle_duration(stage.clone(), now.since(deactivated_at));
            }
        }
    }

    /// Ids of all `Active` chunks, sorted.
    pub fn get_active_chunks(&self) -> Vec<ChunkId> {
        let state = self.lock();
        let mut ids: Vec<ChunkId> = state
            .lifecycle
            .iter()
            .filter(|(_, stage)| stage.is_active())
            .map(|(id, _)| *id)
            .collect();
        drop(state);
        ids.sort_unstable();
        ids
    }

    /// `Inactive` chunks with their last recorded idle duration, longest idle
    /// first. Durations are as of the last [`ChunkPool::refresh_idle`].
    pub fn inactive_chunks(&self) -> Vec<(ChunkId, ChunkLifetime)> {
        let state = self.lock();
        let mut idle: Vec<(ChunkId, ChunkLifetime)> = state
            .lifecycle
            .iter()
            .filter_map(|(id, stage)| match stage {
                LifecycleStage::Inactive { idle_for, .. } => Some((*id, *idle_for)),
                _ => None,
            })
            .collect();
        drop(state);
        idle.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        idle
    }

    pub fn stage(&self, id: ChunkId) -> Option<LifecycleStage> {
        self.lock().lifecycle.get(&id).cloned()
    }

    pub fn active_count(&self) -> u32 {
        self.lock().active_count()
    }

    /// Number of tracked entries, including retained `Destroyed` ones.
    pub fn len(&self) -> usize {
        self.lock().lifecycle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().lifecycle.is_empty()
    }

    /// Occupancy and memory snapshot. Also folds the measured memory pressure
    /// into the running stats.
    pub fn get_pool_metrics(&self) -> Result<PoolMetrics, PoolMetricsError> {
        let mut state = self.lock();
        let counts = state.counts();
        let cached = counts.total - counts.active - counts.inactive;
        let memory_usage = MemoryUsage::estimate(
            state.manager_config.bytes_per_chunk,
            counts.total,
            counts.active,
            cached,
        );

        state.stats = state.stats.with_memory_pressure(memory_usage.pressure());
        let stats = state.stats.snapshot();
        drop(state);

        let performance = PerformanceMetrics {
            average_activation_time: stats.average_activation_time,
            average_deactivation_time: stats.average_deactivation_time,
            memory_pressure: stats.memory_pressure,
            cache_hit_rate: stats.cache_hit_rate,
            error_rate: stats.error_rate,
        };
        PoolMetrics::new(
            counts.total,
            counts.active,
            counts.inactive,
            memory_usage,
            performance,
        )
        .inspect_err(|e| log::warn!("Pool metrics snapshot rejected: {e}"))
    }

    /// Replace the auto-management config. Applies to later activations only;
    /// chunks already active above a lowered cap stay active.
    ///
    /// Every `AutoManagementConfig` already satisfies
    /// `activation_distance <= deactivation_distance` (its constructors and
    /// deserializer refuse inverted distances), so this only fails if that
    /// guarantee is ever loosened.
    pub fn configure(&self, config: AutoManagementConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            log::warn!("Rejected auto-management config: {e}");
            return Err(e);
        }
        self.lock().auto_config = config;
        log::info!(
            "Auto-management reconfigured: max_active={}, activation={:.1}, deactivation={:.1}, enabled={}",
            config.max_active_chunks().get(),
            config.activation_distance().get(),
            config.deactivation_distance().get(),
            config.enabled()
        );
        Ok(())
    }

    pub fn auto_config(&self) -> AutoManagementConfig {
        self.lock().auto_config
    }

    pub fn manager_config(&self) -> ChunkManagerConfig {
        self.lock().manager_config
    }

    pub fn snapshot_stats(&self) -> LifecycleStats {
        self.lock().stats.snapshot()
    }
}
