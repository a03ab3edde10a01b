use strata_core::config::AutoManagementConfig;
use strata_core::error::ConfigError;
use strata_core::types::ChunkId;

use crate::clock::Clock;
use crate::error::{ActivationError, DeactivationError, LifecycleStatsError, PoolMetricsError};
use crate::metrics::PoolMetrics;
use crate::pool::ChunkPool;
use crate::stats::LifecycleStats;

/// Port through which orchestration code drives chunk lifecycles.
pub trait ChunkLifecycleProvider: Send + Sync {
    fn activate_chunk(&self, id: ChunkId) -> Result<(), ActivationError>;

    fn deactivate_chunk(&self, id: ChunkId) -> Result<(), DeactivationError>;

    fn get_active_chunks(&self) -> Vec<ChunkId>;

    fn get_pool_metrics(&self) -> Result<PoolMetrics, PoolMetricsError>;

    fn configure_auto_management(&self, config: AutoManagementConfig) -> Result<(), ConfigError>;

    fn get_lifecycle_stats(&self) -> Result<LifecycleStats, LifecycleStatsError>;
}

impl<C: Clock> ChunkLifecycleProvider for ChunkPool<C> {
    fn activate_chunk(&self, id: ChunkId) -> Result<(), ActivationError> {
        self.activate(id)
    }

    fn deactivate_chunk(&self, id: ChunkId) -> Result<(), DeactivationError> {
        self.deactivate(id)
    }

    fn get_active_chunks(&self) -> Vec<ChunkId> {
        ChunkPool::<C>::get_active_chunks(self)
    }

    fn get_pool_metrics(&self) -> Result<PoolMetrics, PoolMetricsError> {
        ChunkPool::<C>::get_pool_metrics(self)
    }

    fn configure_auto_management(&self, config: AutoManagementConfig) -> Result<(), ConfigError> {
        self.configure(config)
    }

    fn get_lifecycle_stats(&self) -> Result<LifecycleStats, LifecycleStatsError> {
        validate_stats(self.snapshot_stats())
    }
}

/// Every deactivation must follow an activation.
fn validate_stats(stats: LifecycleStats) -> Result<LifecycleStats, LifecycleStatsError> {
    if stats.total_deactivations > stats.total_activations {
        return Err(LifecycleStatsError::InconsistentCounts {
            activations: stats.total_activations,
            deactivations: stats.total_deactivations,
        });
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ActivationFailure;
    use crate::stats::LifecycleAccumulator;
    use std::sync::Arc;
    use strata_core::config::ChunkManagerConfig;
    use strata_core::types::{ChunkLifetime, MaxActiveChunks, Timestamp};

    fn provider(max: u32) -> Arc<dyn ChunkLifecycleProvider> {
        let auto = AutoManagementConfig::default()
            .with_max_active_chunks(MaxActiveChunks::new(max).expect("non-zero"));
        Arc::new(ChunkPool::with_clock(
            ManualClock::new(Timestamp(0)),
            ChunkManagerConfig::default(),
            auto,
        ))
    }

    #[test]
    fn test_provider_drives_pool() {
        let p = provider(1);
        let a = ChunkId::new(0, 0, 0);
        let b = ChunkId::new(1, 0, 0);

        p.activate_chunk(a).expect("activate a");
        let err = p.activate_chunk(b).expect_err("pool full");
        assert!(matches!(
            err.cause,
            ActivationFailure::PoolLimitReached { active_count: 1, .. }
        ));

        let relaxed = AutoManagementConfig::default()
            .with_max_active_chunks(MaxActiveChunks::new(3).expect("non-zero"));
        p.configure_auto_management(relaxed).expect("configure");
        p.activate_chunk(b).expect("activate b");
        assert_eq!(p.get_active_chunks(), vec![a, b]);

        p.deactivate_chunk(a).expect("deactivate a");
        let metrics = p.get_pool_metrics().expect("metrics");
        assert_eq!(metrics.active_chunks(), 1);
        assert_eq!(metrics.inactive_chunks(), 1);

        let stats = p.get_lifecycle_stats().expect("stats");
        assert_eq!(stats.total_activations, 2);
        assert_eq!(stats.total_deactivations, 1);
    }

    #[test]
    fn test_validate_stats_rejects_impossible_counts() {
        let stats = LifecycleAccumulator::default()
            .with_deactivation(ChunkLifetime(1), ChunkLifetime(1), Timestamp(0))
            .snapshot();
        assert_eq!(
            validate_stats(stats),
            Err(LifecycleStatsError::InconsistentCounts {
                activations: 0,
                deactivations: 1,
            })
        );
    }
}
