use serde::Serialize;
use strata_core::types::{ChunkLifetime, ResourceUsagePercent, Timestamp};

/// Running totals for the pool, updated on every transition.
///
/// Replaced wholesale on each update (`with_*` methods consume and return),
/// so a reader holding a copy never sees a half-applied change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LifecycleAccumulator {
    pub total_activations: u64,
    pub total_deactivations: u64,
    pub accumulated_lifetime: ChunkLifetime,
    pub activation_duration_sum: ChunkLifetime,
    pub deactivation_duration_sum: ChunkLifetime,
    pub memory_pressure: ResourceUsagePercent,
    pub cache_hit_rate: ResourceUsagePercent,
    pub error_rate: ResourceUsagePercent,
    pub last_updated: Timestamp,
    cache_hits: u64,
    cache_lookups: u64,
    failures: u64,
    operations: u64,
}

impl LifecycleAccumulator {
    /// Record a successful activation. `cache_hit` is true when the chunk was
    /// still resident (reactivated from `Inactive`).
    #[must_use]
    pub fn with_activation(self, cost: ChunkLifetime, cache_hit: bool, now: Timestamp) -> Self {
        let cache_hits = self.cache_hits + u64::from(cache_hit);
        let cache_lookups = self.cache_lookups + 1;
        Self {
            total_activations: self.total_activations + 1,
            activation_duration_sum: self.activation_duration_sum.saturating_add(cost),
            cache_hits,
            cache_lookups,
            cache_hit_rate: ResourceUsagePercent::ratio(cache_hits, cache_lookups),
            last_updated: now,
            ..self
        }
    }

    /// Record a successful deactivation of a chunk that was active for `lifetime`.
    #[must_use]
    pub fn with_deactivation(
        self,
        lifetime: ChunkLifetime,
        cost: ChunkLifetime,
        now: Timestamp,
    ) -> Self {
        Self {
            total_deactivations: self.total_deactivations + 1,
            accumulated_lifetime: self.accumulated_lifetime.saturating_add(lifetime),
            deactivation_duration_sum: self.deactivation_duration_sum.saturating_add(cost),
            last_updated: now,
            ..self
        }
    }

    /// Count one activate/deactivate request toward the error rate.
    #[must_use]
    pub fn with_outcome(self, succeeded: bool) -> Self {
        let operations = self.operations + 1;
        let failures = self.failures + u64::from(!succeeded);
        Self {
            operations,
            failures,
            error_rate: ResourceUsagePercent::ratio(failures, operations),
            ..self
        }
    }

    /// Replace the memory pressure with the latest measured value.
    #[must_use]
    pub fn with_memory_pressure(self, pressure: ResourceUsagePercent) -> Self {
        Self {
            memory_pressure: pressure,
            ..self
        }
    }

    pub fn snapshot(&self) -> LifecycleStats {
        LifecycleStats {
            total_activations: self.total_activations,
            total_deactivations: self.total_deactivations,
            average_lifetime: self.accumulated_lifetime.average_over(self.total_deactivations),
            average_activation_time: self
                .activation_duration_sum
                .average_over(self.total_activations),
            average_deactivation_time: self
                .deactivation_duration_sum
                .average_over(self.total_deactivations),
            memory_pressure: self.memory_pressure,
            memory_efficiency: self.memory_pressure.complement(),
            cache_hit_rate: self.cache_hit_rate,
            error_rate: self.error_rate,
            last_updated: self.last_updated,
        }
    }
}

/// Read-only view of the pool's lifecycle statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LifecycleStats {
    pub total_activations: u64,
    pub total_deactivations: u64,
    /// Mean time a chunk spent active, over completed activations.
    pub average_lifetime: ChunkLifetime,
    pub average_activation_time: ChunkLifetime,
    pub average_deactivation_time: ChunkLifetime,
    pub memory_pressure: ResourceUsagePercent,
    /// `1 - memory_pressure`.
    pub memory_efficiency: ResourceUsagePercent,
    pub cache_hit_rate: ResourceUsagePercent,
    pub error_rate: ResourceUsagePercent,
    pub last_updated: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_accumulator_snapshot() {
        let stats = LifecycleAccumulator::default().snapshot();
        assert_eq!(stats.total_activations, 0);
        assert_eq!(stats.average_lifetime, ChunkLifetime::ZERO);
        assert_eq!(stats.cache_hit_rate, ResourceUsagePercent::ZERO);
        assert_eq!(stats.error_rate, ResourceUsagePercent::ZERO);
        assert_eq!(stats.memory_efficiency, ResourceUsagePercent::FULL);
    }

    #[test]
    fn test_average_lifetime_over_deactivations() {
        let acc = LifecycleAccumulator::default()
            .with_activation(ChunkLifetime(16), false, Timestamp(0))
            .with_activation(ChunkLifetime(16), false, Timestamp(0))
            .with_deactivation(ChunkLifetime(100), ChunkLifetime(8), Timestamp(100))
            .with_deactivation(ChunkLifetime(300), ChunkLifetime(8), Timestamp(300));

        let stats = acc.snapshot();
        assert_eq!(stats.total_activations, 2);
        assert_eq!(stats.total_deactivations, 2);
        assert_eq!(stats.average_lifetime, ChunkLifetime(200));
        assert_eq!(stats.average_activation_time, ChunkLifetime(16));
        assert_eq!(stats.average_deactivation_time, ChunkLifetime(8));
        assert_eq!(stats.last_updated, Timestamp(300));
    }

    #[test]
    fn test_cache_hit_rate_counts_reactivations() {
        let acc = LifecycleAccumulator::default()
            .with_activation(ChunkLifetime(1), false, Timestamp(0))
            .with_activation(ChunkLifetime(1), true, Timestamp(1))
            .with_activation(ChunkLifetime(1), true, Timestamp(2))
            .with_activation(ChunkLifetime(1), false, Timestamp(3));
        assert_eq!(acc.snapshot().cache_hit_rate.value(), 0.5);
    }

    #[test]
    fn test_error_rate_tracks_failed_requests() {
        let acc = LifecycleAccumulator::default()
            .with_outcome(true)
            .with_outcome(false)
            .with_outcome(true)
            .with_outcome(true);
        assert_eq!(acc.snapshot().error_rate.value(), 0.25);
    }

    #[test]
    fn test_memory_efficiency_is_complement_of_pressure() {
        let acc = LifecycleAccumulator::default()
            .with_memory_pressure(ResourceUsagePercent::new(0.3));
        let stats = acc.snapshot();
        assert!((stats.memory_efficiency.value() - 0.7).abs() < 1e-12);

        // Folding the same pressure again changes nothing
        assert_eq!(
            acc.with_memory_pressure(ResourceUsagePercent::new(0.3)),
            acc
        );
    }
}
