//! Advisory resource policy. The pool never calls these itself; an external
//! control loop consults them before issuing `activate` or `configure` calls.

use serde::{Deserialize, Serialize};
use strata_core::config::AutoManagementConfig;
use strata_core::constants::MIN_TARGET_ACTIVE_FRACTION;
use strata_core::types::{MaxActiveChunks, ResourceUsagePercent};

/// Point-in-time host load, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemLoad {
    pub cpu: ResourceUsagePercent,
    pub memory: ResourceUsagePercent,
}

impl SystemLoad {
    pub fn new(cpu: f64, memory: f64) -> Self {
        Self {
            cpu: ResourceUsagePercent::new(cpu),
            memory: ResourceUsagePercent::new(memory),
        }
    }
}

/// Hold off new activations: the pool is at its cap or memory is over threshold.
pub fn should_throttle_activations(
    config: &AutoManagementConfig,
    load: &SystemLoad,
    active_chunks: u32,
) -> bool {
    active_chunks >= config.max_active_chunks().get() || load.memory >= config.memory_threshold()
}

/// Start evicting: auto-management is on and the pool is over its cap or
/// memory is over threshold.
pub fn should_evict_chunks(
    config: &AutoManagementConfig,
    load: &SystemLoad,
    active_chunks: u32,
) -> bool {
    config.enabled()
        && (active_chunks > config.max_active_chunks().get()
            || load.memory >= config.memory_threshold())
}

pub fn is_cpu_overloaded(config: &AutoManagementConfig, load: &SystemLoad) -> bool {
    load.cpu >= config.performance_threshold()
}

/// Active-chunk budget adjusted for memory load.
///
/// At or below the memory threshold the configured maximum is returned.
/// Above it the maximum shrinks in proportion to the overshoot
/// (`max * threshold / memory`), never below 20% of the maximum or 1.
pub fn compute_target_active_chunks(
    config: &AutoManagementConfig,
    load: &SystemLoad,
) -> MaxActiveChunks {
    let max = config.max_active_chunks();
    let threshold = config.memory_threshold().value();
    let memory = load.memory.value();

    let factor = if threshold <= 0.0 {
        // Any usage saturates a zero budget
        MIN_TARGET_ACTIVE_FRACTION
    } else {
        let ratio = memory / threshold;
        if ratio <= 1.0 {
            1.0
        } else {
            (1.0 / ratio).max(MIN_TARGET_ACTIVE_FRACTION)
        }
    };

    let floor = (max.get() as f64 * MIN_TARGET_ACTIVE_FRACTION).floor() as u32;
    let scaled = (max.get() as f64 * factor).floor() as u32;
    MaxActiveChunks::new(scaled.max(floor).min(max.get())).unwrap_or(MaxActiveChunks::ONE)
}

/// Mean of the current pressure and the observed memory load.
pub fn blend_memory_pressure(
    current: ResourceUsagePercent,
    load: &SystemLoad,
) -> ResourceUsagePercent {
    ResourceUsagePercent::new((current.value() + load.memory.value()) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_max(max: u32) -> AutoManagementConfig {
        AutoManagementConfig::default()
            .with_max_active_chunks(MaxActiveChunks::new(max).expect("non-zero"))
            .with_memory_threshold(ResourceUsagePercent::new(0.8))
    }

    #[test]
    fn test_throttle_on_count_or_memory() {
        let config = config_with_max(10);
        let calm = SystemLoad::new(0.1, 0.2);
        assert!(!should_throttle_activations(&config, &calm, 9));
        assert!(should_throttle_activations(&config, &calm, 10));

        let hot = SystemLoad::new(0.1, 0.8);
        assert!(should_throttle_activations(&config, &hot, 0));
    }

    #[test]
    fn test_throttle_ignores_enabled_flag() {
        let config = config_with_max(10).with_enabled(false);
        assert!(should_throttle_activations(
            &config,
            &SystemLoad::default(),
            10
        ));
    }

    #[test]
    fn test_evict_requires_enabled_and_overshoot() {
        let config = config_with_max(10);
        let calm = SystemLoad::new(0.0, 0.1);
        // At the cap is not over it
        assert!(!should_evict_chunks(&config, &calm, 10));
        assert!(should_evict_chunks(&config, &calm, 11));
        assert!(should_evict_chunks(&config, &SystemLoad::new(0.0, 0.9), 0));

        let disabled = config.with_enabled(false);
        assert!(!should_evict_chunks(&disabled, &calm, 11));
        assert!(!should_evict_chunks(&disabled, &SystemLoad::new(0.0, 1.0), 0));
    }

    #[test]
    fn test_cpu_overload_uses_performance_threshold() {
        let config =
            config_with_max(10).with_performance_threshold(ResourceUsagePercent::new(0.75));
        assert!(!is_cpu_overloaded(&config, &SystemLoad::new(0.5, 0.0)));
        assert!(is_cpu_overloaded(&config, &SystemLoad::new(0.75, 0.0)));
    }

    #[test]
    fn test_target_unchanged_below_threshold() {
        let config = config_with_max(100);
        let target = compute_target_active_chunks(&config, &SystemLoad::new(0.0, 0.5));
        assert_eq!(target.get(), 100);
        let target = compute_target_active_chunks(&config, &SystemLoad::new(0.0, 0.8));
        assert_eq!(target.get(), 100);
    }

    #[test]
    fn test_target_scales_down_above_threshold() {
        let config = AutoManagementConfig::default()
            .with_max_active_chunks(MaxActiveChunks::new(100).expect("non-zero"))
            .with_memory_threshold(ResourceUsagePercent::new(0.5));
        // memory / threshold = 2 -> half the budget
        let target = compute_target_active_chunks(&config, &SystemLoad::new(0.0, 1.0));
        assert_eq!(target.get(), 50);
    }

    #[test]
    fn test_target_floors_at_fifth_of_max() {
        let config = AutoManagementConfig::default()
            .with_max_active_chunks(MaxActiveChunks::new(100).expect("non-zero"))
            .with_memory_threshold(ResourceUsagePercent::new(0.1));
        let target = compute_target_active_chunks(&config, &SystemLoad::new(0.0, 1.0));
        assert_eq!(target.get(), 20);

        let zero_threshold = config.with_memory_threshold(ResourceUsagePercent::ZERO);
        let target = compute_target_active_chunks(&zero_threshold, &SystemLoad::new(0.0, 0.0));
        assert_eq!(target.get(), 20);
    }

    #[test]
    fn test_target_never_below_one() {
        let config = config_with_max(3).with_memory_threshold(ResourceUsagePercent::new(0.1));
        let target = compute_target_active_chunks(&config, &SystemLoad::new(0.0, 1.0));
        assert_eq!(target, MaxActiveChunks::ONE);
    }

    #[test]
    fn test_blend_memory_pressure_is_mean() {
        let blended = blend_memory_pressure(
            ResourceUsagePercent::new(0.4),
            &SystemLoad::new(0.0, 0.5),
        );
        assert!((blended.value() - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_blend_memory_pressure_stays_in_unit_range() {
        for i in 0..=20 {
            for j in 0..=20 {
                let current = ResourceUsagePercent::new(i as f64 / 20.0);
                let load = SystemLoad::new(0.0, j as f64 / 20.0);
                let v = blend_memory_pressure(current, &load).value();
                assert!((0.0..=1.0).contains(&v), "blend({i}, {j}) = {v}");
                let lo = current.value().min(load.memory.value());
                let hi = current.value().max(load.memory.value());
                assert!(v >= lo - 1e-12 && v <= hi + 1e-12);
            }
        }
    }
}
