use std::time::Instant;

use strata_core::config::ChunkManagerConfig;
use strata_core::error::ConfigError;
use strata_core::types::{ChunkLifetime, ResourceUsagePercent, Timestamp};
use strata_lifecycle::limits::{blend_memory_pressure, SystemLoad};
use strata_lifecycle::{ChunkPool, ManualClock};

use crate::scenes::SceneConfig;
use crate::streaming::StreamingPolicy;

/// Simulated time between streaming updates.
pub const TICK: ChunkLifetime = ChunkLifetime(16);

/// Timing data for a single benchmark run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TimingSeries {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of a single scene benchmark.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkResult {
    pub scene_name: String,
    pub tick_count: u32,
    pub peak_active: u32,
    pub total_activations: u64,
    pub total_deactivations: u64,
    pub rejected: u32,
    pub evicted: u32,
    pub throttled_ticks: u32,
    pub cache_hit_rate: f64,
    pub error_rate: f64,
    pub average_lifetime_ms: u64,
    pub timings: TimingSeries,
}

/// Drives a fresh pool through each scene on a simulated clock.
pub struct BenchmarkRunner {
    tick_count: u32,
}

impl BenchmarkRunner {
    pub fn new(tick_count: u32) -> Self {
        Self { tick_count }
    }

    /// Run a single benchmark scene and return timing results.
    pub fn run_scene(&self, config: &SceneConfig) -> Result<BenchmarkResult, ConfigError> {
        log::info!(
            "Running scene '{}' (cap {} chunks, {} workers)...",
            config.name,
            config.max_active_chunks,
            config.workers
        );

        let pool = ChunkPool::with_clock(
            ManualClock::new(Timestamp::ZERO),
            ChunkManagerConfig::default(),
            config.auto_config()?,
        );
        let policy = StreamingPolicy::new(config.world_radius, config.workers);

        let mut tick_times = Vec::with_capacity(self.tick_count as usize);
        let mut memory = ResourceUsagePercent::new(config.base_memory_load);
        let mut peak_active = 0u32;
        let mut rejected = 0u32;
        let mut evicted = 0u32;
        let mut throttled_ticks = 0u32;

        for tick in 0..self.tick_count {
            pool.clock().advance(TICK);
            let camera = config.camera_at(tick, self.tick_count);

            let raw_memory = config.base_memory_load
                + config.memory_per_chunk * pool.active_count() as f64;
            memory = blend_memory_pressure(memory, &SystemLoad::new(config.cpu_load, raw_memory));
            let load = SystemLoad {
                cpu: ResourceUsagePercent::new(config.cpu_load),
                memory,
            };

            let tick_start = Instant::now();
            let report = policy.update(&pool, camera, &load);
            tick_times.push(tick_start.elapsed().as_secs_f64() * 1000.0);

            peak_active = peak_active.max(pool.active_count());
            rejected += report.rejected;
            evicted += report.evicted;
            throttled_ticks += u32::from(report.throttled);
        }

        match pool.get_pool_metrics() {
            Ok(metrics) => log::info!(
                "  Final pool: {} tracked, {} active, {} inactive, pressure {:.2}",
                metrics.total_chunks(),
                metrics.active_chunks(),
                metrics.inactive_chunks(),
                metrics.memory_pressure().value()
            ),
            Err(e) => log::warn!("  Final pool metrics unavailable: {e}"),
        }

        let stats = pool.snapshot_stats();
        let timings = compute_timings(&tick_times);
        log::info!(
            "  Done: mean={:.3}ms, p95={:.3}ms, p99={:.3}ms",
            timings.mean_ms,
            timings.p95_ms,
            timings.p99_ms
        );

        Ok(BenchmarkResult {
            scene_name: config.name.to_string(),
            tick_count: self.tick_count,
            peak_active,
            total_activations: stats.total_activations,
            total_deactivations: stats.total_deactivations,
            rejected,
            evicted,
            throttled_ticks,
            cache_hit_rate: stats.cache_hit_rate.value(),
            error_rate: stats.error_rate.value(),
            average_lifetime_ms: stats.average_lifetime.millis(),
            timings,
        })
    }
}

/// Compute timing statistics from a list of tick times in milliseconds.
fn compute_timings(times: &[f64]) -> TimingSeries {
    if times.is_empty() {
        return TimingSeries {
            mean_ms: 0.0,
            median_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        };
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p95_idx = ((n as f64) * 0.95).ceil() as usize;
    let p99_idx = ((n as f64) * 0.99).ceil() as usize;

    TimingSeries {
        mean_ms: mean,
        median_ms: median,
        p95_ms: sorted[p95_idx.min(n - 1)],
        p99_ms: sorted[p99_idx.min(n - 1)],
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
    }
}
