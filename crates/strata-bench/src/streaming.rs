use glam::{Vec2, Vec3};
use strata_core::types::{ChunkDistance, ChunkId};
use strata_lifecycle::limits::{
    compute_target_active_chunks, should_evict_chunks, should_throttle_activations, SystemLoad,
};
use strata_lifecycle::{ChunkPool, Clock, DestructionReason};

/// What one streaming update did to the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamingReport {
    pub activated: u32,
    pub deactivated: u32,
    pub rejected: u32,
    pub evicted: u32,
    pub throttled: bool,
}

/// Activates chunks near the camera and deactivates distant ones, in the
/// square world `[-world_radius, world_radius]^2` (chunk units, y = 0).
///
/// Consults the advisory limit functions each update: throttles new
/// activations under load and, when eviction is advised, destroys the
/// longest-idle inactive chunks.
pub struct StreamingPolicy {
    world_radius: i32,
    workers: usize,
}

impl StreamingPolicy {
    pub fn new(world_radius: i32, workers: usize) -> Self {
        Self {
            world_radius,
            workers: workers.max(1),
        }
    }

    fn in_world_bounds(&self, id: ChunkId) -> bool {
        let c = id.coord();
        c.x.abs() <= self.world_radius && c.z.abs() <= self.world_radius && c.y == 0
    }

    fn distance(id: ChunkId, camera: Vec3) -> f32 {
        let c = id.coord();
        Vec2::new(c.x as f32, c.z as f32).distance(Vec2::new(camera.x, camera.z))
    }

    /// In-bounds chunks within `radius` of the camera, nearest first.
    pub fn chunks_within(&self, camera: Vec3, radius: ChunkDistance) -> Vec<ChunkId> {
        let r = radius.get().ceil() as i32;
        let cx = camera.x.round() as i32;
        let cz = camera.z.round() as i32;

        let mut found: Vec<(f32, ChunkId)> = Vec::new();
        for x in (cx - r)..=(cx + r) {
            for z in (cz - r)..=(cz + r) {
                let id = ChunkId::new(x, 0, z);
                if !self.in_world_bounds(id) {
                    continue;
                }
                let d = Self::distance(id, camera);
                if d <= radius.get() {
                    found.push((d, id));
                }
            }
        }
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// Run one streaming pass against `pool` for the given camera and load.
    pub fn update<C: Clock>(
        &self,
        pool: &ChunkPool<C>,
        camera: Vec3,
        load: &SystemLoad,
    ) -> StreamingReport {
        let config = pool.auto_config();
        let mut report = StreamingReport::default();

        for id in pool.get_active_chunks() {
            if Self::distance(id, camera) > config.deactivation_distance().get()
                && pool.deactivate(id).is_ok()
            {
                report.deactivated += 1;
            }
        }

        let active = pool.active_count();
        let target = compute_target_active_chunks(&config, load).get();

        if should_evict_chunks(&config, load, active) {
            let keep = target.saturating_sub(active) as usize;
            report.evicted = self.evict_idle(pool, keep, load);
        }

        if should_throttle_activations(&config, load, active) {
            report.throttled = true;
            return report;
        }

        let budget = target.saturating_sub(active) as usize;
        let wanted: Vec<ChunkId> = self
            .chunks_within(camera, config.activation_distance())
            .into_iter()
            .filter(|id| pool.stage(*id).is_none_or(|s| !s.is_active()))
            .take(budget)
            .collect();

        let (activated, rejected) = self.activate_parallel(pool, &wanted);
        report.activated = activated;
        report.rejected = rejected;
        report
    }

    /// Destroy longest-idle inactive chunks until at most `keep` remain, so
    /// that resident chunks fit inside the adaptive target.
    fn evict_idle<C: Clock>(&self, pool: &ChunkPool<C>, keep: usize, load: &SystemLoad) -> u32 {
        pool.refresh_idle();
        let idle = pool.inactive_chunks();
        let excess = idle.len().saturating_sub(keep);

        let mut evicted = 0;
        for (id, _) in idle.into_iter().take(excess) {
            let reason = DestructionReason::MemoryPressure {
                pressure: load.memory,
            };
            if pool.mark_for_destruction(id, reason).is_ok() && pool.destroy(id).is_ok() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            log::debug!("Evicted {evicted} idle chunks under memory pressure");
            pool.purge_destroyed();
        }
        evicted
    }

    /// Spread activation requests over worker threads. Returns
    /// `(admitted, rejected)`.
    fn activate_parallel<C: Clock>(&self, pool: &ChunkPool<C>, ids: &[ChunkId]) -> (u32, u32) {
        if ids.is_empty() {
            return (0, 0);
        }
        let per_worker = ids.len().div_ceil(self.workers);

        std::thread::scope(|s| {
            let handles: Vec<_> = ids
                .chunks(per_worker)
                .map(|batch| {
                    s.spawn(move || {
                        let mut admitted = 0u32;
                        let mut rejected = 0u32;
                        for &id in batch {
                            match pool.activate(id) {
                                Ok(()) => admitted += 1,
                                Err(_) => rejected += 1,
                            }
                        }
                        (admitted, rejected)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .fold((0, 0), |acc, (a, r)| (acc.0 + a, acc.1 + r))
        })
    }
}
