use glam::Vec3;
use strata_core::config::AutoManagementConfig;
use strata_core::error::ConfigError;
use strata_core::types::{ChunkDistance, MaxActiveChunks, ResourceUsagePercent};

/// Configuration for a single benchmark scene.
pub struct SceneConfig {
    pub name: &'static str,
    /// Half-extent of the square world, in chunks.
    pub world_radius: i32,
    /// Camera moves in a straight line from `path[0]` to `path[1]` (chunk units).
    pub path: [[f32; 2]; 2],
    pub max_active_chunks: u32,
    pub activation_distance: f32,
    pub deactivation_distance: f32,
    pub memory_threshold: f64,
    /// Host memory load before any chunk is counted.
    pub base_memory_load: f64,
    /// Extra memory load per active chunk.
    pub memory_per_chunk: f64,
    pub cpu_load: f64,
    /// Threads issuing activation requests concurrently.
    pub workers: usize,
}

impl SceneConfig {
    /// Camera position at `tick` of `tick_count`.
    pub fn camera_at(&self, tick: u32, tick_count: u32) -> Vec3 {
        let t = if tick_count > 1 {
            tick as f32 / (tick_count - 1) as f32
        } else {
            0.0
        };
        let [start, end] = self.path;
        Vec3::new(
            start[0] + (end[0] - start[0]) * t,
            0.0,
            start[1] + (end[1] - start[1]) * t,
        )
    }

    /// Build the scene's auto-management config. A zero cap or a negative
    /// or non-finite distance is an error, never silently replaced.
    pub fn auto_config(&self) -> Result<AutoManagementConfig, ConfigError> {
        let activation = ChunkDistance::try_from(self.activation_distance)?;
        let deactivation = ChunkDistance::try_from(self.deactivation_distance)?;
        let max_active = MaxActiveChunks::try_from(self.max_active_chunks)?;
        AutoManagementConfig::default()
            .with_max_active_chunks(max_active)
            .with_memory_threshold(ResourceUsagePercent::new(self.memory_threshold))
            .with_distances(activation, deactivation)
    }
}

/// Return the standard suite of benchmark scenes.
pub fn standard_scenes() -> Vec<SceneConfig> {
    vec![
        SceneConfig {
            name: "stroll",
            world_radius: 32,
            path: [[-20.0, 0.0], [20.0, 0.0]],
            max_active_chunks: 512,
            activation_distance: 6.0,
            deactivation_distance: 9.0,
            memory_threshold: 0.8,
            base_memory_load: 0.2,
            memory_per_chunk: 0.0005,
            cpu_load: 0.3,
            workers: 4,
        },
        SceneConfig {
            name: "sprint",
            world_radius: 48,
            path: [[-40.0, -40.0], [40.0, 40.0]],
            max_active_chunks: 256,
            activation_distance: 8.0,
            deactivation_distance: 12.0,
            memory_threshold: 0.8,
            base_memory_load: 0.2,
            memory_per_chunk: 0.001,
            cpu_load: 0.5,
            workers: 4,
        },
        SceneConfig {
            name: "tight-budget",
            world_radius: 32,
            path: [[-16.0, 0.0], [16.0, 8.0]],
            max_active_chunks: 64,
            activation_distance: 8.0,
            deactivation_distance: 10.0,
            memory_threshold: 0.9,
            base_memory_load: 0.1,
            memory_per_chunk: 0.001,
            cpu_load: 0.4,
            workers: 8,
        },
        SceneConfig {
            name: "memory-pressure",
            world_radius: 32,
            path: [[-24.0, -24.0], [24.0, 24.0]],
            max_active_chunks: 256,
            activation_distance: 7.0,
            deactivation_distance: 9.0,
            memory_threshold: 0.8,
            base_memory_load: 0.6,
            memory_per_chunk: 0.002,
            cpu_load: 0.7,
            workers: 4,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::error::ScalarError;

    #[test]
    fn test_standard_scenes_have_valid_configs() {
        for scene in standard_scenes() {
            let config = scene.auto_config().expect("scene config is valid");
            assert_eq!(config.max_active_chunks().get(), scene.max_active_chunks);
            assert!(scene.workers > 0, "{} has no workers", scene.name);
        }
    }

    #[test]
    fn test_mistyped_scene_is_rejected() {
        let mut scene = standard_scenes().remove(0);
        scene.activation_distance = -1.0;
        assert_eq!(
            scene.auto_config(),
            Err(ConfigError::Scalar(ScalarError::InvalidDistance(-1.0)))
        );

        let mut scene = standard_scenes().remove(0);
        scene.deactivation_distance = f32::NAN;
        assert!(matches!(
            scene.auto_config(),
            Err(ConfigError::Scalar(ScalarError::InvalidDistance(_)))
        ));

        let mut scene = standard_scenes().remove(0);
        scene.max_active_chunks = 0;
        assert_eq!(
            scene.auto_config(),
            Err(ConfigError::Scalar(ScalarError::ZeroMaxActiveChunks))
        );
    }

    #[test]
    fn test_camera_path_endpoints() {
        let scene = &standard_scenes()[0];
        assert_eq!(scene.camera_at(0, 10), Vec3::new(-20.0, 0.0, 0.0));
        assert_eq!(scene.camera_at(9, 10), Vec3::new(20.0, 0.0, 0.0));
        assert_eq!(scene.camera_at(0, 1), Vec3::new(-20.0, 0.0, 0.0));
    }
}
