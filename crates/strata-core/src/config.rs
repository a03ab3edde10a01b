use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ConfigError, LoadError};
use crate::types::{
    ChunkDistance, ChunkLifetime, MaxActiveChunks, MemoryBytes, ResourceUsagePercent,
};

/// Static pool parameters, fixed for the lifetime of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkManagerConfig {
    /// Estimated resident footprint of one chunk, used for memory metrics.
    pub bytes_per_chunk: MemoryBytes,
    /// Duration charged to the accumulator per successful activation.
    pub activation_cost: ChunkLifetime,
    /// Duration charged to the accumulator per successful deactivation.
    pub deactivation_cost: ChunkLifetime,
    /// Keep `Destroyed` entries in the lifecycle map for auditing.
    /// When false, `destroy` removes the entry outright.
    pub retain_destroyed: bool,
}

impl Default for ChunkManagerConfig {
    fn default() -> Self {
        Self {
            bytes_per_chunk: DEFAULT_BYTES_PER_CHUNK,
            activation_cost: DEFAULT_ACTIVATION_COST,
            deactivation_cost: DEFAULT_DEACTIVATION_COST,
            retain_destroyed: true,
        }
    }
}

/// Unvalidated auto-management fields, as read from a config file.
///
/// Scalars are already range-checked by their own types; the cross-field
/// distance ordering is checked when converting to [`AutoManagementConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoManagementSettings {
    pub enabled: bool,
    pub activation_distance: ChunkDistance,
    pub deactivation_distance: ChunkDistance,
    pub max_active_chunks: MaxActiveChunks,
    pub memory_threshold: ResourceUsagePercent,
    pub performance_threshold: ResourceUsagePercent,
}

impl Default for AutoManagementSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            deactivation_distance: DEFAULT_DEACTIVATION_DISTANCE,
            max_active_chunks: DEFAULT_MAX_ACTIVE_CHUNKS,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
            performance_threshold: DEFAULT_PERFORMANCE_THRESHOLD,
        }
    }
}

/// Live admission and streaming policy for the pool.
///
/// Only constructible through [`AutoManagementConfig::new`] or a
/// `TryFrom<AutoManagementSettings>` conversion, so the activation radius
/// never exceeds the deactivation radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "AutoManagementSettings",
    into = "AutoManagementSettings"
)]
pub struct AutoManagementConfig {
    enabled: bool,
    activation_distance: ChunkDistance,
    deactivation_distance: ChunkDistance,
    max_active_chunks: MaxActiveChunks,
    memory_threshold: ResourceUsagePercent,
    performance_threshold: ResourceUsagePercent,
}

impl AutoManagementConfig {
    pub fn new(
        enabled: bool,
        activation_distance: ChunkDistance,
        deactivation_distance: ChunkDistance,
        max_active_chunks: MaxActiveChunks,
        memory_threshold: ResourceUsagePercent,
        performance_threshold: ResourceUsagePercent,
    ) -> Result<Self, ConfigError> {
        check_distances(activation_distance, deactivation_distance)?;
        Ok(Self {
            enabled,
            activation_distance,
            deactivation_distance,
            max_active_chunks,
            memory_threshold,
            performance_threshold,
        })
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn activation_distance(&self) -> ChunkDistance {
        self.activation_distance
    }

    pub fn deactivation_distance(&self) -> ChunkDistance {
        self.deactivation_distance
    }

    pub fn max_active_chunks(&self) -> MaxActiveChunks {
        self.max_active_chunks
    }

    pub fn memory_threshold(&self) -> ResourceUsagePercent {
        self.memory_threshold
    }

    pub fn performance_threshold(&self) -> ResourceUsagePercent {
        self.performance_threshold
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_max_active_chunks(mut self, max_active_chunks: MaxActiveChunks) -> Self {
        self.max_active_chunks = max_active_chunks;
        self
    }

    pub fn with_memory_threshold(mut self, threshold: ResourceUsagePercent) -> Self {
        self.memory_threshold = threshold;
        self
    }

    pub fn with_performance_threshold(mut self, threshold: ResourceUsagePercent) -> Self {
        self.performance_threshold = threshold;
        self
    }

    pub fn with_distances(
        mut self,
        activation_distance: ChunkDistance,
        deactivation_distance: ChunkDistance,
    ) -> Result<Self, ConfigError> {
        check_distances(activation_distance, deactivation_distance)?;
        self.activation_distance = activation_distance;
        self.deactivation_distance = deactivation_distance;
        Ok(self)
    }

    /// Re-check the cross-field invariants. Always `Ok` for values built
    /// through this type's constructors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_distances(self.activation_distance, self.deactivation_distance)
    }
}

impl Default for AutoManagementConfig {
    fn default() -> Self {
        let s = AutoManagementSettings::default();
        Self {
            enabled: s.enabled,
            activation_distance: s.activation_distance,
            deactivation_distance: s.deactivation_distance,
            max_active_chunks: s.max_active_chunks,
            memory_threshold: s.memory_threshold,
            performance_threshold: s.performance_threshold,
        }
    }
}

impl TryFrom<AutoManagementSettings> for AutoManagementConfig {
    type Error = ConfigError;

    fn try_from(s: AutoManagementSettings) -> Result<Self, Self::Error> {
        Self::new(
            s.enabled,
            s.activation_distance,
            s.deactivation_distance,
            s.max_active_chunks,
            s.memory_threshold,
            s.performance_threshold,
        )
    }
}

impl From<AutoManagementConfig> for AutoManagementSettings {
    fn from(c: AutoManagementConfig) -> Self {
        Self {
            enabled: c.enabled,
            activation_distance: c.activation_distance,
            deactivation_distance: c.deactivation_distance,
            max_active_chunks: c.max_active_chunks,
            memory_threshold: c.memory_threshold,
            performance_threshold: c.performance_threshold,
        }
    }
}

fn check_distances(
    activation_distance: ChunkDistance,
    deactivation_distance: ChunkDistance,
) -> Result<(), ConfigError> {
    if activation_distance > deactivation_distance {
        return Err(ConfigError::InvalidDistance {
            activation_distance,
            deactivation_distance,
        });
    }
    Ok(())
}

/// Parse a `ChunkManagerConfig` from a RON string. Missing fields take defaults.
pub fn load_manager_config_from_str(ron_str: &str) -> Result<ChunkManagerConfig, LoadError> {
    let options = ron::Options::default();
    options
        .from_str(ron_str)
        .map_err(|e| LoadError::ParseError(e.to_string()))
}

/// Parse and validate an `AutoManagementConfig` from a RON string.
/// Missing fields take defaults.
pub fn load_auto_config_from_str(ron_str: &str) -> Result<AutoManagementConfig, LoadError> {
    let options = ron::Options::default();
    let settings: AutoManagementSettings = options
        .from_str(ron_str)
        .map_err(|e| LoadError::ParseError(e.to_string()))?;
    Ok(AutoManagementConfig::try_from(settings)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(v: f32) -> ChunkDistance {
        ChunkDistance::new(v).expect("valid distance")
    }

    #[test]
    fn test_new_rejects_inverted_distances() {
        let result = AutoManagementConfig::new(
            true,
            dist(10.0),
            dist(4.0),
            MaxActiveChunks::ONE,
            ResourceUsagePercent::new(0.8),
            ResourceUsagePercent::new(0.9),
        );
        match result {
            Err(ConfigError::InvalidDistance {
                activation_distance,
                deactivation_distance,
            }) => {
                assert_eq!(activation_distance.get(), 10.0);
                assert_eq!(deactivation_distance.get(), 4.0);
            }
            other => panic!("expected InvalidDistance, got {other:?}"),
        }
    }

    #[test]
    fn test_equal_distances_accepted() {
        let config = AutoManagementConfig::default().with_distances(dist(6.0), dist(6.0));
        assert!(config.is_ok());
    }

    #[test]
    fn test_with_distances_leaves_original_on_error() {
        let config = AutoManagementConfig::default();
        assert!(config.with_distances(dist(20.0), dist(1.0)).is_err());
        assert_eq!(config.activation_distance(), DEFAULT_ACTIVATION_DISTANCE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = AutoManagementConfig::default();
        assert!(config.enabled());
        assert_eq!(config.max_active_chunks().get(), 256);
        assert!(config.activation_distance() < config.deactivation_distance());

        let manager = ChunkManagerConfig::default();
        assert_eq!(manager.bytes_per_chunk, MemoryBytes(256 * 1024));
        assert!(manager.retain_destroyed);
    }

    #[test]
    fn test_load_auto_config_from_ron() {
        let ron_str = r#"(
            enabled: false,
            activation_distance: 4.0,
            deactivation_distance: 6.5,
            max_active_chunks: 32,
            memory_threshold: 0.7,
        )"#;
        let config = load_auto_config_from_str(ron_str).expect("parse auto config");
        assert!(!config.enabled());
        assert_eq!(config.max_active_chunks().get(), 32);
        assert_eq!(config.deactivation_distance().get(), 6.5);
        assert!((config.memory_threshold().value() - 0.7).abs() < 1e-12);
        // Unspecified fields fall back to defaults
        assert_eq!(config.performance_threshold(), DEFAULT_PERFORMANCE_THRESHOLD);
    }

    #[test]
    fn test_load_auto_config_rejects_inverted_distances() {
        let ron_str = "(activation_distance: 9.0, deactivation_distance: 3.0)";
        match load_auto_config_from_str(ron_str) {
            Err(LoadError::Invalid(ConfigError::InvalidDistance { .. })) => {}
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_load_auto_config_rejects_zero_max() {
        let result = load_auto_config_from_str("(max_active_chunks: 0)");
        assert!(matches!(result, Err(LoadError::ParseError(_))));
    }

    #[test]
    fn test_load_manager_config_from_ron() {
        let ron_str = "(bytes_per_chunk: 1024, retain_destroyed: false)";
        let config = load_manager_config_from_str(ron_str).expect("parse manager config");
        assert_eq!(config.bytes_per_chunk, MemoryBytes(1024));
        assert!(!config.retain_destroyed);
        assert_eq!(config.activation_cost, DEFAULT_ACTIVATION_COST);
    }

    #[test]
    fn test_load_manager_config_malformed() {
        let result = load_manager_config_from_str("(bytes_per_chunk: \"lots\")");
        assert!(matches!(result, Err(LoadError::ParseError(_))));
    }

    #[test]
    fn test_auto_config_ron_roundtrip_keeps_invariant() {
        let config = AutoManagementConfig::default()
            .with_max_active_chunks(MaxActiveChunks::new(12).expect("non-zero"));
        let text = ron::to_string(&config).expect("serialize");
        let back = load_auto_config_from_str(&text).expect("reparse");
        assert_eq!(back, config);
    }
}
