//! Shared policy defaults for the lifecycle pool and its configuration.

use crate::types::{
    ChunkDistance, ChunkLifetime, MaxActiveChunks, MemoryBytes, ResourceUsagePercent,
};

/// Estimated resident footprint of one chunk.
pub const DEFAULT_BYTES_PER_CHUNK: MemoryBytes = MemoryBytes::kib(256);

/// Bookkeeping cost charged to the accumulator per activation.
pub const DEFAULT_ACTIVATION_COST: ChunkLifetime = ChunkLifetime(16);

/// Bookkeeping cost charged to the accumulator per deactivation.
pub const DEFAULT_DEACTIVATION_COST: ChunkLifetime = ChunkLifetime(8);

/// Default cap on concurrently active chunks.
pub const DEFAULT_MAX_ACTIVE_CHUNKS: MaxActiveChunks = MaxActiveChunks::from_const(256);

/// Radius (chunk units) inside which chunks should become active.
pub const DEFAULT_ACTIVATION_DISTANCE: ChunkDistance = ChunkDistance::from_const(8.0);

/// Radius (chunk units) beyond which active chunks should be deactivated.
/// Larger than the activation radius so chunks near the edge don't flap.
pub const DEFAULT_DEACTIVATION_DISTANCE: ChunkDistance = ChunkDistance::from_const(12.0);

/// Memory usage fraction at which activations are throttled.
pub const DEFAULT_MEMORY_THRESHOLD: ResourceUsagePercent = ResourceUsagePercent::from_const(0.8);

/// CPU usage fraction considered overloaded.
pub const DEFAULT_PERFORMANCE_THRESHOLD: ResourceUsagePercent =
    ResourceUsagePercent::from_const(0.9);

/// Lowest fraction of the configured maximum that the adaptive target
/// active-chunk count may shrink to.
pub const MIN_TARGET_ACTIVE_FRACTION: f64 = 0.2;
