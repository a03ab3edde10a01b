pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{AutoManagementConfig, AutoManagementSettings, ChunkManagerConfig};
pub use error::{ConfigError, LoadError, ScalarError};
pub use types::{
    ChunkCoord, ChunkDistance, ChunkId, ChunkLifetime, MaxActiveChunks, MemoryBytes,
    ResourceUsagePercent, Timestamp,
};
