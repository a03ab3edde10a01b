use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::ScalarError;

/// Wall-clock instant in milliseconds since the UNIX epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub fn millis(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`. Zero if `earlier` lies in the future.
    pub fn since(self, earlier: Timestamp) -> ChunkLifetime {
        ChunkLifetime(self.0.saturating_sub(earlier.0))
    }

    pub fn advanced_by(self, duration: ChunkLifetime) -> Self {
        Self(self.0.saturating_add(duration.0))
    }
}

/// Non-negative duration in milliseconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChunkLifetime(pub u64);

impl ChunkLifetime {
    pub const ZERO: Self = Self(0);

    pub fn millis(self) -> u64 {
        self.0
    }

    pub fn saturating_add(self, other: ChunkLifetime) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Mean duration over `count` samples (zero when there are none).
    pub fn average_over(self, count: u64) -> Self {
        if count == 0 {
            Self::ZERO
        } else {
            Self(self.0 / count)
        }
    }
}

/// A fraction of some resource budget, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct ResourceUsagePercent(f64);

impl ResourceUsagePercent {
    pub const ZERO: Self = Self(0.0);
    pub const FULL: Self = Self(1.0);

    /// For compile-time constants already known to lie in `[0, 1]`.
    pub(crate) const fn from_const(value: f64) -> Self {
        Self(value)
    }

    /// Clamp `value` into `[0, 1]`. NaN maps to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// `part / whole`, or zero for an empty whole.
    pub fn ratio(part: u64, whole: u64) -> Self {
        if whole == 0 {
            Self::ZERO
        } else {
            Self::new(part as f64 / whole as f64)
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// `1 - self`.
    pub fn complement(self) -> Self {
        Self::new(1.0 - self.0)
    }
}

impl From<f64> for ResourceUsagePercent {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<ResourceUsagePercent> for f64 {
    fn from(value: ResourceUsagePercent) -> Self {
        value.0
    }
}

/// Cap on concurrently active chunks. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MaxActiveChunks(u32);

impl MaxActiveChunks {
    pub const ONE: Self = Self(1);

    pub(crate) const fn from_const(value: u32) -> Self {
        assert!(value > 0, "max active chunks must be non-zero");
        Self(value)
    }

    pub fn new(value: u32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for MaxActiveChunks {
    type Error = ScalarError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ScalarError::ZeroMaxActiveChunks)
    }
}

impl From<MaxActiveChunks> for u32 {
    fn from(value: MaxActiveChunks) -> Self {
        value.0
    }
}

/// Distance in chunk-grid units. Finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct ChunkDistance(f32);

impl ChunkDistance {
    pub const ZERO: Self = Self(0.0);

    /// For compile-time constants already known to be finite and non-negative.
    pub(crate) const fn from_const(value: f32) -> Self {
        Self(value)
    }

    pub fn new(value: f32) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl TryFrom<f32> for ChunkDistance {
    type Error = ScalarError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ScalarError::InvalidDistance(value))
    }
}

impl From<ChunkDistance> for f32 {
    fn from(value: ChunkDistance) -> Self {
        value.0
    }
}

/// Byte count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MemoryBytes(pub u64);

impl MemoryBytes {
    pub const ZERO: Self = Self(0);

    pub const fn kib(n: u64) -> Self {
        Self(n * 1024)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Footprint of `count` items of this size.
    pub fn times(self, count: u32) -> Self {
        Self(self.0.saturating_mul(count as u64))
    }

    pub fn saturating_add(self, other: MemoryBytes) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

/// Chunk coordinate in chunk-space.
pub type ChunkCoord = IVec3;

/// Opaque chunk identifier, derived from the chunk's grid coordinate.
///
/// Ids are supplied by the chunk-data side; the lifecycle pool only compares
/// and hashes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(ChunkCoord);

impl ChunkId {
    pub fn from_coord(coord: ChunkCoord) -> Self {
        Self(coord)
    }

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self(IVec3::new(x, y, z))
    }

    pub fn coord(self) -> ChunkCoord {
        self.0
    }
}

impl From<ChunkCoord> for ChunkId {
    fn from(coord: ChunkCoord) -> Self {
        Self(coord)
    }
}

impl Ord for ChunkId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.to_array().cmp(&other.0.to_array())
    }
}

impl PartialOrd for ChunkId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk({},{},{})", self.0.x, self.0.y, self.0.z)
    }
}
