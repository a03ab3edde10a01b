use std::fmt;

use strata_core::types::{ChunkLifetime, ResourceUsagePercent, Timestamp};

use crate::error::{ActivationFailure, DeactivationFailure, DestructionFailure};

/// Why a chunk was scheduled for removal.
#[derive(Debug, Clone, PartialEq)]
pub enum DestructionReason {
    /// An external caller asked for the chunk to go.
    ManualEviction { requested_by: String },
    /// The chunk sat idle for too long.
    IdleTimeout { idle_for: ChunkLifetime },
    /// Memory pressure forced the eviction.
    MemoryPressure { pressure: ResourceUsagePercent },
}

/// Resource lifecycle of a single chunk.
///
/// Legal transitions:
///   Initialized -> Active
///   Inactive -> Active
///   Active -> Inactive
///   Inactive -> PendingDestruction
///   PendingDestruction -> Destroyed
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleStage {
    /// Registered but never activated.
    Initialized { created_at: Timestamp },
    /// Consuming simulation/render resources.
    Active { activated_at: Timestamp },
    /// Was active, now idle. Candidate for eviction.
    Inactive {
        deactivated_at: Timestamp,
        idle_for: ChunkLifetime,
    },
    /// Scheduled for removal.
    PendingDestruction {
        marked_at: Timestamp,
        reason: DestructionReason,
    },
    /// Terminal.
    Destroyed { destroyed_at: Timestamp },
}

/// Variant tag of a [`LifecycleStage`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Initialized,
    Active,
    Inactive,
    PendingDestruction,
    Destroyed,
}

impl LifecycleStage {
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Initialized { .. } => StageKind::Initialized,
            Self::Active { .. } => StageKind::Active,
            Self::Inactive { .. } => StageKind::Inactive,
            Self::PendingDestruction { .. } => StageKind::PendingDestruction,
            Self::Destroyed { .. } => StageKind::Destroyed,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed { .. })
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "initialized",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::PendingDestruction => "pending destruction",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}

pub fn create_initialized_stage(now: Timestamp) -> LifecycleStage {
    LifecycleStage::Initialized { created_at: now }
}

/// `Initialized | Inactive -> Active`.
pub fn activate_stage(
    stage: &LifecycleStage,
    now: Timestamp,
) -> Result<LifecycleStage, ActivationFailure> {
    match stage {
        LifecycleStage::Initialized { .. } | LifecycleStage::Inactive { .. } => {
            Ok(LifecycleStage::Active { activated_at: now })
        }
        LifecycleStage::Active { .. } => Err(ActivationFailure::AlreadyActive),
        LifecycleStage::PendingDestruction { .. } | LifecycleStage::Destroyed { .. } => {
            Err(ActivationFailure::LifecycleViolation {
                stage: stage.clone(),
            })
        }
    }
}

/// `Active -> Inactive`, with the idle clock starting at zero.
pub fn deactivate_stage(
    stage: &LifecycleStage,
    now: Timestamp,
) -> Result<LifecycleStage, DeactivationFailure> {
    match stage {
        LifecycleStage::Active { .. } => Ok(LifecycleStage::Inactive {
            deactivated_at: now,
            idle_for: ChunkLifetime::ZERO,
        }),
        LifecycleStage::Inactive { .. } => Err(DeactivationFailure::NotActive),
        _ => Err(DeactivationFailure::LifecycleViolation {
            stage: stage.clone(),
        }),
    }
}

/// `Inactive -> PendingDestruction`.
pub fn mark_pending_destruction(
    stage: &LifecycleStage,
    now: Timestamp,
    reason: DestructionReason,
) -> Result<LifecycleStage, DestructionFailure> {
    match stage {
        LifecycleStage::Inactive { .. } => Ok(LifecycleStage::PendingDestruction {
            marked_at: now,
            reason,
        }),
        _ => Err(DestructionFailure::LifecycleViolation {
            stage: stage.clone(),
        }),
    }
}

/// `PendingDestruction -> Destroyed`.
pub fn destroy_stage(
    stage: &LifecycleStage,
    now: Timestamp,
) -> Result<LifecycleStage, DestructionFailure> {
    match stage {
        LifecycleStage::PendingDestruction { .. } => {
            Ok(LifecycleStage::Destroyed { destroyed_at: now })
        }
        _ => Err(DestructionFailure::LifecycleViolation {
            stage: stage.clone(),
        }),
    }
}

/// Refresh the idle duration of an `Inactive` stage. Any other stage is
/// returned unchanged.
pub fn update_idle_duration(stage: LifecycleStage, duration: ChunkLifetime) -> LifecycleStage {
    match stage {
        LifecycleStage::Inactive { deactivated_at, .. } => LifecycleStage::Inactive {
            deactivated_at,
            idle_for: duration,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: Timestamp = Timestamp(1_000);
    const T1: Timestamp = Timestamp(2_500);

    fn inactive() -> LifecycleStage {
        LifecycleStage::Inactive {
            deactivated_at: T0,
            idle_for: ChunkLifetime::ZERO,
        }
    }

    fn pending() -> LifecycleStage {
        LifecycleStage::PendingDestruction {
            marked_at: T0,
            reason: DestructionReason::ManualEviction {
                requested_by: "test".into(),
            },
        }
    }

    #[test]
    fn test_activate_from_initialized_and_inactive() {
        let fresh = create_initialized_stage(T0);
        assert_eq!(
            activate_stage(&fresh, T1),
            Ok(LifecycleStage::Active { activated_at: T1 })
        );
        assert_eq!(
            activate_stage(&inactive(), T1),
            Ok(LifecycleStage::Active { activated_at: T1 })
        );
    }

    #[test]
    fn test_activate_rejects_active_and_terminal_stages() {
        let active = LifecycleStage::Active { activated_at: T0 };
        assert_eq!(
            activate_stage(&active, T1),
            Err(ActivationFailure::AlreadyActive)
        );

        let destroyed = LifecycleStage::Destroyed { destroyed_at: T0 };
        for stage in [pending(), destroyed] {
            match activate_stage(&stage, T1) {
                Err(ActivationFailure::LifecycleViolation { stage: reported }) => {
                    assert_eq!(reported, stage);
                }
                other => panic!("expected LifecycleViolation, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_deactivate_only_from_active() {
        let active = LifecycleStage::Active { activated_at: T0 };
        assert_eq!(
            deactivate_stage(&active, T1),
            Ok(LifecycleStage::Inactive {
                deactivated_at: T1,
                idle_for: ChunkLifetime::ZERO,
            })
        );
        assert_eq!(
            deactivate_stage(&inactive(), T1),
            Err(DeactivationFailure::NotActive)
        );
        assert!(matches!(
            deactivate_stage(&create_initialized_stage(T0), T1),
            Err(DeactivationFailure::LifecycleViolation { .. })
        ));
        assert!(matches!(
            deactivate_stage(&pending(), T1),
            Err(DeactivationFailure::LifecycleViolation { .. })
        ));
    }

    #[test]
    fn test_destruction_path() {
        let reason = DestructionReason::IdleTimeout {
            idle_for: ChunkLifetime(60_000),
        };
        let marked = mark_pending_destruction(&inactive(), T1, reason.clone())
            .expect("inactive can be marked");
        assert_eq!(
            marked,
            LifecycleStage::PendingDestruction {
                marked_at: T1,
                reason,
            }
        );

        let destroyed = destroy_stage(&marked, T1).expect("pending can be destroyed");
        assert!(destroyed.is_destroyed());
    }

    #[test]
    fn test_destruction_rejects_skipped_steps() {
        let active = LifecycleStage::Active { activated_at: T0 };
        let reason = DestructionReason::ManualEviction {
            requested_by: "editor".into(),
        };
        assert!(mark_pending_destruction(&active, T1, reason).is_err());
        assert!(destroy_stage(&inactive(), T1).is_err());
        assert!(destroy_stage(&LifecycleStage::Destroyed { destroyed_at: T0 }, T1).is_err());
    }

    #[test]
    fn test_update_idle_duration_only_touches_inactive() {
        let refreshed = update_idle_duration(inactive(), ChunkLifetime(750));
        assert_eq!(
            refreshed,
            LifecycleStage::Inactive {
                deactivated_at: T0,
                idle_for: ChunkLifetime(750),
            }
        );

        let active = LifecycleStage::Active { activated_at: T0 };
        assert_eq!(
            update_idle_duration(active.clone(), ChunkLifetime(750)),
            active
        );
    }

    #[test]
    fn test_stage_display_names() {
        assert_eq!(pending().to_string(), "pending destruction");
        assert_eq!(create_initialized_stage(T0).kind(), StageKind::Initialized);
        assert_eq!(
            ActivationFailure::LifecycleViolation {
                stage: LifecycleStage::Destroyed { destroyed_at: T0 }
            }
            .to_string(),
            "cannot activate a chunk that is destroyed"
        );
    }
}
