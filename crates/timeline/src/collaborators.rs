//! Capability contracts the timeline consumes from the host engine.
//!
//! The core never simulates physics or owns a scene graph. It asks three
//! narrow questions of its host:
//!
//! - [`ObstructionQuery`]: "is anything in front of this point?"
//! - [`PoseSink`]: "put this actor here, now" (teleport semantics, no lag)
//! - [`ActorFactory`]: "spawn / destroy / freeze a ghost body"
//!
//! [`Stage`] bundles all three; the Bevy adapter lives in [`crate::ecs`].

use bevy::prelude::*;

use crate::pose::Pose;

/// Classification of whatever a probe ray hit.
///
/// Replaces string tags: only `Scenery` blocks a ghost's step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Player,
    Ghost,
    Scenery,
}

impl ActorKind {
    /// Whether a hit of this kind stops a ghost from stepping forward.
    pub fn blocks_ghost(self) -> bool {
        matches!(self, ActorKind::Scenery)
    }
}

/// What the factory should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefabKind {
    /// Motionless stand-in left where Act1 began.
    Statue,
    /// Actor driven by a `GhostPlayer`.
    Ghost,
}

/// Nearest hit of an obstruction probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub kind: ActorKind,
}

pub trait ObstructionQuery {
    /// Nearest hit along `direction` within `max_distance`, ignoring any
    /// collider that already contains `origin`.
    fn raycast(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<RayHit>;
}

pub trait PoseSink {
    /// Teleport `actor`. The host's transform state must reflect the new pose
    /// before the next query in the same tick.
    fn set_pose(&mut self, actor: Entity, pose: Pose);

    fn zero_velocity(&mut self, actor: Entity);
}

pub trait ActorFactory {
    fn spawn(&mut self, prefab: PrefabKind, pose: Pose) -> Entity;

    fn destroy(&mut self, actor: Entity);

    fn make_kinematic(&mut self, actor: Entity);

    /// Whether `actor` is still alive (it may have been destroyed externally).
    fn exists(&self, actor: Entity) -> bool;
}

/// Everything the state machine needs from its host in one bound.
pub trait Stage: ObstructionQuery + PoseSink + ActorFactory {}

impl<T: ObstructionQuery + PoseSink + ActorFactory> Stage for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_scenery_blocks() {
        assert!(ActorKind::Scenery.blocks_ghost());
        assert!(!ActorKind::Player.blocks_ghost());
        assert!(!ActorKind::Ghost.blocks_ghost());
    }
}
