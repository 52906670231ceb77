//! Builder methods for placing the player and scenery before the first tick.

use bevy::prelude::*;

use crate::ecs::Collider;
use crate::pose::Pose;

use super::TestLoop;

impl TestLoop {
    /// Start the player at `pose`. Must be called before the first tick: the
    /// timeline captures the level spawn pose when it binds.
    pub fn with_player_at(mut self, pose: Pose) -> Self {
        let player = self.player;
        if let Some(mut transform) = self.app.world_mut().get_mut::<Transform>(player) {
            *transform = pose.to_transform();
        }
        self
    }

    /// Add an axis-aligned scenery box.
    pub fn with_wall(mut self, center: Vec3, half_extents: Vec3) -> Self {
        self.spawn_wall(center, half_extents);
        self
    }

    /// Add an axis-aligned scenery box mid-test (a door closing).
    pub fn spawn_wall(&mut self, center: Vec3, half_extents: Vec3) -> Entity {
        self.app
            .world_mut()
            .spawn((
                Collider::scenery(half_extents),
                Transform::from_translation(center),
            ))
            .id()
    }

    /// Remove a wall added with [`TestLoop::spawn_wall`] (a door opening).
    pub fn remove_wall(&mut self, wall: Entity) {
        self.app.world_mut().despawn(wall);
    }
}
