use bevy::prelude::*;

use crate::collaborators::{ActorKind, ObstructionQuery};
use crate::pose::Pose;

/// Pose `offset` units behind `reference` on the ground plane, facing the
/// same way.
///
/// The backward direction comes from the flattened facing (falling back to a
/// fixed world direction for near-vertical facings). A probe toward the spawn
/// point pulls it in to `margin` short of any scenery, never past the
/// reference position itself.
pub fn safe_spawn_behind<Q>(reference: Pose, offset: f32, margin: f32, query: &Q) -> Pose
where
    Q: ObstructionQuery + ?Sized,
{
    let back = -reference.flat_forward();
    let mut distance = offset.max(0.0);

    if distance > 0.0 {
        if let Ok(dir) = Dir3::new(back) {
            if let Some(hit) = query.raycast(reference.position, dir, distance) {
                if hit.kind == ActorKind::Scenery {
                    distance = (hit.distance - margin).clamp(0.0, distance);
                }
            }
        }
    }

    Pose::new(reference.position + back * distance, reference.rotation)
}
