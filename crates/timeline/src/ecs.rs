//! Bevy side of the timeline: components, the `World`-backed [`Stage`] and
//! the fixed-step driver system.

use bevy::math::bounding::{Aabb3d, RayCast3d};
use bevy::prelude::*;

use crate::collaborators::{ActorFactory, ActorKind, ObstructionQuery, PoseSink, PrefabKind, RayHit};
use crate::input::{LoopInput, LoopInputQueue};
use crate::params::LoopParams;
use crate::pose::Pose;
use crate::puzzle::{PuzzleMachine, TickInput};
use crate::signals::LoopJournal;
use crate::TickCounter;

/// Half extents of the box collider given to ghosts and statues.
pub const GHOST_HALF_EXTENTS: Vec3 = Vec3::new(0.3, 0.9, 0.3);

// =============================================================================
// Components
// =============================================================================

/// Marks the entity whose movement the timeline records.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct LoopPlayer;

/// A statue or playback ghost spawned by the timeline.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostActor {
    pub prefab: PrefabKind,
}

/// Axis-aligned box centred on the entity's translation.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub half_extents: Vec3,
    pub kind: ActorKind,
}

impl Collider {
    pub fn scenery(half_extents: Vec3) -> Self {
        Self {
            half_extents,
            kind: ActorKind::Scenery,
        }
    }
}

/// Linear velocity in units per second, integrated once per fixed tick.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct Velocity(pub Vec3);

/// Excluded from velocity integration; moved only by teleports.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Kinematic;

// =============================================================================
// WorldStage
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct ColliderEntry {
    entity: Entity,
    center: Vec3,
    half_extents: Vec3,
    kind: ActorKind,
}

impl ColliderEntry {
    fn contains(&self, point: Vec3) -> bool {
        (point - self.center).abs().cmple(self.half_extents).all()
    }
}

/// [`Stage`](crate::collaborators::Stage) backed by the ECS world.
///
/// Colliders are snapshotted on construction and kept in sync with every
/// teleport, spawn and despawn made through the stage, so probes later in
/// the same tick see the moved actors.
pub struct WorldStage<'w> {
    world: &'w mut World,
    colliders: Vec<ColliderEntry>,
}

impl<'w> WorldStage<'w> {
    pub fn new(world: &'w mut World) -> Self {
        let mut query = world.query::<(Entity, &Collider, &Transform)>();
        let colliders = query
            .iter(world)
            .map(|(entity, collider, transform)| ColliderEntry {
                entity,
                center: transform.translation,
                half_extents: collider.half_extents,
                kind: collider.kind,
            })
            .collect();
        Self { world, colliders }
    }
}

impl ObstructionQuery for WorldStage<'_> {
    fn raycast(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<RayHit> {
        let ray = RayCast3d::new(origin, direction, max_distance);
        self.colliders
            .iter()
            .filter(|entry| !entry.contains(origin))
            .filter_map(|entry| {
                let aabb = Aabb3d::new(entry.center, entry.half_extents);
                ray.aabb_intersection_at(&aabb).map(|distance| RayHit {
                    distance,
                    kind: entry.kind,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl PoseSink for WorldStage<'_> {
    fn set_pose(&mut self, actor: Entity, pose: Pose) {
        if let Some(mut transform) = self.world.get_mut::<Transform>(actor) {
            transform.translation = pose.position;
            transform.rotation = pose.rotation;
        }
        if let Some(entry) = self.colliders.iter_mut().find(|e| e.entity == actor) {
            entry.center = pose.position;
        }
    }

    fn zero_velocity(&mut self, actor: Entity) {
        if let Some(mut velocity) = self.world.get_mut::<Velocity>(actor) {
            velocity.0 = Vec3::ZERO;
        }
    }
}

impl ActorFactory for WorldStage<'_> {
    fn spawn(&mut self, prefab: PrefabKind, pose: Pose) -> Entity {
        let collider = Collider {
            half_extents: GHOST_HALF_EXTENTS,
            kind: ActorKind::Ghost,
        };
        let entity = self
            .world
            .spawn((GhostActor { prefab }, collider, pose.to_transform()))
            .id();
        self.colliders.push(ColliderEntry {
            entity,
            center: pose.position,
            half_extents: collider.half_extents,
            kind: collider.kind,
        });
        entity
    }

    fn destroy(&mut self, actor: Entity) {
        self.colliders.retain(|e| e.entity != actor);
        if !self.world.despawn(actor) {
            debug!("Ghost {actor:?} was already despawned");
        }
    }

    fn make_kinematic(&mut self, actor: Entity) {
        if self.exists(actor) {
            self.world.entity_mut(actor).insert(Kinematic);
        }
    }

    fn exists(&self, actor: Entity) -> bool {
        self.world.entities().contains(actor)
    }
}

// =============================================================================
// Systems
// =============================================================================

pub fn count_ticks(mut counter: ResMut<TickCounter>) {
    counter.0 += 1;
}

/// Move non-kinematic bodies by their velocity.
pub fn apply_velocity(
    params: Res<LoopParams>,
    mut bodies: Query<(&Velocity, &mut Transform), Without<Kinematic>>,
) {
    for (velocity, mut transform) in &mut bodies {
        transform.translation += velocity.0 * params.fixed_dt;
    }
}

/// Create the machine on the first tick a [`LoopPlayer`] exists.
fn bind_machine(world: &mut World) -> bool {
    if world.contains_resource::<PuzzleMachine>() {
        return true;
    }
    let mut players = world.query_filtered::<(Entity, &Transform), With<LoopPlayer>>();
    let Some((player, transform)) = players.iter(world).next() else {
        return false;
    };
    let pose = Pose::from_transform(transform);
    let params = world.resource::<LoopParams>().clone();
    info!("Timeline bound to player {player:?} at {}", pose.position);
    world.insert_resource(PuzzleMachine::new(params, player, pose));
    true
}

/// Run one machine tick against the world and publish its outputs.
fn drive(world: &mut World, trigger: bool, reset: bool) {
    let tick = world.resource::<TickCounter>().0;
    let (signals, telemetry, frozen) =
        world.resource_scope(|world, mut machine: Mut<PuzzleMachine>| {
            let player_pose = world
                .get::<Transform>(machine.player())
                .map(Pose::from_transform)
                .unwrap_or_else(|| machine.player_pose());
            let input = TickInput {
                player_pose,
                trigger,
                reset,
                dt: machine.params().fixed_dt,
            };
            let mut stage = WorldStage::new(world);
            machine.tick(input, &mut stage);
            (
                machine.drain_signals(),
                machine.telemetry(tick),
                machine.is_frozen(),
            )
        });

    for signal in signals {
        world.resource_mut::<LoopJournal>().push(tick, signal.clone());
        world.send_event(signal);
    }
    world.insert_resource(telemetry);

    let Some(mut time) = world.get_resource_mut::<Time<Virtual>>() else {
        return;
    };
    if frozen && !time.is_paused() {
        time.pause();
    } else if !frozen && time.is_paused() {
        time.unpause();
    }
}

/// Fixed-step driver: consumes latched input and ticks the machine once.
pub fn run_timeline(world: &mut World) {
    if !bind_machine(world) {
        return;
    }
    let (trigger, reset) = world.resource_mut::<LoopInputQueue>().take();
    drive(world, trigger, reset);
}

/// A paradox pauses virtual time, which stops `FixedUpdate`; this lets a
/// reset through from `Update` so the session can recover.
pub fn reset_frozen_timeline(world: &mut World) {
    let frozen = world
        .get_resource::<PuzzleMachine>()
        .is_some_and(PuzzleMachine::is_frozen);
    if !frozen
        || !world
            .resource::<LoopInputQueue>()
            .is_pending(LoopInput::Reset)
    {
        return;
    }
    world.resource_mut::<LoopInputQueue>().take();
    drive(world, false, true);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(boxes: &[(Vec3, Vec3, ActorKind)]) -> World {
        let mut world = World::new();
        for (center, half_extents, kind) in boxes {
            world.spawn((
                Collider {
                    half_extents: *half_extents,
                    kind: *kind,
                },
                Transform::from_translation(*center),
            ));
        }
        world
    }

    #[test]
    fn test_raycast_reports_nearest_hit() {
        let mut world = world_with(&[
            (Vec3::new(0.0, 0.0, -3.0), Vec3::splat(0.5), ActorKind::Scenery),
            (Vec3::new(0.0, 0.0, -1.5), Vec3::splat(0.5), ActorKind::Player),
        ]);
        let stage = WorldStage::new(&mut world);
        let hit = stage.raycast(Vec3::ZERO, Dir3::NEG_Z, 10.0).unwrap();
        assert_eq!(hit.kind, ActorKind::Player);
        assert!((hit.distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_respects_range() {
        let mut world = world_with(&[(Vec3::new(0.0, 0.0, -3.0), Vec3::splat(0.5), ActorKind::Scenery)]);
        let stage = WorldStage::new(&mut world);
        assert!(stage.raycast(Vec3::ZERO, Dir3::NEG_Z, 2.0).is_none());
        assert!(stage.raycast(Vec3::ZERO, Dir3::Z, 10.0).is_none());
    }

    #[test]
    fn test_raycast_ignores_box_containing_origin() {
        let mut world = world_with(&[(Vec3::ZERO, Vec3::splat(1.0), ActorKind::Scenery)]);
        let stage = WorldStage::new(&mut world);
        assert!(stage.raycast(Vec3::ZERO, Dir3::X, 5.0).is_none());
    }

    #[test]
    fn test_spawned_ghost_is_probed_and_moves_with_teleport() {
        let mut world = World::new();
        let mut stage = WorldStage::new(&mut world);
        let ghost = stage.spawn(PrefabKind::Ghost, Pose::at(Vec3::new(0.0, 0.0, -2.0)));
        stage.make_kinematic(ghost);
        let hit = stage.raycast(Vec3::ZERO, Dir3::NEG_Z, 5.0).unwrap();
        assert_eq!(hit.kind, ActorKind::Ghost);

        stage.set_pose(ghost, Pose::at(Vec3::new(0.0, 0.0, 2.0)));
        assert!(stage.raycast(Vec3::ZERO, Dir3::NEG_Z, 5.0).is_none());
        assert!(stage.exists(ghost));

        stage.destroy(ghost);
        assert!(!stage.exists(ghost));
        assert!(stage.raycast(Vec3::ZERO, Dir3::Z, 5.0).is_none());
    }

    #[test]
    fn test_teleport_writes_transform_and_stills_body() {
        let mut world = World::new();
        let body = world
            .spawn((Transform::default(), Velocity(Vec3::X)))
            .id();
        let mut stage = WorldStage::new(&mut world);
        stage.zero_velocity(body);
        stage.set_pose(body, Pose::new(Vec3::Y, Quat::from_rotation_y(1.0)));

        assert_eq!(world.get::<Velocity>(body), Some(&Velocity(Vec3::ZERO)));
        let transform = world.get::<Transform>(body).unwrap();
        assert_eq!(transform.translation, Vec3::Y);
        assert_eq!(transform.rotation, Quat::from_rotation_y(1.0));
    }
}
