//! In-memory [`Stage`](crate::collaborators::Stage) for unit tests.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use bevy::prelude::*;

use crate::collaborators::{ActorFactory, ActorKind, ObstructionQuery, PoseSink, PrefabKind, RayHit};
use crate::pose::Pose;

type RayRule = Box<dyn Fn(Vec3, Dir3, f32) -> Option<RayHit>>;

/// Records every collaborator call; rays answer from a fixed hit or a rule.
#[derive(Default)]
pub struct FakeStage {
    hit: Option<RayHit>,
    rule: Option<RayRule>,
    raycasts: Cell<usize>,
    poses: HashMap<Entity, Pose>,
    alive: HashMap<Entity, PrefabKind>,
    kinematic: HashSet<Entity>,
    stilled: Vec<Entity>,
    next_id: u32,
}

impl FakeStage {
    /// Every ray within range reports `kind` at `distance`.
    pub fn with_hit(mut self, kind: ActorKind, distance: f32) -> Self {
        self.hit = Some(RayHit { distance, kind });
        self
    }

    pub fn with_rule(mut self, rule: impl Fn(Vec3, Dir3, f32) -> Option<RayHit> + 'static) -> Self {
        self.rule = Some(Box::new(rule));
        self
    }

    pub fn set_hit(&mut self, hit: Option<RayHit>) {
        self.hit = hit;
    }

    pub fn raycast_count(&self) -> usize {
        self.raycasts.get()
    }

    pub fn pose_of(&self, actor: Entity) -> Option<Pose> {
        self.poses.get(&actor).copied()
    }

    pub fn live(&self, prefab: PrefabKind) -> Vec<Entity> {
        let mut found: Vec<Entity> = self
            .alive
            .iter()
            .filter(|(_, kind)| **kind == prefab)
            .map(|(entity, _)| *entity)
            .collect();
        found.sort();
        found
    }

    pub fn live_count(&self) -> usize {
        self.alive.len()
    }

    pub fn is_kinematic(&self, actor: Entity) -> bool {
        self.kinematic.contains(&actor)
    }

    pub fn was_stilled(&self, actor: Entity) -> bool {
        self.stilled.contains(&actor)
    }

    /// Destroy an actor behind the state machine's back.
    pub fn kill(&mut self, actor: Entity) {
        self.alive.remove(&actor);
        self.poses.remove(&actor);
    }
}

impl ObstructionQuery for FakeStage {
    fn raycast(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> Option<RayHit> {
        self.raycasts.set(self.raycasts.get() + 1);
        if let Some(rule) = &self.rule {
            return rule(origin, direction, max_distance);
        }
        self.hit.filter(|hit| hit.distance <= max_distance)
    }
}

impl PoseSink for FakeStage {
    fn set_pose(&mut self, actor: Entity, pose: Pose) {
        self.poses.insert(actor, pose);
    }

    fn zero_velocity(&mut self, actor: Entity) {
        self.stilled.push(actor);
    }
}

impl ActorFactory for FakeStage {
    fn spawn(&mut self, prefab: PrefabKind, pose: Pose) -> Entity {
        self.next_id += 1;
        let entity = Entity::from_raw(1000 + self.next_id);
        self.alive.insert(entity, prefab);
        self.poses.insert(entity, pose);
        entity
    }

    fn destroy(&mut self, actor: Entity) {
        self.kill(actor);
        self.kinematic.remove(&actor);
    }

    fn make_kinematic(&mut self, actor: Entity) {
        self.kinematic.insert(actor);
    }

    fn exists(&self, actor: Entity) -> bool {
        self.alive.contains_key(&actor)
    }
}
