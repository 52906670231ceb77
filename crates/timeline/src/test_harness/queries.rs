//! Input, tick and query methods for `TestLoop`.

use bevy::prelude::*;

use crate::ecs::{GhostActor, Velocity};
use crate::input::{LoopInput, LoopInputQueue};
use crate::pose::Pose;
use crate::puzzle::{Act, PuzzleMachine};
use crate::signals::{LoopJournal, LoopSignal, LoopTelemetry};
use crate::TickCounter;

use super::TestLoop;

impl TestLoop {
    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run N fixed ticks by executing the `FixedUpdate` schedule directly.
    /// Virtual time is bypassed, so a paradox freeze does not stop the
    /// schedule here; the frozen machine itself ignores the ticks.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    /// Run one regular frame (`Update` and friends).
    pub fn update(&mut self) {
        self.app.update();
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    pub fn press(&mut self, input: LoopInput) {
        self.app
            .world_mut()
            .resource_mut::<LoopInputQueue>()
            .press(input);
    }

    /// Press the trigger and run one tick.
    pub fn trigger(&mut self) {
        self.press(LoopInput::Trigger);
        self.tick(1);
    }

    /// Teleport the player by `delta` (stand-in for player locomotion).
    pub fn move_player(&mut self, delta: Vec3) {
        let player = self.player;
        if let Some(mut transform) = self.app.world_mut().get_mut::<Transform>(player) {
            transform.translation += delta;
        }
    }

    /// Move the player by `step`, then tick, `n` times.
    pub fn walk(&mut self, step: Vec3, n: u32) {
        for _ in 0..n {
            self.move_player(step);
            self.tick(1);
        }
    }

    pub fn set_player_velocity(&mut self, velocity: Vec3) {
        let player = self.player;
        if let Some(mut v) = self.app.world_mut().get_mut::<Velocity>(player) {
            v.0 = velocity;
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn player_pose(&self) -> Pose {
        self.app
            .world()
            .get::<Transform>(self.player)
            .map(Pose::from_transform)
            .unwrap_or_default()
    }

    pub fn player_velocity(&self) -> Vec3 {
        self.app
            .world()
            .get::<Velocity>(self.player)
            .map_or(Vec3::ZERO, |v| v.0)
    }

    /// The bound machine. Panics before the first tick.
    pub fn machine(&self) -> &PuzzleMachine {
        self.app.world().resource::<PuzzleMachine>()
    }

    pub fn act(&self) -> Act {
        self.app
            .world()
            .get_resource::<PuzzleMachine>()
            .map_or(Act::Idle, PuzzleMachine::act)
    }

    pub fn ticks_run(&self) -> u64 {
        self.app.world().resource::<TickCounter>().0
    }

    pub fn telemetry(&self) -> LoopTelemetry {
        self.app.world().resource::<LoopTelemetry>().clone()
    }

    /// Every signal in the journal, oldest first.
    pub fn signals(&self) -> Vec<LoopSignal> {
        self.app
            .world()
            .resource::<LoopJournal>()
            .signals()
            .cloned()
            .collect()
    }

    /// Acts entered so far, in order.
    pub fn act_history(&self) -> Vec<Act> {
        self.signals()
            .into_iter()
            .filter_map(|s| match s {
                LoopSignal::ActChanged { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }

    /// Live ghost and statue entities with their positions.
    pub fn ghosts(&mut self) -> Vec<(Entity, GhostActor, Vec3)> {
        let world = self.app.world_mut();
        let mut query = world.query::<(Entity, &GhostActor, &Transform)>();
        query
            .iter(world)
            .map(|(entity, ghost, transform)| (entity, *ghost, transform.translation))
            .collect()
    }

    pub fn ghost_count(&mut self) -> usize {
        self.ghosts().len()
    }

    pub fn is_time_paused(&self) -> bool {
        self.app.world().resource::<Time<Virtual>>().is_paused()
    }
}
