use bevy::prelude::*;

pub mod checkpoint;
pub mod collaborators;
pub mod debt;
pub mod ecs;
pub mod error;
pub mod ghost;
pub mod input;
pub mod params;
pub mod pose;
pub mod puzzle;
pub mod session;
pub mod signals;
pub mod trajectory;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;
#[cfg(test)]
pub mod test_support;

pub use checkpoint::TimelineCheckpoint;
pub use collaborators::{ActorFactory, ActorKind, ObstructionQuery, PoseSink, PrefabKind, RayHit, Stage};
pub use ecs::{Collider, GhostActor, Kinematic, LoopPlayer, Velocity, WorldStage};
pub use error::TimelineError;
pub use ghost::{GhostPlayer, GhostStep, GhostTuning};
pub use input::{LoopInput, LoopInputQueue, LoopKeys};
pub use params::LoopParams;
pub use pose::Pose;
pub use puzzle::{Act, ParadoxFailure, PuzzleMachine, TickInput};
pub use signals::{LoopJournal, LoopSignal, LoopTelemetry};
pub use trajectory::{Trajectory, TrajectoryRecorder};

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Fixed ticks run since startup.
#[derive(Resource, Debug, Default)]
pub struct TickCounter(pub u64);

// ---------------------------------------------------------------------------
// System ordering
// ---------------------------------------------------------------------------

/// Phases of the timeline inside `FixedUpdate`, chained in declaration order.
///
/// * **PreStep**: tick counter and host locomotion, so the machine samples
///   this tick's player pose.
/// * **Step**: the exclusive machine tick.
/// * **PostStep**: consumers of signals and telemetry.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimelineSet {
    PreStep,
    Step,
    PostStep,
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Registers the timeline resources, events and fixed-step systems.
///
/// The machine itself is created lazily on the first fixed tick that finds a
/// [`LoopPlayer`] entity.
#[derive(Default)]
pub struct TimelinePlugin {
    pub params: LoopParams,
}

impl Plugin for TimelinePlugin {
    fn build(&self, app: &mut App) {
        let params = match self.params.validate() {
            Ok(()) => self.params.clone(),
            Err(e) => {
                warn!("{e}; falling back to default loop parameters");
                LoopParams::default()
            }
        };

        app.insert_resource(Time::<Fixed>::from_seconds(f64::from(params.fixed_dt)))
            .insert_resource(params)
            .init_resource::<TickCounter>()
            .init_resource::<LoopInputQueue>()
            .init_resource::<LoopKeys>()
            .init_resource::<LoopJournal>()
            .init_resource::<LoopTelemetry>()
            .add_event::<LoopSignal>()
            .configure_sets(
                FixedUpdate,
                (TimelineSet::PreStep, TimelineSet::Step, TimelineSet::PostStep).chain(),
            )
            .add_systems(
                FixedUpdate,
                (ecs::count_ticks, ecs::apply_velocity).in_set(TimelineSet::PreStep),
            )
            .add_systems(FixedUpdate, ecs::run_timeline.in_set(TimelineSet::Step))
            .add_systems(
                Update,
                (input::capture_loop_keys, ecs::reset_frozen_timeline).chain(),
            );
    }
}
